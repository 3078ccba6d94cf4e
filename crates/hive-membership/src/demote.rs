use hive_core::{HiveError, MemberRecord, NodePubkey, Tier, Timestamp};
use hive_state::HiveStateDb;
use tracing::info;

/// Explicit demotion, outside the promotion/ban consensus machinery. Tier
/// monotonicity (spec §3 invariant b) allows demotion but spec.md never
/// gives it a wire operation of its own, so it is admin-only and locally
/// audited the same way a promotion decision is logged.
pub fn demote(
    db: &HiveStateDb,
    admin_pubkey: &NodePubkey,
    target_pubkey: &NodePubkey,
    new_tier: Tier,
    reason: &str,
    now: Timestamp,
) -> Result<MemberRecord, HiveError> {
    let admin = db
        .get_member(admin_pubkey)?
        .ok_or_else(|| HiveError::PermissionDenied("caller is not a known member".into()))?;
    if admin.tier != Tier::Admin {
        return Err(HiveError::PermissionDenied(
            "demotion requires Admin tier".into(),
        ));
    }

    let mut target = db
        .get_member(target_pubkey)?
        .ok_or_else(|| HiveError::NotFound(format!("no member record for {target_pubkey}")))?;

    if new_tier >= target.tier {
        return Err(HiveError::ConsensusError(
            "demote requires a strictly lower tier".into(),
        ));
    }

    info!(
        admin = %admin_pubkey,
        target = %target_pubkey,
        from = %target.tier,
        to = %new_tier,
        reason,
        now,
        "member demoted"
    );

    target.tier = new_tier;
    if new_tier == Tier::Neophyte {
        target.probation_ends_ts = Some(now);
    }
    db.put_member(&target)?;
    Ok(target)
}
