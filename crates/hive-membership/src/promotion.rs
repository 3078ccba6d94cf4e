use hive_core::{
    HiveError, MemberRecord, NodePubkey, Tier, Timestamp, Vouch, PROMOTION_MIN_CONTRIBUTION_RATIO,
    PROMOTION_MIN_UPTIME_PERMILLE, PROMOTION_QUORUM_FRACTION_PERCENT, PROMOTION_QUORUM_MIN,
};
use hive_crypto::verify;
use hive_state::HiveStateDb;

use crate::invitation::dunbar_cap_reached;

/// `max(3, ⌈0.51·|Members|⌉)` — the resolved quorum rule shared by promotion
/// and ban consensus (spec §9 resolves the ambiguous "51%" source reading).
pub fn quorum_required(member_count: usize) -> usize {
    let fraction_quorum =
        (member_count * PROMOTION_QUORUM_FRACTION_PERCENT as usize).div_ceil(100);
    PROMOTION_QUORUM_MIN.max(fraction_quorum)
}

/// Local audit a Member/Admin runs before issuing a `HIVE_VOUCH` (spec
/// §4.5 promotion criteria 1-3). A failing uniqueness check is a hard
/// reject, never a defer.
pub fn evaluate_for_vouch(
    candidate: &MemberRecord,
    toxic_incident_count: u32,
    brings_new_peer: bool,
) -> Result<(), HiveError> {
    let uptime_permille = (candidate.uptime_fraction * 1000.0).round() as u32;
    if uptime_permille < PROMOTION_MIN_UPTIME_PERMILLE || toxic_incident_count > 0 {
        return Err(HiveError::PromotionBelowThreshold {
            have: uptime_permille as usize,
            need: PROMOTION_MIN_UPTIME_PERMILLE as usize,
        });
    }
    if candidate.contribution_ratio <= PROMOTION_MIN_CONTRIBUTION_RATIO {
        return Err(HiveError::ConsensusError(
            "contribution ratio does not exceed 1.0".into(),
        ));
    }
    if !brings_new_peer {
        return Err(HiveError::ConsensusError(
            "candidate fails topological uniqueness check".into(),
        ));
    }
    Ok(())
}

/// Records one voucher's signed vouch for `target`, after checking the
/// voucher is an existing, non-banned Member or Admin.
pub fn record_vouch(db: &HiveStateDb, vouch: Vouch) -> Result<(), HiveError> {
    let voucher = db
        .get_member(&vouch.voucher_pubkey)?
        .ok_or_else(|| HiveError::VouchFromNonMember {
            voucher: vouch.voucher_pubkey.to_hex(),
        })?;
    if voucher.banned || voucher.tier == Tier::Neophyte {
        return Err(HiveError::VouchFromNonMember {
            voucher: vouch.voucher_pubkey.to_hex(),
        });
    }
    let signing_bytes = vouch_signing_bytes(&vouch);
    if !verify(&vouch.voucher_pubkey, &signing_bytes, &vouch.voucher_sig) {
        return Err(HiveError::InvalidSignature);
    }
    db.put_vouch(&vouch)?;
    Ok(())
}

pub fn vouch_signing_bytes(vouch: &Vouch) -> Vec<u8> {
    let value = serde_json::json!({
        "target_pubkey": vouch.target_pubkey.to_hex(),
        "voucher_pubkey": vouch.voucher_pubkey.to_hex(),
        "issued_ts": vouch.issued_ts,
    });
    hive_codec::to_canonical_bytes(&value)
}

/// Finalizes a promotion once quorum accumulates (spec §4.5): verifies every
/// vouch's signature and voucher eligibility, confirms the unique-voucher
/// count reaches `quorum_required`, then atomically flips `tier = Member`
/// and clears probation.
pub fn finalize_promotion(
    db: &HiveStateDb,
    target_pubkey: &NodePubkey,
    now: Timestamp,
) -> Result<MemberRecord, HiveError> {
    let mut target = db
        .get_member(target_pubkey)?
        .ok_or_else(|| HiveError::NotFound(format!("no member record for {target_pubkey}")))?;

    if target.tier != Tier::Neophyte {
        return Err(HiveError::ConsensusError(
            "target is not a Neophyte awaiting promotion".into(),
        ));
    }
    if dunbar_cap_reached(db.member_count()) {
        return Err(HiveError::ConsensusError(
            "hive already at the Dunbar cap; no further promotions accepted".into(),
        ));
    }

    let vouches = db.iter_vouches_for_target(target_pubkey)?;
    let mut unique_vouchers: Vec<NodePubkey> = Vec::new();
    for vouch in &vouches {
        let voucher = db.get_member(&vouch.voucher_pubkey)?;
        let Some(voucher) = voucher else { continue };
        if voucher.banned || voucher.tier == Tier::Neophyte {
            continue;
        }
        let signing_bytes = vouch_signing_bytes(vouch);
        if !verify(&vouch.voucher_pubkey, &signing_bytes, &vouch.voucher_sig) {
            continue;
        }
        if !unique_vouchers.contains(&vouch.voucher_pubkey) {
            unique_vouchers.push(vouch.voucher_pubkey);
        }
    }

    let member_count = db.member_count() as usize;
    let needed = quorum_required(member_count);
    if unique_vouchers.len() < needed {
        return Err(HiveError::PromotionBelowThreshold {
            have: unique_vouchers.len(),
            need: needed,
        });
    }

    target.tier = Tier::Member;
    target.probation_ends_ts = None;
    target.last_seen_ts = now;
    db.put_member(&target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_uses_absolute_floor_for_small_fleets() {
        assert_eq!(quorum_required(1), 3);
        assert_eq!(quorum_required(4), 3);
    }

    #[test]
    fn quorum_scales_with_fleet_size() {
        // ceil(0.51 * 10) = 6
        assert_eq!(quorum_required(10), 6);
        // ceil(0.51 * 50) = 26
        assert_eq!(quorum_required(50), 26);
    }
}
