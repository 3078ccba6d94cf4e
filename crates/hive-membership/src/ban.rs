use hive_core::{BanRecord, HiveError, NodePubkey, Tier, Timestamp};
use hive_state::HiveStateDb;

use crate::promotion::quorum_required;

/// Proposes a ban against `target`, opening a `BanRecord` with the proposer
/// as its first vote (spec §4.5 "same threshold rule" as promotion).
pub fn propose_ban(
    db: &HiveStateDb,
    target_pubkey: NodePubkey,
    reason_code: String,
    evidence_digest: [u8; 32],
    proposer_pubkey: NodePubkey,
) -> Result<BanRecord, HiveError> {
    if db.get_ban(&target_pubkey)?.is_some() {
        return Err(HiveError::ConsensusError("ban already proposed for target".into()));
    }
    let record = BanRecord {
        target_pubkey,
        reason_code,
        evidence_digest,
        proposer_pubkey,
        votes: vec![proposer_pubkey],
        effective_ts: None,
    };
    db.put_ban(&record)?;
    Ok(record)
}

/// Adds `voter`'s vote to an in-flight ban proposal and finalizes it once
/// quorum is reached, marking the member record banned and flagging
/// `effective_ts`. Returns `true` if this vote finalized the ban.
pub fn vote_ban(
    db: &HiveStateDb,
    target_pubkey: &NodePubkey,
    voter_pubkey: NodePubkey,
    now: Timestamp,
) -> Result<bool, HiveError> {
    let voter = db
        .get_member(&voter_pubkey)?
        .ok_or_else(|| HiveError::VouchFromNonMember {
            voucher: voter_pubkey.to_hex(),
        })?;
    if voter.banned || voter.tier == Tier::Neophyte {
        return Err(HiveError::VouchFromNonMember {
            voucher: voter_pubkey.to_hex(),
        });
    }

    let mut record = db
        .get_ban(target_pubkey)?
        .ok_or_else(|| HiveError::NotFound(format!("no ban proposal for {target_pubkey}")))?;

    if record.effective_ts.is_some() {
        return Ok(true);
    }
    if !record.votes.contains(&voter_pubkey) {
        record.votes.push(voter_pubkey);
    }

    let member_count = db.member_count() as usize;
    let needed = quorum_required(member_count);
    let finalized = record.votes.len() >= needed;
    if finalized {
        record.effective_ts = Some(now);
        if let Some(mut target_member) = db.get_member(target_pubkey)? {
            target_member.banned = true;
            target_member.ban_reason = Some(record.reason_code.clone());
            db.put_member(&target_member)?;
        }
    }
    db.put_ban(&record)?;
    Ok(finalized)
}
