use hive_core::{HiveError, InvitationTicket, MemberRecord, NodePubkey, Tier, Timestamp, DUNBAR_CAP};
use hive_crypto::Identity;
use hive_state::HiveStateDb;
use rand::RngCore;

/// Issues a fresh, signed invitation ticket (spec §4.5).
pub fn issue_ticket(
    issuer: &Identity,
    validity_secs: i64,
    requirement_bitmask: u32,
    now: Timestamp,
) -> InvitationTicket {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let issuer_pubkey = issuer.pubkey();
    let mut ticket = InvitationTicket {
        issuer_pubkey,
        nonce,
        issued_ts: now,
        expires_ts: now + validity_secs,
        requirement_bitmask,
        issuer_signature: hive_core::HiveSignature([0u8; 64]),
    };
    let signing_bytes = signing_bytes(&ticket);
    ticket.issuer_signature = issuer.sign(&signing_bytes);
    ticket
}

pub fn signing_bytes(ticket: &InvitationTicket) -> Vec<u8> {
    let value = serde_json::json!({
        "issuer_pubkey": ticket.issuer_pubkey.to_hex(),
        "nonce": hex::encode(ticket.nonce),
        "issued_ts": ticket.issued_ts,
        "expires_ts": ticket.expires_ts,
        "requirement_bitmask": ticket.requirement_bitmask,
    });
    hive_codec::to_canonical_bytes(&value)
}

/// Completes a join once the handshake (`hive-session`) has accepted the
/// ticket: atomically consumes the nonce and writes a fresh Neophyte row
/// with `probation_ends_ts = joined_ts + probation_window` (spec §4.5).
///
/// The ledger enforces `|Members| <= 50` itself: once the roster is at the
/// Dunbar cap, further joins are rejected outright rather than landing as
/// uncounted Neophytes, and `finalize_promotion` applies the same check.
pub fn join(
    db: &HiveStateDb,
    ticket: &InvitationTicket,
    joining_pubkey: NodePubkey,
    now: Timestamp,
    probation_window_secs: i64,
) -> Result<MemberRecord, HiveError> {
    if db.is_nonce_consumed(&ticket.nonce)? {
        return Err(HiveError::InvalidTicket("ticket nonce already consumed".into()));
    }
    if db.get_member(&joining_pubkey)?.is_some() {
        return Err(HiveError::InvalidTicket("pubkey is already a member".into()));
    }
    if dunbar_cap_reached(db.member_count()) {
        return Err(HiveError::ConsensusError(
            "hive already at the Dunbar cap; no further joins accepted".into(),
        ));
    }

    let member = MemberRecord {
        pubkey: joining_pubkey,
        tier: Tier::Neophyte,
        joined_ts: now,
        probation_ends_ts: Some(now + probation_window_secs),
        contribution_ratio: 0.0,
        uptime_fraction: 0.0,
        last_seen_ts: now,
        banned: false,
        ban_reason: None,
    };

    db.mark_nonce_consumed(&ticket.nonce)?;
    db.put_member(&member)?;
    Ok(member)
}

/// Dunbar cap check (spec §4.5): `|Members| ≤ 50`. Callers consult this
/// before accepting new tickets for issuance; existing joins are never
/// evicted for exceeding it.
pub fn dunbar_cap_reached(member_count: u64) -> bool {
    member_count >= DUNBAR_CAP as u64
}
