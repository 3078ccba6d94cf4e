use hive_core::{
    ContributionLedgerEntry, HiveError, NodePubkey, Timestamp, RECIPROCITY_DECAY_PERMILLE,
    RECIPROCITY_DECAY_WINDOW_SECS,
};
use hive_state::HiveStateDb;

fn load_or_new(
    db: &HiveStateDb,
    self_pubkey: &NodePubkey,
    peer_pubkey: &NodePubkey,
    now: Timestamp,
) -> Result<ContributionLedgerEntry, HiveError> {
    Ok(db.get_contribution(self_pubkey, peer_pubkey)?.unwrap_or(ContributionLedgerEntry {
        self_pubkey: *self_pubkey,
        peer_pubkey: *peer_pubkey,
        sats_forwarded_to_peer_lifetime: 0,
        sats_received_from_peer_lifetime: 0,
        tasks_requested_lifetime: 0,
        tasks_fulfilled_lifetime: 0,
        reciprocity_balance: 0.0,
        last_updated_ts: now,
    }))
}

/// Applies the debt-decay rule to a loaded entry: a reciprocity balance that
/// has gone untouched for `RECIPROCITY_DECAY_WINDOW_SECS` loses
/// `RECIPROCITY_DECAY_PERMILLE` per mille for every whole window elapsed,
/// compounding. Only ever shrinks the magnitude of the balance toward zero —
/// never flips its sign.
pub fn apply_decay(entry: &mut ContributionLedgerEntry, now: Timestamp) {
    let elapsed = now - entry.last_updated_ts;
    if elapsed < RECIPROCITY_DECAY_WINDOW_SECS {
        return;
    }
    let windows = elapsed / RECIPROCITY_DECAY_WINDOW_SECS;
    let retain_fraction = 1.0 - (RECIPROCITY_DECAY_PERMILLE as f64 / 1000.0);
    for _ in 0..windows {
        entry.reciprocity_balance *= retain_fraction;
    }
    entry.last_updated_ts += windows * RECIPROCITY_DECAY_WINDOW_SECS;
}

/// Records `sats` forwarded by `self_pubkey` to `peer_pubkey` (an
/// `HtlcForwarded` host event where this node is the inbound hop). Decay is
/// applied before the new contribution lands, so stale debt never silently
/// persists past its window.
pub fn record_forward(
    db: &HiveStateDb,
    self_pubkey: &NodePubkey,
    peer_pubkey: &NodePubkey,
    sats: u64,
    now: Timestamp,
) -> Result<ContributionLedgerEntry, HiveError> {
    let mut entry = load_or_new(db, self_pubkey, peer_pubkey, now)?;
    apply_decay(&mut entry, now);
    entry.sats_forwarded_to_peer_lifetime += sats;
    entry.reciprocity_balance += sats as f64;
    entry.last_updated_ts = now;
    db.put_contribution(&entry)?;
    Ok(entry)
}

/// Records `sats` received by `self_pubkey` from `peer_pubkey`.
pub fn record_received(
    db: &HiveStateDb,
    self_pubkey: &NodePubkey,
    peer_pubkey: &NodePubkey,
    sats: u64,
    now: Timestamp,
) -> Result<ContributionLedgerEntry, HiveError> {
    let mut entry = load_or_new(db, self_pubkey, peer_pubkey, now)?;
    apply_decay(&mut entry, now);
    entry.sats_received_from_peer_lifetime += sats;
    entry.reciprocity_balance -= sats as f64;
    entry.last_updated_ts = now;
    db.put_contribution(&entry)?;
    Ok(entry)
}

/// Aggregate forwarded/received ratio across every tracked peer, the figure
/// `promotion::evaluate_for_vouch` compares against
/// `PROMOTION_MIN_CONTRIBUTION_RATIO`. `1.0` with nothing tracked yet (no
/// ratio to compute) rather than a division by zero.
pub fn aggregate_ratio(db: &HiveStateDb, self_pubkey: &NodePubkey) -> Result<f64, HiveError> {
    let entries = db.iter_contributions_for_self(self_pubkey)?;
    let forwarded: u64 = entries.iter().map(|e| e.sats_forwarded_to_peer_lifetime).sum();
    let received: u64 = entries.iter().map(|e| e.sats_received_from_peer_lifetime).sum();
    if received == 0 {
        return Ok(if forwarded > 0 { f64::INFINITY } else { 1.0 });
    }
    Ok(forwarded as f64 / received as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> HiveStateDb {
        let dir = std::env::temp_dir()
            .join(format!("hive_contribution_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        HiveStateDb::open(&dir).unwrap()
    }

    #[test]
    fn forward_then_receive_nets_reciprocity_balance() {
        let db = temp_db("net");
        let a = NodePubkey([1u8; 33]);
        let b = NodePubkey([2u8; 33]);
        record_forward(&db, &a, &b, 1_000, 0).unwrap();
        let entry = record_received(&db, &a, &b, 400, 10).unwrap();
        assert_eq!(entry.reciprocity_balance, 600.0);
    }

    #[test]
    fn balance_decays_by_half_after_one_full_window() {
        let mut entry = ContributionLedgerEntry {
            self_pubkey: NodePubkey([1u8; 33]),
            peer_pubkey: NodePubkey([2u8; 33]),
            sats_forwarded_to_peer_lifetime: 1_000,
            sats_received_from_peer_lifetime: 0,
            tasks_requested_lifetime: 0,
            tasks_fulfilled_lifetime: 0,
            reciprocity_balance: 1_000.0,
            last_updated_ts: 0,
        };
        apply_decay(&mut entry, RECIPROCITY_DECAY_WINDOW_SECS);
        assert!((entry.reciprocity_balance - 500.0).abs() < 1e-9);
    }

    #[test]
    fn decay_is_a_no_op_inside_one_window() {
        let mut entry = ContributionLedgerEntry {
            self_pubkey: NodePubkey([1u8; 33]),
            peer_pubkey: NodePubkey([2u8; 33]),
            sats_forwarded_to_peer_lifetime: 1_000,
            sats_received_from_peer_lifetime: 0,
            tasks_requested_lifetime: 0,
            tasks_fulfilled_lifetime: 0,
            reciprocity_balance: 1_000.0,
            last_updated_ts: 0,
        };
        apply_decay(&mut entry, RECIPROCITY_DECAY_WINDOW_SECS - 1);
        assert_eq!(entry.reciprocity_balance, 1_000.0);
    }
}
