use hive_core::PeerStateEntry;
use hive_state::FleetStateMap;
use tracing::warn;

/// Picks the surviving entry between a locally-held and a remotely-received
/// row for the same pubkey, per the merge rule in spec §4.7: higher
/// `version` wins; on a tie, lower `updated_ts` wins; on a further tie, the
/// entry with the lexicographically smaller signature bytes wins.
pub fn merge_winner(local: &PeerStateEntry, remote: &PeerStateEntry) -> PeerStateEntry {
    if remote.version != local.version {
        return if remote.version > local.version {
            remote.clone()
        } else {
            local.clone()
        };
    }
    if remote.updated_ts != local.updated_ts {
        return if remote.updated_ts < local.updated_ts {
            remote.clone()
        } else {
            local.clone()
        };
    }
    if remote.signature.lexicographically_smaller(&local.signature) {
        remote.clone()
    } else {
        local.clone()
    }
}

/// Applies a batch of remote entries received during full-sync against the
/// local fleet map, merging row-by-row. Returns the number of rows whose
/// stored value actually changed.
pub fn apply_full_sync(map: &FleetStateMap, remote_entries: Vec<PeerStateEntry>) -> usize {
    let mut changed = 0;
    for remote in remote_entries {
        match map.get(&remote.pubkey) {
            Some(local) => {
                let winner = merge_winner(&local, &remote);
                if winner.version != local.version
                    || winner.updated_ts != local.updated_ts
                    || winner.signature != local.signature
                {
                    map.set_entry(winner);
                    changed += 1;
                }
            }
            None => {
                map.set_entry(remote);
                changed += 1;
            }
        }
    }
    changed
}

/// After a full-sync merge both sides should converge; a lingering mismatch
/// indicates a protocol bug, not something to retry (spec §4.7 step 3).
pub fn log_if_still_diverged(local_hash: [u8; 32], peer_hash: [u8; 32], peer_label: &str) {
    if local_hash != peer_hash {
        warn!(
            peer = peer_label,
            local_hash = %hex::encode(local_hash),
            peer_hash = %hex::encode(peer_hash),
            "state hash still diverges after full-sync merge"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::{CapacityTier, HiveSignature, NodePubkey, PeerFlags};

    fn entry(version: u64, updated_ts: i64, sig_byte: u8) -> PeerStateEntry {
        PeerStateEntry {
            pubkey: NodePubkey([1u8; 33]),
            version,
            updated_ts,
            capacity_tier: CapacityTier::Small,
            fee_policy_fingerprint: vec![],
            flags: PeerFlags::default(),
            signature: HiveSignature([sig_byte; 64]),
        }
    }

    #[test]
    fn higher_version_wins_outright() {
        let local = entry(1, 100, 5);
        let remote = entry(2, 50, 9);
        assert_eq!(merge_winner(&local, &remote).version, 2);
    }

    #[test]
    fn tie_on_version_prefers_lower_updated_ts() {
        let local = entry(3, 200, 5);
        let remote = entry(3, 100, 9);
        assert_eq!(merge_winner(&local, &remote).updated_ts, 100);
    }

    #[test]
    fn tie_on_version_and_ts_prefers_smaller_signature() {
        let local = entry(3, 100, 9);
        let remote = entry(3, 100, 2);
        assert_eq!(merge_winner(&local, &remote).signature, HiveSignature([2u8; 64]));
    }
}
