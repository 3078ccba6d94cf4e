use hive_core::{PeerFlags, CAPACITY_BAND_PERCENT};

/// Buckets `capacity_percent_of_peak` into a 10%-wide band index (spec
/// §4.7). Two readings in the same band never trigger a re-broadcast.
pub fn capacity_band(capacity_percent_of_peak: u64) -> u64 {
    capacity_percent_of_peak / CAPACITY_BAND_PERCENT
}

/// A local observer's comparable view of its last-broadcast state, used to
/// decide whether the next local update crosses a threshold-gossip trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GossipTriggerState {
    pub capacity_band: u64,
    pub fee_policy_fingerprint_hash: u64,
    pub flags: PeerFlags,
}

/// `true` if any of the three threshold conditions in spec §4.7 changed
/// relative to the last broadcast state.
pub fn should_emit(previous: &GossipTriggerState, current: &GossipTriggerState) -> bool {
    previous.capacity_band != current.capacity_band
        || previous.fee_policy_fingerprint_hash != current.fee_policy_fingerprint_hash
        || previous.flags != current.flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(band: u64, fp: u64, flags: PeerFlags) -> GossipTriggerState {
        GossipTriggerState {
            capacity_band: band,
            fee_policy_fingerprint_hash: fp,
            flags,
        }
    }

    #[test]
    fn identical_state_does_not_trigger() {
        let flags = PeerFlags::default();
        let s = state(3, 42, flags);
        assert!(!should_emit(&s, &s));
    }

    #[test]
    fn capacity_band_crossing_triggers() {
        let flags = PeerFlags::default();
        assert!(should_emit(&state(3, 42, flags), &state(4, 42, flags)));
    }

    #[test]
    fn flag_toggle_triggers() {
        let mut toggled = PeerFlags::default();
        toggled.banned = true;
        assert!(should_emit(
            &state(3, 42, PeerFlags::default()),
            &state(3, 42, toggled)
        ));
    }
}
