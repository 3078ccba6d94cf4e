use hive_core::MARKET_SHARE_GUARD_PERCENT;

/// Market-share guard (spec §4.5): advisory only. Planners consult this
/// before proposing expansion against an external peer; the ledger never
/// enforces it directly.
pub fn market_share_guard_blocks(hive_share_of_peer_capacity_percent: u64) -> bool {
    hive_share_of_peer_capacity_percent > MARKET_SHARE_GUARD_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_above_threshold_only() {
        assert!(!market_share_guard_blocks(20));
        assert!(market_share_guard_blocks(21));
    }
}
