use serde::{Deserialize, Serialize};

/// Governance mode (spec §4.9). Fixed at startup by operator config; never
/// switched mid-flight by the node itself.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GovernanceMode {
    /// All actions require explicit operator approval via RPC.
    Advisor,
    /// Actions within configured `SafetyBounds` auto-approve.
    Autonomous,
    /// Actions are decided by an external `OracleClient`.
    Oracle,
}

/// Operator-configured safety bounds for Autonomous mode. The implementation
/// MUST honor these and never self-adjust them (spec §4.9).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SafetyBounds {
    pub max_channel_opens_per_day: u32,
    pub max_sats_per_rebalance: u64,
    pub max_fee_change_permille: u32,
}

impl Default for SafetyBounds {
    fn default() -> Self {
        Self {
            max_channel_opens_per_day: 1,
            max_sats_per_rebalance: 1_000_000,
            max_fee_change_permille: 50,
        }
    }
}
