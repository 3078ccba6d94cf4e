use hive_core::{ActionType, HiveError, PendingAction, Timestamp};

use crate::mode::SafetyBounds;

/// Rolling per-day usage counters consulted by the Autonomous-mode bounds
/// check. One instance per node; reset by the caller at UTC-day boundaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutonomousUsage {
    pub channel_opens_today: u32,
}

/// Checks `action` against `bounds`. A violation is a hard reject with
/// reason `bounds_exceeded`, never a silent clamp (spec §4.9).
pub fn check_bounds(
    action: &PendingAction,
    bounds: &SafetyBounds,
    usage: &AutonomousUsage,
) -> Result<(), HiveError> {
    match action.action_type {
        ActionType::ChannelOpen | ActionType::AcceptPromotion => {
            if usage.channel_opens_today >= bounds.max_channel_opens_per_day {
                return Err(HiveError::BoundsExceeded {
                    reason: "bounds_exceeded: daily channel-open cap reached".into(),
                });
            }
        }
        ActionType::Rebalance => {
            let sats = action
                .payload
                .get("sats")
                .and_then(|v| v.as_u64())
                .unwrap_or(u64::MAX);
            if sats > bounds.max_sats_per_rebalance {
                return Err(HiveError::BoundsExceeded {
                    reason: "bounds_exceeded: rebalance amount exceeds cap".into(),
                });
            }
        }
        ActionType::FeeChange => {
            let change_permille = action
                .payload
                .get("fee_change_permille")
                .and_then(|v| v.as_u64())
                .unwrap_or(u64::MAX);
            if change_permille > bounds.max_fee_change_permille as u64 {
                return Err(HiveError::BoundsExceeded {
                    reason: "bounds_exceeded: fee change exceeds cap".into(),
                });
            }
        }
        ActionType::ChannelClose => {}
    }
    Ok(())
}

pub fn day_bucket(ts: Timestamp) -> i64 {
    ts.div_euclid(24 * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::ActionState;

    fn rebalance_action(sats: u64) -> PendingAction {
        PendingAction {
            action_id: "a1".into(),
            action_type: ActionType::Rebalance,
            payload: serde_json::json!({ "sats": sats }),
            proposed_ts: 0,
            expires_ts: 100,
            state: ActionState::AwaitingDecision,
            decision_source: None,
            decision_reason: None,
        }
    }

    #[test]
    fn within_bounds_passes() {
        let bounds = SafetyBounds::default();
        let action = rebalance_action(500_000);
        assert!(check_bounds(&action, &bounds, &AutonomousUsage::default()).is_ok());
    }

    #[test]
    fn exceeding_bounds_is_hard_rejected() {
        let bounds = SafetyBounds::default();
        let action = rebalance_action(2_000_000);
        let err = check_bounds(&action, &bounds, &AutonomousUsage::default()).unwrap_err();
        assert!(matches!(err, HiveError::BoundsExceeded { .. }));
    }
}
