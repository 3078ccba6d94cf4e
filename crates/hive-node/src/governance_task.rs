//! Drives `PendingAction`s from `AwaitingDecision` through to execution
//! according to the node's configured `GovernanceMode` — the piece that
//! otherwise leaves `check_bounds`, `OracleClient`, and `queue::enqueue`
//! wired up but never actually called by a running node.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use hive_core::{ActionState, ActionType, DecisionSource, NodePubkey, PendingAction, Timestamp};
use hive_governance::{
    approve, begin_execution, check_bounds, day_bucket, expire_if_due, finish_execution, reject,
    AutonomousUsage, GovernanceMode, HttpOracleClient, OracleBackoff, OracleClient, OracleVerdict,
    SafetyBounds,
};
use hive_hostadapter::{CloseUrgency, HostAdapter};
use hive_state::HiveStateDb;

const GOVERNANCE_TICK_SECS: u64 = 10;

fn now_ts() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Spawns the governance executor loop. Runs regardless of mode: Advisor
/// mode just leaves `AwaitingDecision` actions alone for the operator's
/// `hive_approve_action`/`hive_reject_action` RPCs, while Autonomous and
/// Oracle modes resolve them here before the `Approved -> Executing ->
/// Executed` leg — which runs the same way in every mode.
pub fn spawn(
    db: Arc<HiveStateDb>,
    host: Arc<dyn HostAdapter>,
    mode: GovernanceMode,
    bounds: SafetyBounds,
    oracle_endpoint: Option<String>,
    oracle_timeout_secs: u64,
) {
    tokio::spawn(async move {
        let oracle: Option<HttpOracleClient> = match (mode, oracle_endpoint) {
            (GovernanceMode::Oracle, Some(endpoint)) => {
                Some(HttpOracleClient::new(endpoint, oracle_timeout_secs))
            }
            (GovernanceMode::Oracle, None) => None,
            _ => None,
        };

        let mut usage = AutonomousUsage::default();
        let mut usage_day = day_bucket(now_ts());
        let mut backoff = OracleBackoff::new();
        let mut next_oracle_retry_ts = 0i64;

        let mut interval = tokio::time::interval(Duration::from_secs(GOVERNANCE_TICK_SECS));
        loop {
            interval.tick().await;
            let now = now_ts();

            let day = day_bucket(now);
            if day != usage_day {
                usage = AutonomousUsage::default();
                usage_day = day;
            }

            let actions = match db.iter_pending_actions() {
                Ok(actions) => actions,
                Err(e) => {
                    warn!(error = %e, "failed to load pending actions");
                    continue;
                }
            };

            for action in actions {
                match action.state {
                    ActionState::AwaitingDecision => {
                        match expire_if_due(&db, &action.action_id, now) {
                            Ok(true) => continue,
                            Ok(false) => {}
                            Err(e) => {
                                warn!(error = %e, action_id = %action.action_id, "failed to check action expiry");
                                continue;
                            }
                        }
                        resolve_awaiting(
                            &db,
                            mode,
                            &bounds,
                            &mut usage,
                            oracle.as_ref(),
                            &mut backoff,
                            &mut next_oracle_retry_ts,
                            now,
                            &action,
                        )
                        .await;
                    }
                    ActionState::Approved => {
                        let begun = match begin_execution(&db, &action.action_id) {
                            Ok(begun) => begun,
                            Err(e) => {
                                warn!(error = %e, action_id = %action.action_id, "failed to begin execution");
                                continue;
                            }
                        };
                        let succeeded = execute_action(host.as_ref(), &begun).await;
                        if let Err(e) = finish_execution(&db, &begun.action_id, succeeded) {
                            warn!(error = %e, action_id = %begun.action_id, "failed to record execution outcome");
                        }
                        info!(action_id = %begun.action_id, succeeded, "pending action executed");
                    }
                    ActionState::Rejected
                    | ActionState::Executing
                    | ActionState::Executed
                    | ActionState::Failed
                    | ActionState::Expired => {}
                }
            }
        }
    });
}

#[allow(clippy::too_many_arguments)]
async fn resolve_awaiting(
    db: &HiveStateDb,
    mode: GovernanceMode,
    bounds: &SafetyBounds,
    usage: &mut AutonomousUsage,
    oracle: Option<&HttpOracleClient>,
    backoff: &mut OracleBackoff,
    next_oracle_retry_ts: &mut Timestamp,
    now: Timestamp,
    action: &PendingAction,
) {
    match mode {
        GovernanceMode::Advisor => {}
        GovernanceMode::Autonomous => match check_bounds(action, bounds, usage) {
            Ok(()) => {
                if approve(db, &action.action_id, DecisionSource::AutoBounds, None).is_ok()
                    && matches!(action.action_type, ActionType::ChannelOpen | ActionType::AcceptPromotion)
                {
                    usage.channel_opens_today += 1;
                }
            }
            Err(e) => {
                if let Err(err) = reject(db, &action.action_id, DecisionSource::AutoBounds, Some(e.to_string())) {
                    warn!(error = %err, action_id = %action.action_id, "failed to record autonomous rejection");
                }
            }
        },
        GovernanceMode::Oracle => {
            let Some(oracle) = oracle else {
                return;
            };
            if now < *next_oracle_retry_ts {
                return;
            }
            match oracle.decide(action).await {
                Ok(OracleVerdict::Approve) => {
                    let _ = approve(db, &action.action_id, DecisionSource::Oracle, None);
                    backoff.reset();
                }
                Ok(OracleVerdict::Reject) => {
                    let _ = reject(db, &action.action_id, DecisionSource::Oracle, Some("oracle rejected".into()));
                    backoff.reset();
                }
                Ok(OracleVerdict::Defer) => {
                    backoff.reset();
                }
                Ok(OracleVerdict::Modify(payload)) => {
                    let mut modified = action.clone();
                    modified.payload = payload;
                    if let Err(e) = db.put_pending_action(&modified) {
                        warn!(error = %e, action_id = %action.action_id, "failed to persist oracle-modified payload");
                    }
                    let _ = approve(db, &action.action_id, DecisionSource::Oracle, Some("oracle modified payload".into()));
                    backoff.reset();
                }
                Err(e) => {
                    warn!(error = %e, action_id = %action.action_id, "oracle decision failed, backing off");
                    *next_oracle_retry_ts = now + backoff.next_delay_secs() as Timestamp;
                }
            }
        }
    }
}

/// Drives an `Approved` action's host side effects. `AcceptPromotion` has
/// no host-side counterpart — membership promotion is finalized through
/// `hive-membership`, not the host adapter — so it always succeeds here.
async fn execute_action(host: &dyn HostAdapter, action: &PendingAction) -> bool {
    match action.action_type {
        ActionType::ChannelOpen => {
            let peer = action
                .payload
                .get("peer_pubkey")
                .and_then(|v| v.as_str())
                .and_then(|s| NodePubkey::from_hex(s).ok());
            let sats = action.payload.get("sats").and_then(|v| v.as_u64()).unwrap_or(0);
            match peer {
                Some(peer) => host.open_channel(peer, sats, 10, false).await.is_ok(),
                None => false,
            }
        }
        ActionType::ChannelClose => {
            let channel_id = action.payload.get("channel_id").and_then(|v| v.as_str());
            match channel_id {
                Some(id) => host.close_channel(id, CloseUrgency::Routine).await.is_ok(),
                None => false,
            }
        }
        ActionType::FeeChange => {
            let channel_id = action.payload.get("channel_id").and_then(|v| v.as_str());
            let base_msat = action.payload.get("base_msat").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            let ppm = action.payload.get("ppm").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            match channel_id {
                Some(id) => host.set_fee(id, base_msat, ppm).await.is_ok(),
                None => false,
            }
        }
        ActionType::Rebalance => {
            let from = action.payload.get("from_channel_id").and_then(|v| v.as_str());
            let to = action.payload.get("to_channel_id").and_then(|v| v.as_str());
            let sats = action.payload.get("sats").and_then(|v| v.as_u64()).unwrap_or(0);
            let max_fee = action.payload.get("max_fee_sats").and_then(|v| v.as_u64()).unwrap_or(0);
            match (from, to) {
                (Some(from), Some(to)) => host.rebalance(from, to, sats, max_fee).await.is_ok(),
                _ => false,
            }
        }
        ActionType::AcceptPromotion => true,
    }
}
