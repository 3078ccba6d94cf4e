use hive_core::{
    ActionState, ActionType, DecisionSource, HiveError, PendingAction, Timestamp,
};
use hive_state::HiveStateDb;

/// Enqueues a newly planned action in `AwaitingDecision` (spec §4.9).
pub fn enqueue(
    db: &HiveStateDb,
    action_id: String,
    action_type: ActionType,
    payload: serde_json::Value,
    now: Timestamp,
    ttl_secs: i64,
) -> Result<PendingAction, HiveError> {
    let action = PendingAction {
        action_id,
        action_type,
        payload,
        proposed_ts: now,
        expires_ts: now + ttl_secs,
        state: ActionState::AwaitingDecision,
        decision_source: None,
        decision_reason: None,
    };
    db.put_pending_action(&action)?;
    Ok(action)
}

fn require_awaiting(action: &PendingAction) -> Result<(), HiveError> {
    if action.state != ActionState::AwaitingDecision {
        return Err(HiveError::ConsensusError(
            "only AwaitingDecision actions may be resolved".into(),
        ));
    }
    Ok(())
}

/// Operator or oracle approval: `AwaitingDecision -> Approved`.
pub fn approve(
    db: &HiveStateDb,
    action_id: &str,
    source: DecisionSource,
    reason: Option<String>,
) -> Result<PendingAction, HiveError> {
    let mut action = db
        .get_pending_action(action_id)?
        .ok_or_else(|| HiveError::NotFound(format!("no pending action {action_id}")))?;
    require_awaiting(&action)?;
    action.state = ActionState::Approved;
    action.decision_source = Some(source);
    action.decision_reason = reason;
    db.put_pending_action(&action)?;
    Ok(action)
}

/// Operator or oracle rejection: `AwaitingDecision -> Rejected`.
pub fn reject(
    db: &HiveStateDb,
    action_id: &str,
    source: DecisionSource,
    reason: Option<String>,
) -> Result<PendingAction, HiveError> {
    let mut action = db
        .get_pending_action(action_id)?
        .ok_or_else(|| HiveError::NotFound(format!("no pending action {action_id}")))?;
    require_awaiting(&action)?;
    action.state = ActionState::Rejected;
    action.decision_source = Some(source);
    action.decision_reason = reason;
    db.put_pending_action(&action)?;
    Ok(action)
}

/// Expires an `AwaitingDecision` action whose deadline has passed.
pub fn expire_if_due(db: &HiveStateDb, action_id: &str, now: Timestamp) -> Result<bool, HiveError> {
    let mut action = db
        .get_pending_action(action_id)?
        .ok_or_else(|| HiveError::NotFound(format!("no pending action {action_id}")))?;
    if action.state != ActionState::AwaitingDecision || now < action.expires_ts {
        return Ok(false);
    }
    action.state = ActionState::Expired;
    db.put_pending_action(&action)?;
    Ok(true)
}

/// `Approved -> Executing`, driven by the executor collaborator, not by
/// governance itself (spec §4.9: "transitions from Approved onward are
/// driven by the executor collaborator").
pub fn begin_execution(db: &HiveStateDb, action_id: &str) -> Result<PendingAction, HiveError> {
    let mut action = db
        .get_pending_action(action_id)?
        .ok_or_else(|| HiveError::NotFound(format!("no pending action {action_id}")))?;
    if action.state != ActionState::Approved {
        return Err(HiveError::ConsensusError(
            "only Approved actions may begin execution".into(),
        ));
    }
    action.state = ActionState::Executing;
    db.put_pending_action(&action)?;
    Ok(action)
}

pub fn finish_execution(
    db: &HiveStateDb,
    action_id: &str,
    succeeded: bool,
) -> Result<PendingAction, HiveError> {
    let mut action = db
        .get_pending_action(action_id)?
        .ok_or_else(|| HiveError::NotFound(format!("no pending action {action_id}")))?;
    if action.state != ActionState::Executing {
        return Err(HiveError::ConsensusError(
            "only Executing actions may finish".into(),
        ));
    }
    action.state = if succeeded {
        ActionState::Executed
    } else {
        ActionState::Failed
    };
    db.put_pending_action(&action)?;
    Ok(action)
}
