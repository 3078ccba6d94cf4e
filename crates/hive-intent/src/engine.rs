use hive_core::{
    ConflictScope, HiveError, IntentId, IntentRecord, IntentStatus, IntentType, NodePubkey,
    Timestamp, INTENT_HOLD_WINDOW_SECS, INTENT_PURGE_AGE_SECS,
};
use hive_state::HiveStateDb;
use tracing::{info, warn};

/// Announces a new intent: persists it `Pending` before broadcast, so a
/// crash between persist and broadcast is recoverable on restart (spec
/// §4.8 "Intent rows are persisted before announce").
///
/// Rejects with `AlreadyPending` if this initiator already has a `Pending`
/// intent in the same conflict scope.
pub fn announce(
    db: &HiveStateDb,
    intent_type: IntentType,
    initiator_pubkey: NodePubkey,
    conflict_scope: ConflictScope,
    now: Timestamp,
) -> Result<IntentRecord, HiveError> {
    for existing in db.iter_intents()? {
        if existing.status == IntentStatus::Pending
            && existing.initiator_pubkey == initiator_pubkey
            && existing.conflict_scope == conflict_scope
        {
            return Err(HiveError::AlreadyPending);
        }
    }

    let record = IntentRecord {
        intent_id: IntentId::new_random(),
        intent_type,
        initiator_pubkey,
        conflict_scope,
        announce_ts: now,
        hold_deadline_ts: now + INTENT_HOLD_WINDOW_SECS,
        status: IntentStatus::Pending,
    };
    db.put_intent(&record)?;
    Ok(record)
}

/// Total, deterministic tie-break between two conflicting intents (spec
/// §4.8): the smaller lexicographic `initiator_pubkey` wins. Timestamps are
/// never used — clocks drift across the fleet.
pub fn wins_tiebreak(a: &IntentRecord, b: &IntentRecord) -> bool {
    a.initiator_pubkey.as_bytes() < b.initiator_pubkey.as_bytes()
}

/// Invoked when an inbound `HIVE_INTENT` conflicts with a `Pending` local
/// intent. Returns `true` if the local intent lost and was aborted.
pub fn resolve_conflict(
    db: &HiveStateDb,
    local_intent_id: &IntentId,
    remote: &IntentRecord,
) -> Result<bool, HiveError> {
    let mut local = db
        .get_intent(local_intent_id)?
        .ok_or_else(|| HiveError::NotFound("no local intent for conflict resolution".into()))?;

    if local.status != IntentStatus::Pending {
        return Ok(false);
    }
    if wins_tiebreak(&local, remote) {
        return Ok(false);
    }

    local.status = IntentStatus::Aborted;
    db.put_intent(&local)?;
    info!(
        intent_id = %local.intent_id,
        winner = %remote.initiator_pubkey,
        "intent yielded to lower pubkey"
    );
    Ok(true)
}

/// 5s monitor tick (spec §4.8): commits `Pending` intents past their hold
/// deadline with no recorded conflict, and purges terminal-status rows
/// older than 1h. Run on every restart too, to replay unresolved intents.
pub fn run_monitor_tick(db: &HiveStateDb, now: Timestamp) -> Result<(), HiveError> {
    for mut record in db.iter_intents()? {
        match record.status {
            IntentStatus::Pending => {
                if now >= record.hold_deadline_ts {
                    record.status = IntentStatus::Committed;
                    db.put_intent(&record)?;
                    info!(intent_id = %record.intent_id, "intent committed uncontested");
                }
            }
            IntentStatus::Committed | IntentStatus::Aborted | IntentStatus::Expired => {
                if now - record.hold_deadline_ts > INTENT_PURGE_AGE_SECS {
                    db.remove_intent(&record.intent_id)?;
                }
            }
        }
    }
    Ok(())
}

/// Crash-safe replay rule (spec §4.8): on restart, a `Pending` intent past
/// its deadline commits only if no conflicting intent from another
/// initiator survived the crash too. Call once at startup before resuming
/// the normal monitor loop.
pub fn replay_on_restart(db: &HiveStateDb, now: Timestamp) -> Result<(), HiveError> {
    let all = db.iter_intents()?;
    let pending: Vec<&IntentRecord> = all
        .iter()
        .filter(|r| r.status == IntentStatus::Pending)
        .collect();

    for record in &pending {
        if now < record.hold_deadline_ts {
            continue;
        }
        let conflicted = pending.iter().any(|other| {
            other.intent_id != record.intent_id
                && other.conflict_scope == record.conflict_scope
                && other.initiator_pubkey != record.initiator_pubkey
        });
        if conflicted {
            warn!(intent_id = %record.intent_id, "replay found conflicting intent, deferring to monitor tick tie-break");
            continue;
        }
        let mut committed = (*record).clone();
        committed.status = IntentStatus::Committed;
        db.put_intent(&committed)?;
    }
    Ok(())
}
