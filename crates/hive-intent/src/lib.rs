pub mod engine;

pub use engine::{announce, replay_on_restart, resolve_conflict, run_monitor_tick, wins_tiebreak};

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::{ConflictScope, IntentType, NodePubkey};
    use hive_state::HiveStateDb;

    fn temp_db(name: &str) -> HiveStateDb {
        let dir =
            std::env::temp_dir().join(format!("hive_intent_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        HiveStateDb::open(&dir).unwrap()
    }

    #[test]
    fn duplicate_announce_same_scope_is_rejected() {
        let db = temp_db("dup");
        let initiator = NodePubkey([1u8; 33]);
        let scope = ConflictScope::Target(NodePubkey([9u8; 33]));
        engine::announce(&db, IntentType::ChannelOpen, initiator, scope.clone(), 0).unwrap();
        let err =
            engine::announce(&db, IntentType::ChannelOpen, initiator, scope, 0).unwrap_err();
        assert!(matches!(err, hive_core::HiveError::AlreadyPending));
    }

    #[test]
    fn lower_pubkey_wins_tiebreak() {
        let scope = ConflictScope::Target(NodePubkey([9u8; 33]));
        let low = hive_core::IntentRecord {
            intent_id: hive_core::IntentId::new_random(),
            intent_type: IntentType::ChannelOpen,
            initiator_pubkey: NodePubkey([1u8; 33]),
            conflict_scope: scope.clone(),
            announce_ts: 0,
            hold_deadline_ts: 60,
            status: hive_core::IntentStatus::Pending,
        };
        let high = hive_core::IntentRecord {
            initiator_pubkey: NodePubkey([2u8; 33]),
            intent_id: hive_core::IntentId::new_random(),
            ..low.clone()
        };
        assert!(wins_tiebreak(&low, &high));
        assert!(!wins_tiebreak(&high, &low));
    }

    #[test]
    fn monitor_commits_past_deadline_uncontested() {
        let db = temp_db("commit");
        let initiator = NodePubkey([3u8; 33]);
        let scope = ConflictScope::Target(NodePubkey([9u8; 33]));
        let record = engine::announce(&db, IntentType::Rebalance, initiator, scope, 0).unwrap();
        engine::run_monitor_tick(&db, record.hold_deadline_ts + 1).unwrap();
        let refreshed = db.get_intent(&record.intent_id).unwrap().unwrap();
        assert_eq!(refreshed.status, hive_core::IntentStatus::Committed);
    }
}
