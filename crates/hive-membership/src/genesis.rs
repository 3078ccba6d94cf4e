use hive_core::{HiveError, HiveId, MemberRecord, NodePubkey, Tier, Timestamp};
use hive_state::HiveStateDb;

/// Executes the Genesis operation: exactly one node in a hive's lifetime may
/// run this. The caller becomes Admin and the hive id derives from its
/// identity and the genesis timestamp (spec §4.5, §3). Double-genesis fails.
pub fn perform_genesis(
    db: &HiveStateDb,
    root_admin_pubkey: NodePubkey,
    now: Timestamp,
) -> Result<HiveId, HiveError> {
    if db.is_genesis_complete()? {
        return Err(HiveError::DuplicateGenesis);
    }

    let hive_id = HiveId::derive(&root_admin_pubkey, now);

    let admin = MemberRecord {
        pubkey: root_admin_pubkey,
        tier: Tier::Admin,
        joined_ts: now,
        probation_ends_ts: None,
        contribution_ratio: 0.0,
        uptime_fraction: 1.0,
        last_seen_ts: now,
        banned: false,
        ban_reason: None,
    };
    db.put_member(&admin)?;
    db.mark_genesis_complete(&hive_id.0)?;

    Ok(hive_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> HiveStateDb {
        let dir = std::env::temp_dir().join(format!(
            "hive_membership_genesis_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        HiveStateDb::open(&dir).unwrap()
    }

    #[test]
    fn first_genesis_creates_admin() {
        let db = temp_db("first");
        let root = NodePubkey([1u8; 33]);
        let hive_id = perform_genesis(&db, root, 1_000).unwrap();
        assert_eq!(hive_id, HiveId::derive(&root, 1_000));
        let admin = db.get_member(&root).unwrap().unwrap();
        assert_eq!(admin.tier, Tier::Admin);
    }

    #[test]
    fn double_genesis_fails() {
        let db = temp_db("double");
        let root = NodePubkey([2u8; 33]);
        perform_genesis(&db, root, 1_000).unwrap();
        let err = perform_genesis(&db, root, 2_000).unwrap_err();
        assert!(matches!(err, HiveError::DuplicateGenesis));
    }
}
