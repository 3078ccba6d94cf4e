use std::path::Path;

use hive_core::{
    BanRecord, ContributionLedgerEntry, HiveError, IntentRecord, InvitationTicket, MemberRecord,
    NodePubkey, PendingAction, PeerStateEntry, Vouch,
};

const SCHEMA_VERSION: u32 = 1;
const META_SCHEMA_VERSION_KEY: &str = "schema_version";
const META_GENESIS_KEY: &str = "genesis";

fn storage_err(e: sled::Error) -> HiveError {
    HiveError::Storage(e.to_string())
}

fn serialize_err(e: bincode::Error) -> HiveError {
    HiveError::Serialization(e.to_string())
}

/// Persistent store backed by `sled` (pure-Rust, no C/LLVM deps).
///
/// Named trees: `members`, `peer_state`, `intents`, `pending_actions`,
/// `contribution_ledger`, `invitations_issued`, `bans`, `vouches`, `meta`.
/// Schema version is a row in `meta`; migrations are forward-only and
/// executed atomically on startup (§6).
pub struct HiveStateDb {
    _db: sled::Db,
    members: sled::Tree,
    peer_state: sled::Tree,
    intents: sled::Tree,
    pending_actions: sled::Tree,
    contribution_ledger: sled::Tree,
    invitations_issued: sled::Tree,
    bans: sled::Tree,
    vouches: sled::Tree,
    meta: sled::Tree,
}

impl HiveStateDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HiveError> {
        let db = sled::open(path).map_err(storage_err)?;
        let members = db.open_tree("members").map_err(storage_err)?;
        let peer_state = db.open_tree("peer_state").map_err(storage_err)?;
        let intents = db.open_tree("intents").map_err(storage_err)?;
        let pending_actions = db.open_tree("pending_actions").map_err(storage_err)?;
        let contribution_ledger = db.open_tree("contribution_ledger").map_err(storage_err)?;
        let invitations_issued = db.open_tree("invitations_issued").map_err(storage_err)?;
        let bans = db.open_tree("bans").map_err(storage_err)?;
        let vouches = db.open_tree("vouches").map_err(storage_err)?;
        let meta = db.open_tree("meta").map_err(storage_err)?;

        let this = Self {
            _db: db,
            members,
            peer_state,
            intents,
            pending_actions,
            contribution_ledger,
            invitations_issued,
            bans,
            vouches,
            meta,
        };
        this.run_migrations()?;
        Ok(this)
    }

    /// Forward-only schema migration, executed atomically on startup.
    fn run_migrations(&self) -> Result<(), HiveError> {
        let current = self
            .get_meta(META_SCHEMA_VERSION_KEY)?
            .map(|b| {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&b[..4]);
                u32::from_be_bytes(arr)
            })
            .unwrap_or(0);
        if current > SCHEMA_VERSION {
            return Err(HiveError::IntegrityError(format!(
                "database schema version {current} is newer than this build supports ({SCHEMA_VERSION})"
            )));
        }
        if current < SCHEMA_VERSION {
            self.put_meta(META_SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_be_bytes())?;
        }
        Ok(())
    }

    // ── Genesis marker ───────────────────────────────────────────────────────

    pub fn is_genesis_complete(&self) -> Result<bool, HiveError> {
        Ok(self.get_meta(META_GENESIS_KEY)?.is_some())
    }

    pub fn mark_genesis_complete(&self, hive_id_bytes: &[u8]) -> Result<(), HiveError> {
        self.put_meta(META_GENESIS_KEY, hive_id_bytes)
    }

    // ── Members ──────────────────────────────────────────────────────────────

    pub fn get_member(&self, pubkey: &NodePubkey) -> Result<Option<MemberRecord>, HiveError> {
        match self.members.get(pubkey.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_member(&self, member: &MemberRecord) -> Result<(), HiveError> {
        let bytes = bincode::serialize(member).map_err(serialize_err)?;
        self.members
            .insert(member.pubkey.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_members(&self) -> Result<Vec<MemberRecord>, HiveError> {
        let mut out = Vec::new();
        for item in self.members.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    pub fn member_count(&self) -> u64 {
        self.members.len() as u64
    }

    // ── Peer state (C6 persisted half — snapshot map lives in FleetStateMap) ──

    pub fn get_peer_state(&self, pubkey: &NodePubkey) -> Result<Option<PeerStateEntry>, HiveError> {
        match self
            .peer_state
            .get(pubkey.as_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    /// Upsert keyed by `(pubkey, version)`. Writes that do not strictly
    /// increase the stored version are ignored (monotone version tracking);
    /// a write with an equal version is an idempotent duplicate, silently
    /// accepted without error.
    pub fn upsert_peer_state(&self, entry: &PeerStateEntry) -> Result<bool, HiveError> {
        if let Some(existing) = self.get_peer_state(&entry.pubkey)? {
            if entry.version < existing.version {
                return Ok(false);
            }
            if entry.version == existing.version {
                return Ok(true);
            }
        }
        let bytes = bincode::serialize(entry).map_err(serialize_err)?;
        self.peer_state
            .insert(entry.pubkey.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(true)
    }

    pub fn iter_peer_state(&self) -> Result<Vec<PeerStateEntry>, HiveError> {
        let mut out = Vec::new();
        for item in self.peer_state.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    // ── Intents ──────────────────────────────────────────────────────────────

    pub fn get_intent(&self, intent_id: &hive_core::IntentId) -> Result<Option<IntentRecord>, HiveError> {
        match self
            .intents
            .get(intent_id.0.as_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_intent(&self, intent: &IntentRecord) -> Result<(), HiveError> {
        let bytes = bincode::serialize(intent).map_err(serialize_err)?;
        self.intents
            .insert(intent.intent_id.0.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_intents(&self) -> Result<Vec<IntentRecord>, HiveError> {
        let mut out = Vec::new();
        for item in self.intents.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    pub fn remove_intent(&self, intent_id: &hive_core::IntentId) -> Result<(), HiveError> {
        self.intents
            .remove(intent_id.0.as_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Pending actions ──────────────────────────────────────────────────────

    pub fn get_pending_action(&self, action_id: &str) -> Result<Option<PendingAction>, HiveError> {
        match self
            .pending_actions
            .get(action_id.as_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_pending_action(&self, action: &PendingAction) -> Result<(), HiveError> {
        let bytes = bincode::serialize(action).map_err(serialize_err)?;
        self.pending_actions
            .insert(action.action_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_pending_actions(&self) -> Result<Vec<PendingAction>, HiveError> {
        let mut out = Vec::new();
        for item in self.pending_actions.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    // ── Contribution ledger ──────────────────────────────────────────────────

    fn contribution_key(self_pubkey: &NodePubkey, peer_pubkey: &NodePubkey) -> Vec<u8> {
        let mut key = self_pubkey.as_bytes().to_vec();
        key.extend_from_slice(peer_pubkey.as_bytes());
        key
    }

    pub fn get_contribution(
        &self,
        self_pubkey: &NodePubkey,
        peer_pubkey: &NodePubkey,
    ) -> Result<Option<ContributionLedgerEntry>, HiveError> {
        let key = Self::contribution_key(self_pubkey, peer_pubkey);
        match self.contribution_ledger.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_contribution(&self, entry: &ContributionLedgerEntry) -> Result<(), HiveError> {
        let key = Self::contribution_key(&entry.self_pubkey, &entry.peer_pubkey);
        let bytes = bincode::serialize(entry).map_err(serialize_err)?;
        self.contribution_ledger
            .insert(key, bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_contributions_for_peer(
        &self,
        peer_pubkey: &NodePubkey,
    ) -> Result<Vec<ContributionLedgerEntry>, HiveError> {
        let mut out = Vec::new();
        for item in self.contribution_ledger.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let entry: ContributionLedgerEntry =
                bincode::deserialize(&bytes).map_err(serialize_err)?;
            if entry.peer_pubkey == *peer_pubkey {
                out.push(entry);
            }
        }
        Ok(out)
    }

    /// Every ledger row this node owns (keyed by `self_pubkey`), i.e. one per
    /// peer this node tracks reciprocity against. Distinct from
    /// `iter_contributions_for_peer`, which instead finds every node's ledger
    /// row for one particular peer.
    pub fn iter_contributions_for_self(
        &self,
        self_pubkey: &NodePubkey,
    ) -> Result<Vec<ContributionLedgerEntry>, HiveError> {
        let mut out = Vec::new();
        for item in self.contribution_ledger.scan_prefix(self_pubkey.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    // ── Invitations ──────────────────────────────────────────────────────────

    pub fn get_invitation(&self, nonce: &[u8; 16]) -> Result<Option<InvitationTicket>, HiveError> {
        match self.invitations_issued.get(nonce).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_invitation(&self, ticket: &InvitationTicket) -> Result<(), HiveError> {
        let bytes = bincode::serialize(ticket).map_err(serialize_err)?;
        self.invitations_issued
            .insert(&ticket.nonce, bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn is_nonce_consumed(&self, nonce: &[u8; 16]) -> Result<bool, HiveError> {
        let key = [b"consumed:".as_slice(), nonce.as_slice()].concat();
        Ok(self.invitations_issued.contains_key(key).map_err(storage_err)?)
    }

    pub fn mark_nonce_consumed(&self, nonce: &[u8; 16]) -> Result<(), HiveError> {
        let key = [b"consumed:".as_slice(), nonce.as_slice()].concat();
        self.invitations_issued
            .insert(key, b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Bans ─────────────────────────────────────────────────────────────────

    pub fn get_ban(&self, target: &NodePubkey) -> Result<Option<BanRecord>, HiveError> {
        match self.bans.get(target.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialize_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_ban(&self, ban: &BanRecord) -> Result<(), HiveError> {
        let bytes = bincode::serialize(ban).map_err(serialize_err)?;
        self.bans
            .insert(ban.target_pubkey.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Vouches ──────────────────────────────────────────────────────────────

    pub fn put_vouch(&self, vouch: &Vouch) -> Result<(), HiveError> {
        let mut key = vouch.target_pubkey.as_bytes().to_vec();
        key.extend_from_slice(vouch.voucher_pubkey.as_bytes());
        let bytes = bincode::serialize(vouch).map_err(serialize_err)?;
        self.vouches.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_vouches_for_target(&self, target: &NodePubkey) -> Result<Vec<Vouch>, HiveError> {
        let mut out = Vec::new();
        for item in self.vouches.scan_prefix(target.as_bytes()) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(serialize_err)?);
        }
        Ok(out)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), HiveError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, HiveError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    pub fn flush(&self) -> Result<(), HiveError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::{PeerFlags, Version};

    fn temp_db(name: &str) -> HiveStateDb {
        let dir = std::env::temp_dir().join(format!("hive_state_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        HiveStateDb::open(&dir).unwrap()
    }

    fn sample_peer_state(pubkey: NodePubkey, version: Version) -> PeerStateEntry {
        PeerStateEntry {
            pubkey,
            version,
            updated_ts: 1000,
            capacity_tier: hive_core::CapacityTier::Medium,
            fee_policy_fingerprint: vec![1, 2, 3],
            flags: PeerFlags::default(),
            signature: hive_core::HiveSignature([0u8; 64]),
        }
    }

    #[test]
    fn monotone_version_is_enforced() {
        let db = temp_db("monotone");
        let pk = NodePubkey([7u8; 33]);

        assert!(db.upsert_peer_state(&sample_peer_state(pk, 5)).unwrap());
        assert_eq!(db.get_peer_state(&pk).unwrap().unwrap().version, 5);

        // Lower version is ignored.
        assert!(!db.upsert_peer_state(&sample_peer_state(pk, 3)).unwrap());
        assert_eq!(db.get_peer_state(&pk).unwrap().unwrap().version, 5);

        // Equal version is an idempotent accept.
        assert!(db.upsert_peer_state(&sample_peer_state(pk, 5)).unwrap());

        // Higher version is applied.
        assert!(db.upsert_peer_state(&sample_peer_state(pk, 9)).unwrap());
        assert_eq!(db.get_peer_state(&pk).unwrap().unwrap().version, 9);
    }

    #[test]
    fn schema_version_row_is_written() {
        let db = temp_db("schema");
        let bytes = db.get_meta(META_SCHEMA_VERSION_KEY).unwrap().unwrap();
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&bytes[..4]);
        assert_eq!(u32::from_be_bytes(arr), SCHEMA_VERSION);
    }
}
