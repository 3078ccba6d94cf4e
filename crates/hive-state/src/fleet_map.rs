use std::collections::HashMap;
use std::sync::RwLock;

use hive_core::{NodePubkey, PeerStateEntry, Timestamp, Version};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// In-memory fleet state map (C6): a copy-on-write snapshot of every known
/// peer's latest `PeerStateEntry`, guarded by a single `RwLock`. Readers take
/// a cheap clone of the map via `snapshot()`; writers hold the lock only for
/// the duration of the insert.
///
/// An epoch counter increments on every applied write so callers can detect
/// whether a snapshot is stale without re-hashing.
pub struct FleetStateMap {
    inner: RwLock<HashMap<NodePubkey, PeerStateEntry>>,
    epoch: std::sync::atomic::AtomicU64,
}

#[derive(Serialize)]
struct StateHashRow<'a> {
    pubkey: &'a str,
    version: Version,
    updated_ts: Timestamp,
}

impl FleetStateMap {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            epoch: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn load_from(entries: Vec<PeerStateEntry>) -> Self {
        let map: HashMap<NodePubkey, PeerStateEntry> =
            entries.into_iter().map(|e| (e.pubkey, e)).collect();
        Self {
            inner: RwLock::new(map),
            epoch: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn get(&self, pubkey: &NodePubkey) -> Option<PeerStateEntry> {
        self.inner.read().expect("fleet state lock poisoned").get(pubkey).cloned()
    }

    /// Applies `entry` if it carries a strictly newer version than any
    /// existing row for the same peer. Returns `true` if applied. Version
    /// ties are idempotent no-ops, not errors.
    pub fn upsert_if_newer(&self, entry: PeerStateEntry) -> bool {
        let mut guard = self.inner.write().expect("fleet state lock poisoned");
        let applied = match guard.get(&entry.pubkey) {
            Some(existing) if entry.version <= existing.version => false,
            _ => {
                guard.insert(entry.pubkey, entry);
                true
            }
        };
        drop(guard);
        if applied {
            self.epoch.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
        }
        applied
    }

    /// Unconditionally installs `entry`, bypassing the version-strictly-
    /// increases check. Used only by anti-entropy merge, where the caller
    /// has already applied the full tie-break rule (version, then
    /// `updated_ts`, then signature) to pick a winner that `upsert_if_newer`
    /// alone cannot express on a tie.
    pub fn set_entry(&self, entry: PeerStateEntry) {
        let mut guard = self.inner.write().expect("fleet state lock poisoned");
        guard.insert(entry.pubkey, entry);
        drop(guard);
        self.epoch.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
    }

    /// Cheap point-in-time clone for readers (RPC handlers, gossip encoder).
    pub fn snapshot(&self) -> Vec<PeerStateEntry> {
        self.inner
            .read()
            .expect("fleet state lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("fleet state lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// State hash per the summary definition: SHA-256 over the canonical
    /// JSON array of `{pubkey, version, updated_ts}` rows, sorted ascending
    /// by pubkey hex. Deterministic regardless of map iteration order.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut rows: Vec<PeerStateEntry> = self.snapshot();
        rows.sort_by(|a, b| a.pubkey.as_bytes().cmp(b.pubkey.as_bytes()));

        let hex_keys: Vec<String> = rows.iter().map(|r| r.pubkey.to_hex()).collect();
        let summary: Vec<StateHashRow> = rows
            .iter()
            .zip(hex_keys.iter())
            .map(|(r, hex_key)| StateHashRow {
                pubkey: hex_key,
                version: r.version,
                updated_ts: r.updated_ts,
            })
            .collect();

        let bytes = hive_codec::to_canonical_bytes(
            &serde_json::to_value(&summary).expect("state hash rows always serialize"),
        );
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

impl Default for FleetStateMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::{CapacityTier, HiveSignature, PeerFlags};

    fn entry(pubkey: u8, version: Version) -> PeerStateEntry {
        PeerStateEntry {
            pubkey: NodePubkey([pubkey; 33]),
            version,
            updated_ts: 100,
            capacity_tier: CapacityTier::Small,
            fee_policy_fingerprint: vec![],
            flags: PeerFlags::default(),
            signature: HiveSignature([0u8; 64]),
        }
    }

    #[test]
    fn state_hash_is_order_independent() {
        let a = FleetStateMap::new();
        a.upsert_if_newer(entry(1, 1));
        a.upsert_if_newer(entry(2, 1));

        let b = FleetStateMap::new();
        b.upsert_if_newer(entry(2, 1));
        b.upsert_if_newer(entry(1, 1));

        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn stale_version_does_not_change_hash() {
        let map = FleetStateMap::new();
        map.upsert_if_newer(entry(1, 5));
        let before = map.state_hash();
        assert!(!map.upsert_if_newer(entry(1, 2)));
        assert_eq!(map.state_hash(), before);
    }
}
