use hive_core::{CapacityTier, PeerFlags, PeerStateEntry, Timestamp, Version};
use hive_crypto::{Identity, Signable};

/// Canonical signing payload for a `PeerStateEntry`: everything but the
/// signature itself.
pub struct PeerStateEntryPreimage<'a> {
    pub pubkey_hex: String,
    pub version: Version,
    pub updated_ts: Timestamp,
    pub capacity_tier: &'a CapacityTier,
    pub fee_policy_fingerprint_hex: String,
    pub flags: &'a PeerFlags,
}

impl<'a> Signable for PeerStateEntryPreimage<'a> {
    fn signing_bytes(&self) -> Vec<u8> {
        let capacity_tier = match self.capacity_tier {
            CapacityTier::Small => "small",
            CapacityTier::Medium => "medium",
            CapacityTier::Large => "large",
            CapacityTier::XLarge => "xlarge",
        };
        let value = serde_json::json!({
            "pubkey": self.pubkey_hex,
            "version": self.version,
            "updated_ts": self.updated_ts,
            "capacity_tier": capacity_tier,
            "fee_policy_fingerprint": self.fee_policy_fingerprint_hex,
            "flags": {
                "can_accept_tasks": self.flags.can_accept_tasks,
                "seeking_inbound": self.flags.seeking_inbound,
                "seeking_outbound": self.flags.seeking_outbound,
                "banned": self.flags.banned,
            },
        });
        hive_codec::canonical_bytes_for_signing(value)
    }
}

/// Builds and signs the next self-entry to broadcast as `HIVE_GOSSIP`,
/// advancing `version` by exactly one (spec §4.7: "each emission increments
/// the sender's version").
pub fn build_self_entry(
    identity: &Identity,
    previous_version: Version,
    capacity_tier: CapacityTier,
    fee_policy_fingerprint: Vec<u8>,
    flags: PeerFlags,
    now: Timestamp,
) -> PeerStateEntry {
    let pubkey = identity.pubkey();
    let version = previous_version + 1;
    let preimage = PeerStateEntryPreimage {
        pubkey_hex: pubkey.to_hex(),
        version,
        updated_ts: now,
        capacity_tier: &capacity_tier,
        fee_policy_fingerprint_hex: hex::encode(&fee_policy_fingerprint),
        flags: &flags,
    };
    let signature = identity.sign(&preimage.signing_bytes());
    PeerStateEntry {
        pubkey,
        version,
        updated_ts: now,
        capacity_tier,
        fee_policy_fingerprint,
        flags,
        signature,
    }
}

/// Verifies an inbound `HIVE_GOSSIP` entry's signature before it is ever
/// considered for the fleet map.
pub fn verify_entry(entry: &PeerStateEntry) -> bool {
    let preimage = PeerStateEntryPreimage {
        pubkey_hex: entry.pubkey.to_hex(),
        version: entry.version,
        updated_ts: entry.updated_ts,
        capacity_tier: &entry.capacity_tier,
        fee_policy_fingerprint_hex: hex::encode(&entry.fee_policy_fingerprint),
        flags: &entry.flags,
    };
    hive_crypto::verify(&entry.pubkey, &preimage.signing_bytes(), &entry.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_entry_roundtrips_signature() {
        let identity = Identity::generate();
        let entry = build_self_entry(
            &identity,
            4,
            CapacityTier::Medium,
            vec![1, 2, 3],
            PeerFlags::default(),
            1_000,
        );
        assert_eq!(entry.version, 5);
        assert!(verify_entry(&entry));
    }

    #[test]
    fn tampered_entry_fails_verification() {
        let identity = Identity::generate();
        let mut entry = build_self_entry(
            &identity,
            0,
            CapacityTier::Small,
            vec![],
            PeerFlags::default(),
            1_000,
        );
        entry.updated_ts += 1;
        assert!(!verify_entry(&entry));
    }
}
