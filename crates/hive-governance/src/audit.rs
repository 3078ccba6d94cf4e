use hive_core::{HiveSignature, NodePubkey, Timestamp};
use hive_crypto::{Identity, Signable};
use serde::{Deserialize, Serialize};

/// One tamper-evident audit record for a governance transition (spec §4.9:
/// "Each transition emits an audit record... the record's signature chains
/// to the last record"). `prev_record_sig` is all-zero for the first record
/// a node ever emits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action_id: String,
    pub actor_pubkey: NodePubkey,
    pub transition: String,
    pub reason: Option<String>,
    pub ts: Timestamp,
    pub prev_record_sig: HiveSignature,
    pub signature: HiveSignature,
}

struct AuditPreimage<'a> {
    action_id: &'a str,
    actor_pubkey: &'a NodePubkey,
    transition: &'a str,
    reason: &'a Option<String>,
    ts: Timestamp,
    prev_record_sig: &'a HiveSignature,
}

impl<'a> Signable for AuditPreimage<'a> {
    fn signing_bytes(&self) -> Vec<u8> {
        let value = serde_json::json!({
            "action_id": self.action_id,
            "actor_pubkey": self.actor_pubkey.to_hex(),
            "transition": self.transition,
            "reason": self.reason,
            "ts": self.ts,
            "prev_record_sig": self.prev_record_sig.to_hex(),
        });
        hive_codec::canonical_bytes_for_signing(value)
    }
}

/// Maintains the running chain of audit records for a single node's
/// governance activity, one link per transition.
pub struct AuditChain {
    last_sig: HiveSignature,
}

impl AuditChain {
    pub fn new() -> Self {
        Self {
            last_sig: HiveSignature([0u8; 64]),
        }
    }

    pub fn append(
        &mut self,
        identity: &Identity,
        action_id: &str,
        transition: &str,
        reason: Option<String>,
        now: Timestamp,
    ) -> AuditRecord {
        let actor_pubkey = identity.pubkey();
        let preimage = AuditPreimage {
            action_id,
            actor_pubkey: &actor_pubkey,
            transition,
            reason: &reason,
            ts: now,
            prev_record_sig: &self.last_sig,
        };
        let signature = identity.sign(&preimage.signing_bytes());
        let record = AuditRecord {
            action_id: action_id.to_string(),
            actor_pubkey,
            transition: transition.to_string(),
            reason,
            ts: now,
            prev_record_sig: self.last_sig,
            signature,
        };
        self.last_sig = record.signature;
        record
    }
}

impl Default for AuditChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Verifies one record's signature and that it correctly links to the
/// previous record in the chain.
pub fn verify_link(record: &AuditRecord, expected_prev_sig: &HiveSignature) -> bool {
    if record.prev_record_sig != *expected_prev_sig {
        return false;
    }
    let preimage = AuditPreimage {
        action_id: &record.action_id,
        actor_pubkey: &record.actor_pubkey,
        transition: &record.transition,
        reason: &record.reason,
        ts: record.ts,
        prev_record_sig: &record.prev_record_sig,
    };
    hive_crypto::verify(&record.actor_pubkey, &preimage.signing_bytes(), &record.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_links_verify_in_order() {
        let identity = Identity::generate();
        let mut chain = AuditChain::new();
        let first = chain.append(&identity, "a1", "approve", None, 100);
        let second = chain.append(&identity, "a1", "execute", None, 200);

        assert!(verify_link(&first, &HiveSignature([0u8; 64])));
        assert!(verify_link(&second, &first.signature));
    }

    #[test]
    fn tampered_transition_breaks_verification() {
        let identity = Identity::generate();
        let mut chain = AuditChain::new();
        let mut record = chain.append(&identity, "a1", "approve", None, 100);
        record.transition = "reject".into();
        assert!(!verify_link(&record, &HiveSignature([0u8; 64])));
    }
}
