//! Wire payloads for the governance message kinds (`HIVE_VOUCH` is `Vouch`
//! itself, already defined in `hive-core`; these two cover `HIVE_BAN` and
//! `HIVE_PROMOTION`, which have no existing domain type of their own).

use serde::{Deserialize, Serialize};

use hive_core::NodePubkey;

/// Announces a ban proposal or vote. The receiving node proposes the ban
/// locally if it hasn't seen one yet, then always casts its own vote.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BanAnnouncement {
    pub target_pubkey: NodePubkey,
    pub reason_code: String,
    pub evidence_digest: [u8; 32],
    pub proposer_pubkey: NodePubkey,
}

/// Announces that a node believes `target_pubkey` has crossed the
/// promotion quorum. Receivers re-run `finalize_promotion` against their
/// own vouch tally rather than trusting the sender's say-so.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionAnnouncement {
    pub target_pubkey: NodePubkey,
}
