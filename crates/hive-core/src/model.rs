//! Shared data-model records (spec §3). These are plain records with no
//! storage or protocol behavior attached — `hive-state` persists them,
//! `hive-membership`/`hive-intent`/`hive-governance`/`hive-gossip` build and
//! validate them.

use serde::{Deserialize, Serialize};

use crate::types::{CapacityTier, HiveSignature, IntentId, NodePubkey, Tier, Timestamp, Version};

// ── Member record ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberRecord {
    pub pubkey: NodePubkey,
    pub tier: Tier,
    pub joined_ts: Timestamp,
    /// Set only while `tier == Neophyte`.
    pub probation_ends_ts: Option<Timestamp>,
    pub contribution_ratio: f64,
    /// Rolling 30-day uptime fraction in `[0.0, 1.0]`.
    pub uptime_fraction: f64,
    pub last_seen_ts: Timestamp,
    pub banned: bool,
    pub ban_reason: Option<String>,
}

// ── Peer state entry (C6) ────────────────────────────────────────────────────

/// Flag bits carried in a peer state entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PeerFlags {
    pub can_accept_tasks: bool,
    pub seeking_inbound: bool,
    pub seeking_outbound: bool,
    pub banned: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerStateEntry {
    pub pubkey: NodePubkey,
    pub version: Version,
    pub updated_ts: Timestamp,
    pub capacity_tier: CapacityTier,
    /// Opaque summary of the peer's current external fee policy; never the
    /// raw fee schedule itself.
    pub fee_policy_fingerprint: Vec<u8>,
    pub flags: PeerFlags,
    pub signature: HiveSignature,
}

// ── Invitation ticket ────────────────────────────────────────────────────────

/// Requirement bits an invitee must prove during the handshake probe.
pub mod requirement_bits {
    pub const SPLICE: u32 = 1 << 0;
    pub const DUAL_FUND: u32 = 1 << 1;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvitationTicket {
    pub issuer_pubkey: NodePubkey,
    pub nonce: [u8; 16],
    pub issued_ts: Timestamp,
    pub expires_ts: Timestamp,
    pub requirement_bitmask: u32,
    pub issuer_signature: HiveSignature,
}

// ── Intent record (C8) ───────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum IntentType {
    ChannelOpen,
    Rebalance,
    BanPeer,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Hash)]
pub enum ConflictScope {
    /// `ChannelOpen`: same external target pubkey.
    Target(NodePubkey),
    /// `Rebalance`: overlapping channel-id set, represented as its sorted members.
    ChannelSet(Vec<String>),
    /// `BanPeer`: same target pubkey.
    BanTarget(NodePubkey),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum IntentStatus {
    Pending,
    Committed,
    Aborted,
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent_id: IntentId,
    pub intent_type: IntentType,
    pub initiator_pubkey: NodePubkey,
    pub conflict_scope: ConflictScope,
    pub announce_ts: Timestamp,
    pub hold_deadline_ts: Timestamp,
    pub status: IntentStatus,
}

// ── Pending action (C9) ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ActionType {
    ChannelOpen,
    FeeChange,
    Rebalance,
    ChannelClose,
    AcceptPromotion,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ActionState {
    AwaitingDecision,
    Approved,
    Rejected,
    Executing,
    Executed,
    Failed,
    Expired,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DecisionSource {
    Operator,
    Oracle,
    AutoBounds,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingAction {
    pub action_id: String,
    pub action_type: ActionType,
    pub payload: serde_json::Value,
    pub proposed_ts: Timestamp,
    pub expires_ts: Timestamp,
    pub state: ActionState,
    pub decision_source: Option<DecisionSource>,
    pub decision_reason: Option<String>,
}

// ── Contribution ledger entry ────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContributionLedgerEntry {
    pub self_pubkey: NodePubkey,
    pub peer_pubkey: NodePubkey,
    pub sats_forwarded_to_peer_lifetime: u64,
    pub sats_received_from_peer_lifetime: u64,
    pub tasks_requested_lifetime: u64,
    pub tasks_fulfilled_lifetime: u64,
    pub reciprocity_balance: f64,
    pub last_updated_ts: Timestamp,
}

// ── Ban record ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BanRecord {
    pub target_pubkey: NodePubkey,
    pub reason_code: String,
    pub evidence_digest: [u8; 32],
    pub proposer_pubkey: NodePubkey,
    pub votes: Vec<NodePubkey>,
    pub effective_ts: Option<Timestamp>,
}

// ── Vouch ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vouch {
    pub target_pubkey: NodePubkey,
    pub voucher_pubkey: NodePubkey,
    pub issued_ts: Timestamp,
    pub voucher_sig: HiveSignature,
}
