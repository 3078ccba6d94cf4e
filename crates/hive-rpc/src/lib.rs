//! hive-rpc
//!
//! JSON-RPC 2.0 server for Hive coordinator nodes.
//!
//! Namespace: "hive"
//! Methods:
//!   hive_status           — membership counts, state hash, bridge status
//!   hive_members          — full member roster
//!   hive_genesis          — one-shot hive bootstrap
//!   hive_invite           — issue a signed invitation ticket
//!   hive_join             — redeem a ticket and join as Neophyte
//!   hive_vouch            — emit a signed promotion vouch
//!   hive_requestPromotion — attempt to finalize a pending promotion
//!   hive_pendingActions   — list governance actions awaiting decision
//!   hive_approveAction    — operator approval of a pending action
//!   hive_rejectAction     — operator rejection of a pending action
//!   hive_topology         — fleet state map snapshot
//!   hive_contribution     — per-peer contribution ledger entries
//!   hive_intentStatus     — in-flight intent locks
//!   hive_ban              — propose or vote a ban

pub mod api;
pub mod server;
pub mod types;

pub use api::HiveApiServer;
pub use server::{RpcServer, RpcServerState};
pub use types::{
    RpcContributionEntry, RpcGenesisResult, RpcHiveStatus, RpcIntentStatus, RpcInviteResult,
    RpcMemberCounts, RpcMemberRecord, RpcPendingAction, RpcStatusOnly, RpcTopologyEntry,
};
