use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{
    RpcContributionEntry, RpcGenesisResult, RpcHiveStatus, RpcInviteResult, RpcIntentStatus,
    RpcMemberRecord, RpcPendingAction, RpcStatusOnly, RpcTopologyEntry,
};

/// Hive coordinator JSON-RPC 2.0 API definition (spec §6).
///
/// All method names are prefixed with "hive_" via `namespace = "hive"`.
#[rpc(server, namespace = "hive")]
pub trait HiveApi {
    #[method(name = "status")]
    async fn hive_status(&self) -> RpcResult<RpcHiveStatus>;

    #[method(name = "members")]
    async fn hive_members(&self) -> RpcResult<Vec<RpcMemberRecord>>;

    /// One-shot. Fails with `genesis_already_complete` if already run.
    #[method(name = "genesis")]
    async fn hive_genesis(&self) -> RpcResult<RpcGenesisResult>;

    #[method(name = "invite")]
    async fn hive_invite(&self, valid_hours: u32, requirements: u32) -> RpcResult<RpcInviteResult>;

    #[method(name = "join")]
    async fn hive_join(&self, ticket_json: String) -> RpcResult<RpcStatusOnly>;

    /// Checks uniqueness/uptime/contribution before emitting a vouch.
    #[method(name = "vouch")]
    async fn hive_vouch(&self, target_pubkey: String) -> RpcResult<RpcStatusOnly>;

    #[method(name = "requestPromotion")]
    async fn hive_request_promotion(&self, target_pubkey: String) -> RpcResult<RpcStatusOnly>;

    #[method(name = "pendingActions")]
    async fn hive_pending_actions(&self) -> RpcResult<Vec<RpcPendingAction>>;

    #[method(name = "approveAction")]
    async fn hive_approve_action(&self, id: String) -> RpcResult<RpcStatusOnly>;

    #[method(name = "rejectAction")]
    async fn hive_reject_action(&self, id: String, reason: String) -> RpcResult<RpcStatusOnly>;

    #[method(name = "topology")]
    async fn hive_topology(&self) -> RpcResult<Vec<RpcTopologyEntry>>;

    #[method(name = "contribution")]
    async fn hive_contribution(&self, peer_id: Option<String>) -> RpcResult<Vec<RpcContributionEntry>>;

    #[method(name = "intentStatus")]
    async fn hive_intent_status(&self) -> RpcResult<Vec<RpcIntentStatus>>;

    #[method(name = "ban")]
    async fn hive_ban(&self, target: String, reason: String) -> RpcResult<RpcStatusOnly>;
}
