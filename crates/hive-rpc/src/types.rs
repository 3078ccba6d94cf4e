use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcMemberCounts {
    pub total: u64,
    pub admins: u64,
    pub members: u64,
    pub neophytes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcHiveStatus {
    pub hive_id: Option<String>,
    pub status: String,
    pub members: RpcMemberCounts,
    pub state_hash: String,
    pub bridge_status: String,
    pub governance_mode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcMemberRecord {
    pub pubkey: String,
    pub tier: String,
    pub joined_ts: i64,
    pub probation_ends_ts: Option<i64>,
    pub contribution_ratio: f64,
    pub uptime_fraction: f64,
    pub banned: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcGenesisResult {
    pub hive_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcInviteResult {
    pub ticket_json: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcStatusOnly {
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcPendingAction {
    pub action_id: String,
    pub action_type: String,
    pub state: String,
    pub proposed_ts: i64,
    pub expires_ts: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcIntentStatus {
    pub intent_id: String,
    pub intent_type: String,
    pub initiator_pubkey: String,
    pub status: String,
    pub hold_deadline_ts: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcContributionEntry {
    pub peer_pubkey: String,
    pub sats_forwarded_to_peer_lifetime: u64,
    pub sats_received_from_peer_lifetime: u64,
    pub reciprocity_balance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcTopologyEntry {
    pub pubkey: String,
    pub version: u64,
    pub updated_ts: i64,
    pub capacity_tier: String,
}
