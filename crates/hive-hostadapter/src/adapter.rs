use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hive_core::{HiveError, NodePubkey};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub peer: NodePubkey,
    pub capacity_sats: u64,
    pub local_sats: u64,
    pub remote_sats: u64,
    pub fee_policy_fingerprint: Vec<u8>,
}

/// Urgency hint passed to `close_channel`; the host decides the actual
/// closing transaction's feerate strategy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CloseUrgency {
    Routine,
    Expedited,
}

/// Events the host emits to the coordinator (spec §6 outbound surface).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HostEvent {
    PeerConnected { pubkey: NodePubkey },
    PeerDisconnected { pubkey: NodePubkey },
    ChannelOpened { id: String, peer: NodePubkey, capacity_sats: u64 },
    ChannelClosed { id: String, reason: String },
    HtlcForwarded {
        in_channel: String,
        out_channel: String,
        sats: u64,
        fee_sats: u64,
    },
    CustomMessage { peer: NodePubkey, bytes: Vec<u8> },
}

/// Boundary contract to the external Lightning host (spec §4.10/§6). No
/// concrete node binding ships in this crate — callers supply a real
/// implementation, or use `MockHostAdapter` for development and tests.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    async fn open_channel(
        &self,
        target_pubkey: NodePubkey,
        sats: u64,
        feerate_sat_vb: u32,
        private: bool,
    ) -> Result<String, HiveError>;

    async fn close_channel(&self, channel_id: &str, urgency: CloseUrgency) -> Result<String, HiveError>;

    async fn set_fee(&self, channel_id: &str, base_msat: u32, ppm: u32) -> Result<(), HiveError>;

    async fn rebalance(
        &self,
        from_channel_id: &str,
        to_channel_id: &str,
        amount_sats: u64,
        max_fee_sats: u64,
    ) -> Result<u64, HiveError>;

    async fn list_peers(&self) -> Result<Vec<NodePubkey>, HiveError>;

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, HiveError>;

    async fn send_custom_message(&self, peer_pubkey: NodePubkey, bytes: Vec<u8>) -> Result<(), HiveError>;

    /// Registers a callback invoked for every inbound custom message this
    /// node receives over the host's wire transport.
    async fn register_custom_message_handler(
        &self,
        handler: Box<dyn Fn(NodePubkey, Vec<u8>) + Send + Sync>,
    ) -> Result<(), HiveError>;

    /// Registers a callback invoked for every non-wire host event (peer
    /// connectivity, channel lifecycle, forwards). Distinct from
    /// `register_custom_message_handler` because these events drive the
    /// uptime tracker and contribution ledger rather than protocol dispatch.
    async fn register_event_handler(
        &self,
        handler: Box<dyn Fn(HostEvent) + Send + Sync>,
    ) -> Result<(), HiveError>;
}
