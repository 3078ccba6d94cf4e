use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use hive_core::{HiveError, NodePubkey};

use crate::adapter::{ChannelInfo, CloseUrgency, HostAdapter, HostEvent};

type CustomMessageHandler = Box<dyn Fn(NodePubkey, Vec<u8>) + Send + Sync>;
type EventHandler = Box<dyn Fn(HostEvent) + Send + Sync>;

/// In-memory stand-in for a real Lightning host, used by tests and by
/// `hive-node` when started without a host binding. Not for production —
/// warns loudly at construction, in the same spirit as the ephemeral dev-mode
/// keys other tooling in this corpus logs about.
pub struct MockHostAdapter {
    channels: Mutex<Vec<ChannelInfo>>,
    peers: Mutex<Vec<NodePubkey>>,
    next_channel_id: AtomicU64,
    message_handler: Mutex<Option<CustomMessageHandler>>,
    event_handler: Mutex<Option<EventHandler>>,
}

impl MockHostAdapter {
    pub fn new() -> Self {
        warn!("using MockHostAdapter: no real Lightning node is bound, for development/test only");
        Self {
            channels: Mutex::new(Vec::new()),
            peers: Mutex::new(Vec::new()),
            next_channel_id: AtomicU64::new(1),
            message_handler: Mutex::new(None),
            event_handler: Mutex::new(None),
        }
    }

    pub fn seed_peer(&self, pubkey: NodePubkey) {
        self.peers.lock().expect("mock host lock poisoned").push(pubkey);
    }

    /// Delivers `bytes` from `peer` as if the host had received it over the
    /// wire. No real transport backs this mock, so tests drive inbound
    /// frames by calling this directly rather than through a peer's own
    /// `send_custom_message`.
    pub fn deliver_custom_message(&self, peer: NodePubkey, bytes: Vec<u8>) {
        let handler = self.message_handler.lock().expect("mock host lock poisoned");
        if let Some(handler) = handler.as_ref() {
            handler(peer, bytes);
        }
    }

    /// Simulates the host pushing a connectivity/channel/forward event to
    /// whatever registered an event handler.
    pub fn emit_event(&self, event: HostEvent) {
        let handler = self.event_handler.lock().expect("mock host lock poisoned");
        if let Some(handler) = handler.as_ref() {
            handler(event);
        }
    }
}

impl Default for MockHostAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostAdapter for MockHostAdapter {
    async fn open_channel(
        &self,
        target_pubkey: NodePubkey,
        sats: u64,
        _feerate_sat_vb: u32,
        _private: bool,
    ) -> Result<String, HiveError> {
        let id = format!("mock-chan-{}", self.next_channel_id.fetch_add(1, Ordering::SeqCst));
        self.channels.lock().expect("mock host lock poisoned").push(ChannelInfo {
            id: id.clone(),
            peer: target_pubkey,
            capacity_sats: sats,
            local_sats: sats,
            remote_sats: 0,
            fee_policy_fingerprint: vec![],
        });
        Ok(id)
    }

    async fn close_channel(&self, channel_id: &str, _urgency: CloseUrgency) -> Result<String, HiveError> {
        let mut channels = self.channels.lock().expect("mock host lock poisoned");
        let before = channels.len();
        channels.retain(|c| c.id != channel_id);
        if channels.len() == before {
            return Err(HiveError::NotFound(format!("no such channel {channel_id}")));
        }
        Ok(format!("mock-txid-{channel_id}"))
    }

    async fn set_fee(&self, channel_id: &str, base_msat: u32, ppm: u32) -> Result<(), HiveError> {
        let mut channels = self.channels.lock().expect("mock host lock poisoned");
        let channel = channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| HiveError::NotFound(format!("no such channel {channel_id}")))?;
        channel.fee_policy_fingerprint = format!("{base_msat}:{ppm}").into_bytes();
        Ok(())
    }

    async fn rebalance(
        &self,
        from_channel_id: &str,
        to_channel_id: &str,
        amount_sats: u64,
        max_fee_sats: u64,
    ) -> Result<u64, HiveError> {
        let mut channels = self.channels.lock().expect("mock host lock poisoned");
        let from_has_funds = channels
            .iter()
            .find(|c| c.id == from_channel_id)
            .map(|c| c.local_sats >= amount_sats)
            .unwrap_or(false);
        if !from_has_funds {
            return Err(HiveError::HostUnavailable(format!(
                "insufficient local balance on {from_channel_id}"
            )));
        }
        for channel in channels.iter_mut() {
            if channel.id == from_channel_id {
                channel.local_sats -= amount_sats;
            } else if channel.id == to_channel_id {
                channel.local_sats += amount_sats;
            }
        }
        Ok(max_fee_sats.min(1))
    }

    async fn list_peers(&self) -> Result<Vec<NodePubkey>, HiveError> {
        Ok(self.peers.lock().expect("mock host lock poisoned").clone())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, HiveError> {
        Ok(self.channels.lock().expect("mock host lock poisoned").clone())
    }

    async fn send_custom_message(&self, _peer_pubkey: NodePubkey, _bytes: Vec<u8>) -> Result<(), HiveError> {
        Ok(())
    }

    async fn register_custom_message_handler(
        &self,
        handler: Box<dyn Fn(NodePubkey, Vec<u8>) + Send + Sync>,
    ) -> Result<(), HiveError> {
        *self.message_handler.lock().expect("mock host lock poisoned") = Some(handler);
        Ok(())
    }

    async fn register_event_handler(
        &self,
        handler: Box<dyn Fn(HostEvent) + Send + Sync>,
    ) -> Result<(), HiveError> {
        *self.event_handler.lock().expect("mock host lock poisoned") = Some(handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_then_close_channel_roundtrips() {
        let host = MockHostAdapter::new();
        let peer = NodePubkey([5u8; 33]);
        let id = host.open_channel(peer, 100_000, 10, false).await.unwrap();
        assert_eq!(host.list_channels().await.unwrap().len(), 1);
        host.close_channel(&id, CloseUrgency::Routine).await.unwrap();
        assert!(host.list_channels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rebalance_moves_funds_between_channels() {
        let host = MockHostAdapter::new();
        let peer = NodePubkey([6u8; 33]);
        let a = host.open_channel(peer, 100_000, 10, false).await.unwrap();
        let b = host.open_channel(peer, 0, 10, false).await.unwrap();
        host.rebalance(&a, &b, 10_000, 100).await.unwrap();
        let channels = host.list_channels().await.unwrap();
        let chan_b = channels.iter().find(|c| c.id == b).unwrap();
        assert_eq!(chan_b.local_sats, 10_000);
    }

    #[tokio::test]
    async fn registered_message_handler_sees_delivered_bytes() {
        use std::sync::atomic::AtomicBool;
        let host = MockHostAdapter::new();
        let seen = std::sync::Arc::new(AtomicBool::new(false));
        let seen_clone = seen.clone();
        host.register_custom_message_handler(Box::new(move |_peer, _bytes| {
            seen_clone.store(true, Ordering::SeqCst);
        }))
        .await
        .unwrap();
        host.deliver_custom_message(NodePubkey([1u8; 33]), vec![1, 2, 3]);
        assert!(seen.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn registered_event_handler_sees_emitted_events() {
        use std::sync::atomic::AtomicBool;
        let host = MockHostAdapter::new();
        let seen = std::sync::Arc::new(AtomicBool::new(false));
        let seen_clone = seen.clone();
        host.register_event_handler(Box::new(move |event| {
            if matches!(event, HostEvent::PeerConnected { .. }) {
                seen_clone.store(true, Ordering::SeqCst);
            }
        }))
        .await
        .unwrap();
        host.emit_event(HostEvent::PeerConnected { pubkey: NodePubkey([2u8; 33]) });
        assert!(seen.load(Ordering::SeqCst));
    }
}
