//! Turns host connectivity/forwarding events into the uptime and
//! contribution-ledger updates `hive-membership` otherwise only exercises
//! from its own unit tests: `HostEvent::PeerConnected`/`PeerDisconnected`
//! drive `UptimeTracker`, and `HostEvent::HtlcForwarded` drives the
//! reciprocity ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use hive_core::{NodePubkey, DEFAULT_PROBATION_WINDOW_SECS};
use hive_hostadapter::{HostAdapter, HostEvent};
use hive_membership::UptimeTracker;
use hive_state::HiveStateDb;

struct TelemetryState {
    db: Arc<HiveStateDb>,
    host: Arc<dyn HostAdapter>,
    self_pubkey: NodePubkey,
    trackers: Mutex<HashMap<NodePubkey, UptimeTracker>>,
}

impl TelemetryState {
    fn now(&self) -> hive_core::Timestamp {
        chrono::Utc::now().timestamp()
    }

    fn handle_event(self: &Arc<Self>, event: HostEvent) {
        match event {
            HostEvent::PeerConnected { pubkey } => self.on_connect(pubkey),
            HostEvent::PeerDisconnected { pubkey } => self.on_disconnect(pubkey),
            HostEvent::HtlcForwarded { in_channel, out_channel, sats, .. } => {
                self.on_htlc_forwarded(in_channel, out_channel, sats);
            }
            HostEvent::ChannelOpened { .. }
            | HostEvent::ChannelClosed { .. }
            | HostEvent::CustomMessage { .. } => {}
        }
    }

    fn on_connect(&self, pubkey: NodePubkey) {
        let now = self.now();
        let mut trackers = self.trackers.lock().expect("uptime tracker map lock poisoned");
        let tracker = trackers
            .entry(pubkey)
            .or_insert_with(|| UptimeTracker::new(now, DEFAULT_PROBATION_WINDOW_SECS));
        tracker.on_peer_connected(now);
        self.persist_uptime(pubkey, tracker.uptime_fraction(now));
    }

    fn on_disconnect(&self, pubkey: NodePubkey) {
        let now = self.now();
        let mut trackers = self.trackers.lock().expect("uptime tracker map lock poisoned");
        let tracker = trackers
            .entry(pubkey)
            .or_insert_with(|| UptimeTracker::new(now, DEFAULT_PROBATION_WINDOW_SECS));
        tracker.on_peer_disconnected(now);
        self.persist_uptime(pubkey, tracker.uptime_fraction(now));
    }

    fn persist_uptime(&self, pubkey: NodePubkey, uptime_fraction: f64) {
        match self.db.get_member(&pubkey) {
            Ok(Some(mut member)) => {
                member.uptime_fraction = uptime_fraction;
                if let Err(e) = self.db.put_member(&member) {
                    warn!(error = %e, peer = %pubkey, "failed to persist updated uptime fraction");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, peer = %pubkey, "failed to load member for uptime update"),
        }
    }

    /// `HtlcForwarded` only carries channel ids, so the peer on the
    /// outbound leg has to be resolved against the host's live channel list
    /// — an async call the sync event-handler callback can't make directly.
    fn on_htlc_forwarded(self: &Arc<Self>, in_channel: String, out_channel: String, sats: u64) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let channels = match this.host.list_channels().await {
                Ok(channels) => channels,
                Err(e) => {
                    warn!(error = %e, "failed to list channels for forwarded-HTLC attribution");
                    return;
                }
            };
            let _ = &in_channel;
            let out_peer = channels.iter().find(|c| c.id == out_channel).map(|c| c.peer);
            let Some(out_peer) = out_peer else {
                return;
            };
            let now = this.now();
            if let Err(e) =
                hive_membership::record_forward(&this.db, &this.self_pubkey, &out_peer, sats, now)
            {
                warn!(error = %e, peer = %out_peer, "failed to record forwarded-HTLC contribution");
            }
        });
    }
}

/// Registers the telemetry event handler with the host. Registration itself
/// is async (the trait method is), so this spawns rather than requiring the
/// caller to await — `main` wires this up alongside the other startup tasks.
pub fn register(host: Arc<dyn HostAdapter>, db: Arc<HiveStateDb>, self_pubkey: NodePubkey) {
    let state = Arc::new(TelemetryState {
        db,
        host: Arc::clone(&host),
        self_pubkey,
        trackers: Mutex::new(HashMap::new()),
    });
    tokio::spawn(async move {
        let handler_state = Arc::clone(&state);
        let result = host
            .register_event_handler(Box::new(move |event| handler_state.handle_event(event)))
            .await;
        if let Err(e) = result {
            warn!(error = %e, "failed to register host event handler");
        }
    });
}
