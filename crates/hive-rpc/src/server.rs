use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use hive_core::{DecisionSource, HiveId, NodePubkey, Tier, Timestamp, Vouch};
use hive_crypto::Identity;
use hive_governance::GovernanceMode;
use hive_hostadapter::HostAdapter;
use hive_state::{FleetStateMap, HiveStateDb};

use crate::api::HiveApiServer;
use crate::types::{
    RpcContributionEntry, RpcGenesisResult, RpcHiveStatus, RpcInviteResult, RpcIntentStatus,
    RpcMemberCounts, RpcMemberRecord, RpcPendingAction, RpcStatusOnly, RpcTopologyEntry,
};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn parse_pubkey(hex_str: &str) -> Result<NodePubkey, ErrorObject<'static>> {
    NodePubkey::from_hex(hex_str).map_err(|e| rpc_err(-32602, format!("invalid pubkey: {e}")))
}

fn tier_str(tier: Tier) -> String {
    tier.to_string()
}

fn governance_mode_str(mode: GovernanceMode) -> String {
    match mode {
        GovernanceMode::Advisor => "advisor",
        GovernanceMode::Autonomous => "autonomous",
        GovernanceMode::Oracle => "oracle",
    }
    .to_string()
}

fn capacity_tier_str(tier: hive_core::CapacityTier) -> String {
    match tier {
        hive_core::CapacityTier::Small => "small",
        hive_core::CapacityTier::Medium => "medium",
        hive_core::CapacityTier::Large => "large",
        hive_core::CapacityTier::XLarge => "xlarge",
    }
    .to_string()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<HiveStateDb>,
    pub fleet_map: Arc<FleetStateMap>,
    pub identity: Arc<Identity>,
    pub hive_id: Arc<std::sync::RwLock<Option<HiveId>>>,
    pub host: Arc<dyn HostAdapter>,
    pub governance_mode: GovernanceMode,
    pub bridge_status: String,
    pub clock: Box<dyn Fn() -> Timestamp + Send + Sync>,
}

impl RpcServerState {
    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    #[allow(dead_code)]
    fn known_admins(&self) -> Result<Vec<NodePubkey>, hive_core::HiveError> {
        Ok(self
            .db
            .iter_members()?
            .into_iter()
            .filter(|m| m.tier == Tier::Admin)
            .map(|m| m.pubkey)
            .collect())
    }

    /// Broadcasts a governance wire frame to every peer the host currently
    /// knows about. Operator RPCs mutate this node's own database directly,
    /// but independently-run `hive-node` processes only learn about the
    /// change once it arrives as a wire frame — so every handler that
    /// changes membership state calls this after committing locally.
    async fn broadcast<T: serde::Serialize>(&self, kind: hive_codec::MessageKind, payload: &T) {
        let value = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize outbound hive frame");
                return;
            }
        };
        let bytes = hive_codec::to_canonical_bytes(&value);
        let frame = hive_codec::encode_frame(kind.wire_id(), &bytes);
        let peers = match self.host.list_peers().await {
            Ok(peers) => peers,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list peers for broadcast");
                return;
            }
        };
        for peer in peers {
            if let Err(e) = self.host.send_custom_message(peer, frame.clone()).await {
                tracing::warn!(error = %e, peer = %peer, kind = kind.name(), "failed to broadcast hive frame");
            }
        }
    }
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "hive RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl HiveApiServer for RpcServer {
    async fn hive_status(&self) -> RpcResult<RpcHiveStatus> {
        let members = self
            .state
            .db
            .iter_members()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        let counts = RpcMemberCounts {
            total: members.len() as u64,
            admins: members.iter().filter(|m| m.tier == Tier::Admin).count() as u64,
            members: members.iter().filter(|m| m.tier == Tier::Member).count() as u64,
            neophytes: members.iter().filter(|m| m.tier == Tier::Neophyte).count() as u64,
        };

        let hive_id = self.state.hive_id.read().expect("hive_id lock poisoned").clone();
        Ok(RpcHiveStatus {
            hive_id: hive_id.map(|h| h.to_hex()),
            status: if hive_id_is_set(&self.state) { "ACTIVE".into() } else { "GENESIS_REQUIRED".into() },
            members: counts,
            state_hash: hex::encode(self.state.fleet_map.state_hash()),
            bridge_status: self.state.bridge_status.clone(),
            governance_mode: governance_mode_str(self.state.governance_mode),
        })
    }

    async fn hive_members(&self) -> RpcResult<Vec<RpcMemberRecord>> {
        let members = self
            .state
            .db
            .iter_members()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(members
            .into_iter()
            .map(|m| RpcMemberRecord {
                pubkey: m.pubkey.to_hex(),
                tier: tier_str(m.tier),
                joined_ts: m.joined_ts,
                probation_ends_ts: m.probation_ends_ts,
                contribution_ratio: m.contribution_ratio,
                uptime_fraction: m.uptime_fraction,
                banned: m.banned,
            })
            .collect())
    }

    async fn hive_genesis(&self) -> RpcResult<RpcGenesisResult> {
        let now = self.state.now();
        let hive_id = hive_membership::perform_genesis(&self.state.db, self.state.identity.pubkey(), now)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        *self.state.hive_id.write().expect("hive_id lock poisoned") = Some(hive_id);
        Ok(RpcGenesisResult {
            hive_id: hive_id.to_hex(),
        })
    }

    async fn hive_invite(&self, valid_hours: u32, requirements: u32) -> RpcResult<RpcInviteResult> {
        let now = self.state.now();
        let ticket = hive_membership::issue_ticket(
            &self.state.identity,
            valid_hours as i64 * 3600,
            requirements,
            now,
        );
        let ticket_json =
            serde_json::to_string(&ticket).map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(RpcInviteResult { ticket_json })
    }

    async fn hive_join(&self, ticket_json: String) -> RpcResult<RpcStatusOnly> {
        let ticket: hive_core::InvitationTicket =
            serde_json::from_str(&ticket_json).map_err(|e| rpc_err(-32602, format!("invalid ticket: {e}")))?;
        let now = self.state.now();
        hive_membership::join(&self.state.db, &ticket, self.state.identity.pubkey(), now, hive_core::DEFAULT_PROBATION_WINDOW_SECS)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;

        let member = self
            .state
            .db
            .get_member(&self.state.identity.pubkey())
            .map_err(|e| rpc_err(-32603, e.to_string()))?
            .ok_or_else(|| rpc_err(-32603, "member record missing immediately after join"))?;
        if let Some(hive_id) = *self.state.hive_id.read().expect("hive_id lock poisoned") {
            let welcome = hive_session::WelcomePayload {
                hive_id,
                member_snapshot: vec![member],
            };
            self.state
                .broadcast(hive_codec::MessageKind::HiveWelcome, &welcome)
                .await;
        }
        Ok(RpcStatusOnly { status: "joined".into() })
    }

    async fn hive_vouch(&self, target_pubkey: String) -> RpcResult<RpcStatusOnly> {
        let target = parse_pubkey(&target_pubkey)?;
        let now = self.state.now();
        let candidate = self
            .state
            .db
            .get_member(&target)
            .map_err(|e| rpc_err(-32603, e.to_string()))?
            .ok_or_else(|| rpc_err(-32602, "unknown candidate"))?;

        // Toxic-incident tracking and topological-uniqueness evidence live
        // outside this RPC surface; a real deployment wires them from the
        // contribution ledger and topology map before calling this method.
        hive_membership::evaluate_for_vouch(&candidate, 0, true)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;

        let mut vouch = Vouch {
            target_pubkey: target,
            voucher_pubkey: self.state.identity.pubkey(),
            issued_ts: now,
            voucher_sig: hive_core::HiveSignature([0u8; 64]),
        };
        vouch.voucher_sig = self
            .state
            .identity
            .sign(&hive_membership::promotion::vouch_signing_bytes(&vouch));
        hive_membership::record_vouch(&self.state.db, vouch.clone())
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        self.state
            .broadcast(hive_codec::MessageKind::HiveVouch, &vouch)
            .await;
        Ok(RpcStatusOnly { status: "vouched".into() })
    }

    async fn hive_request_promotion(&self, target_pubkey: String) -> RpcResult<RpcStatusOnly> {
        let target = parse_pubkey(&target_pubkey)?;
        let now = self.state.now();
        match hive_membership::finalize_promotion(&self.state.db, &target, now) {
            Ok(_) => {
                let announcement = hive_codec::PromotionAnnouncement { target_pubkey: target };
                self.state
                    .broadcast(hive_codec::MessageKind::HivePromotion, &announcement)
                    .await;
                Ok(RpcStatusOnly { status: "promoted".into() })
            }
            Err(hive_core::HiveError::PromotionBelowThreshold { have, need }) => Ok(RpcStatusOnly {
                status: format!("awaiting_quorum:{have}/{need}"),
            }),
            Err(e) => Err(rpc_err(-32000, e.to_string())),
        }
    }

    async fn hive_pending_actions(&self) -> RpcResult<Vec<RpcPendingAction>> {
        let actions = self
            .state
            .db
            .iter_pending_actions()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(actions
            .into_iter()
            .map(|a| RpcPendingAction {
                action_id: a.action_id,
                action_type: format!("{:?}", a.action_type),
                state: format!("{:?}", a.state),
                proposed_ts: a.proposed_ts,
                expires_ts: a.expires_ts,
            })
            .collect())
    }

    async fn hive_approve_action(&self, id: String) -> RpcResult<RpcStatusOnly> {
        hive_governance::approve(&self.state.db, &id, DecisionSource::Operator, None)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        Ok(RpcStatusOnly { status: "approved".into() })
    }

    async fn hive_reject_action(&self, id: String, reason: String) -> RpcResult<RpcStatusOnly> {
        hive_governance::reject(&self.state.db, &id, DecisionSource::Operator, Some(reason))
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        Ok(RpcStatusOnly { status: "rejected".into() })
    }

    async fn hive_topology(&self) -> RpcResult<Vec<RpcTopologyEntry>> {
        Ok(self
            .state
            .fleet_map
            .snapshot()
            .into_iter()
            .map(|e| RpcTopologyEntry {
                pubkey: e.pubkey.to_hex(),
                version: e.version,
                updated_ts: e.updated_ts,
                capacity_tier: capacity_tier_str(e.capacity_tier),
            })
            .collect())
    }

    async fn hive_contribution(&self, peer_id: Option<String>) -> RpcResult<Vec<RpcContributionEntry>> {
        let self_pubkey = self.state.identity.pubkey();
        let entries = if let Some(peer_id) = peer_id {
            let peer = parse_pubkey(&peer_id)?;
            self.state
                .db
                .get_contribution(&self_pubkey, &peer)
                .map_err(|e| rpc_err(-32603, e.to_string()))?
                .into_iter()
                .collect()
        } else {
            self.state
                .db
                .iter_contributions_for_peer(&self_pubkey)
                .map_err(|e| rpc_err(-32603, e.to_string()))?
        };
        Ok(entries
            .into_iter()
            .map(|c| RpcContributionEntry {
                peer_pubkey: c.peer_pubkey.to_hex(),
                sats_forwarded_to_peer_lifetime: c.sats_forwarded_to_peer_lifetime,
                sats_received_from_peer_lifetime: c.sats_received_from_peer_lifetime,
                reciprocity_balance: c.reciprocity_balance,
            })
            .collect())
    }

    async fn hive_intent_status(&self) -> RpcResult<Vec<RpcIntentStatus>> {
        let intents = self
            .state
            .db
            .iter_intents()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(intents
            .into_iter()
            .map(|i| RpcIntentStatus {
                intent_id: i.intent_id.to_string(),
                intent_type: format!("{:?}", i.intent_type),
                initiator_pubkey: i.initiator_pubkey.to_hex(),
                status: format!("{:?}", i.status),
                hold_deadline_ts: i.hold_deadline_ts,
            })
            .collect())
    }

    async fn hive_ban(&self, target: String, reason: String) -> RpcResult<RpcStatusOnly> {
        let target = parse_pubkey(&target)?;
        let now = self.state.now();
        let existing = self
            .state
            .db
            .get_ban(&target)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        let evidence_digest = [0u8; 32];
        if existing.is_none() {
            hive_membership::propose_ban(
                &self.state.db,
                target,
                reason.clone(),
                evidence_digest,
                self.state.identity.pubkey(),
            )
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        }
        let finalized = hive_membership::vote_ban(&self.state.db, &target, self.state.identity.pubkey(), now)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;

        let announcement = hive_codec::BanAnnouncement {
            target_pubkey: target,
            reason_code: reason,
            evidence_digest,
            proposer_pubkey: self.state.identity.pubkey(),
        };
        self.state
            .broadcast(hive_codec::MessageKind::HiveBan, &announcement)
            .await;
        Ok(RpcStatusOnly {
            status: if finalized { "banned".into() } else { "vote_recorded".into() },
        })
    }
}

fn hive_id_is_set(state: &RpcServerState) -> bool {
    state.hive_id.read().expect("hive_id lock poisoned").is_some()
}
