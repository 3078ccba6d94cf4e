//! hive-node — the Hive coordinator binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the persistent state database
//!   2. Load the fleet state map from whatever peer state survived restart
//!   3. Replay in-flight intents (crash-safe restart rule)
//!   4. Bind a host adapter (mock unless a real one is wired in)
//!   5. Spawn the intent monitor tick and the gossip heartbeat tick
//!   6. Start the JSON-RPC 2.0 operator server
//!   7. Run until interrupted

mod dispatch;
mod governance_task;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hive_core::{
    CapacityTier, HiveId, PeerFlags, DEFAULT_PROBATION_WINDOW_SECS, DUNBAR_CAP,
    GOSSIP_HEARTBEAT_SECS, INTENT_MONITOR_INTERVAL_SECS, PROMOTION_QUORUM_MIN,
};
use hive_crypto::Identity;
use hive_governance::{GovernanceMode, SafetyBounds};
use hive_hostadapter::{HostAdapter, MockHostAdapter};
use hive_rpc::{RpcServer, RpcServerState};
use hive_state::{FleetStateMap, HiveStateDb};

use dispatch::NodeContext;

#[derive(Parser, Debug)]
#[command(
    name = "hive-node",
    version,
    about = "Hive fleet-coordination node for a federation of cooperating Lightning routing nodes"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.hive/data")]
    data_dir: PathBuf,

    /// Operator JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8846")]
    rpc_addr: SocketAddr,

    /// Governance mode: "advisor", "autonomous", or "oracle".
    #[arg(long, default_value = "advisor")]
    governance_mode: String,

    /// Autonomous mode: max channel opens per day.
    #[arg(long, default_value_t = 1)]
    max_channel_opens_per_day: u32,

    /// Autonomous mode: max sats moved per rebalance.
    #[arg(long, default_value_t = 1_000_000)]
    max_sats_per_rebalance: u64,

    /// Autonomous mode: max fee change per mille.
    #[arg(long, default_value_t = 50)]
    max_fee_change_permille: u32,

    /// Oracle mode: HTTP endpoint consulted for pending-action decisions.
    #[arg(long)]
    oracle_endpoint: Option<String>,

    /// Oracle mode: per-decision timeout in seconds.
    #[arg(long, default_value_t = hive_core::ORACLE_DEFAULT_TIMEOUT_SECS)]
    oracle_timeout_secs: u64,

    /// Path to a HiveConfig JSON file (optional overrides of protocol defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// 32-byte hex-encoded secret key for this node's identity. Omit for an
    /// ephemeral development identity (not reproducible across restarts).
    #[arg(long)]
    identity_secret: Option<String>,
}

/// Protocol-default overrides, loaded once at startup from an optional JSON
/// file (spec.md §6 persisted state layout; overrides never change at
/// runtime once the node is up).
#[derive(Clone, Debug, Serialize, Deserialize)]
struct HiveConfig {
    #[serde(default = "default_probation_window_secs")]
    probation_window_secs: i64,
    #[serde(default = "default_promotion_quorum_min")]
    promotion_quorum_min: usize,
    #[serde(default = "default_dunbar_cap")]
    dunbar_cap: usize,
}

fn default_probation_window_secs() -> i64 {
    DEFAULT_PROBATION_WINDOW_SECS
}
fn default_promotion_quorum_min() -> usize {
    PROMOTION_QUORUM_MIN
}
fn default_dunbar_cap() -> usize {
    DUNBAR_CAP
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            probation_window_secs: default_probation_window_secs(),
            promotion_quorum_min: default_promotion_quorum_min(),
            dunbar_cap: default_dunbar_cap(),
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<HiveConfig> {
    match path {
        Some(p) => {
            let json = std::fs::read_to_string(p)
                .with_context(|| format!("reading hive config from {}", p.display()))?;
            serde_json::from_str(&json).context("parsing hive config JSON")
        }
        None => Ok(HiveConfig::default()),
    }
}

fn parse_governance_mode(raw: &str) -> anyhow::Result<GovernanceMode> {
    match raw.to_ascii_lowercase().as_str() {
        "advisor" => Ok(GovernanceMode::Advisor),
        "autonomous" => Ok(GovernanceMode::Autonomous),
        "oracle" => Ok(GovernanceMode::Oracle),
        other => anyhow::bail!("unknown governance mode '{other}' (expected advisor|autonomous|oracle)"),
    }
}

fn load_or_generate_identity(secret_hex: Option<&str>) -> anyhow::Result<Identity> {
    match secret_hex {
        Some(hex_str) => {
            let bytes = hex::decode(hex_str).context("decoding --identity-secret as hex")?;
            let mut arr = [0u8; 32];
            if bytes.len() != 32 {
                anyhow::bail!("--identity-secret must decode to exactly 32 bytes");
            }
            arr.copy_from_slice(&bytes);
            Identity::from_secret_bytes(arr).map_err(|e| anyhow::anyhow!(e.to_string()))
        }
        None => {
            warn!("no --identity-secret provided; generating an ephemeral identity — DO NOT USE IN PRODUCTION");
            Ok(Identity::generate())
        }
    }
}

fn now_ts() -> hive_core::Timestamp {
    chrono::Utc::now().timestamp()
}

/// How often the trigger path polls the host for a threshold crossing,
/// independent of the much slower unconditional heartbeat.
const GOSSIP_TRIGGER_POLL_SECS: u64 = 5;

/// Builds this node's current [`hive_gossip::GossipTriggerState`] from its
/// live channel list, so the gossip task can compare it against the state
/// last broadcast and decide whether a threshold crossed (spec §4.7).
fn trigger_state(
    channels: &[hive_hostadapter::ChannelInfo],
    total_local_sats: u64,
    peak_sats: u64,
) -> hive_gossip::GossipTriggerState {
    let percent_of_peak = if peak_sats == 0 {
        0
    } else {
        (total_local_sats.saturating_mul(100) / peak_sats).min(100)
    };
    let band = hive_gossip::capacity_band(percent_of_peak);

    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for channel in channels {
        channel.fee_policy_fingerprint.hash(&mut hasher);
    }
    hive_gossip::GossipTriggerState {
        capacity_band: band,
        fee_policy_fingerprint_hash: hasher.finish(),
        flags: PeerFlags::default(),
    }
}

/// Persists `entry` into the local fleet map/database and broadcasts it to
/// every peer the host currently knows about.
async fn emit_gossip_entry(
    db: &HiveStateDb,
    fleet_map: &FleetStateMap,
    host: &dyn HostAdapter,
    entry: &hive_core::PeerStateEntry,
) {
    fleet_map.set_entry(entry.clone());
    if let Err(e) = db.upsert_peer_state(entry) {
        warn!(error = %e, "failed to persist self gossip entry");
    }
    let payload = hive_codec::to_canonical_bytes(
        &serde_json::to_value(entry).expect("peer state entry always serializes"),
    );
    let frame = hive_codec::encode_frame(hive_codec::MessageKind::HiveGossip.wire_id(), &payload);
    match host.list_peers().await {
        Ok(peers) => {
            for peer in peers {
                if let Err(e) = host.send_custom_message(peer, frame.clone()).await {
                    warn!(error = %e, peer = %peer, "failed to send gossip frame");
                }
            }
        }
        Err(e) => warn!(error = %e, "failed to list peers for gossip emission"),
    }
}

/// Crude capacity-tier estimate from total local channel balance. A real
/// deployment would source this from the host's actual network-share
/// calculation; this repo only needs something monotone in channel size.
fn estimate_capacity_tier(total_local_sats: u64) -> CapacityTier {
    match total_local_sats {
        0..=1_000_000 => CapacityTier::Small,
        1_000_001..=10_000_000 => CapacityTier::Medium,
        10_000_001..=100_000_000 => CapacityTier::Large,
        _ => CapacityTier::XLarge,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hive=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("Hive coordinator node starting");

    let config = load_config(args.config.as_deref())?;
    let governance_mode = parse_governance_mode(&args.governance_mode)?;

    // ── State database ───────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(HiveStateDb::open(&data_dir).context("opening state database")?);

    let hive_id = db
        .get_meta("genesis")
        .context("reading genesis marker")?
        .map(|bytes| {
            let mut arr = [0u8; 16];
            arr.copy_from_slice(&bytes[..16]);
            HiveId(arr)
        });
    if hive_id.is_some() {
        info!("existing hive found — skipping genesis");
    } else {
        info!("no genesis marker found — call the hive_genesis RPC to bootstrap this hive");
    }
    let hive_id = Arc::new(RwLock::new(hive_id));

    // ── Fleet state map ──────────────────────────────────────────────────────
    let fleet_map = Arc::new(FleetStateMap::load_from(
        db.iter_peer_state().context("loading persisted peer state")?,
    ));

    // ── Identity ─────────────────────────────────────────────────────────────
    let identity = Arc::new(load_or_generate_identity(args.identity_secret.as_deref())?);
    info!(pubkey = %identity.pubkey(), "node identity ready");

    // ── Intent replay (crash-safe restart rule) ─────────────────────────────
    hive_intent::replay_on_restart(&db, now_ts()).context("replaying in-flight intents")?;

    // ── Host adapter ─────────────────────────────────────────────────────────
    let host: Arc<dyn HostAdapter> = Arc::new(MockHostAdapter::new());

    // ── Inbound wire dispatch ────────────────────────────────────────────────
    // Every HIVE_* frame a peer's host delivers on the custom-message channel
    // comes in through here; without this, handshake/gossip/intent/membership
    // machinery never runs against a real peer, only against its own tests.
    let node_ctx = Arc::new(NodeContext::new(
        Arc::clone(&db),
        Arc::clone(&fleet_map),
        Arc::clone(&identity),
        Arc::clone(&host),
        Arc::clone(&hive_id),
    ));
    {
        let node_ctx = Arc::clone(&node_ctx);
        host.register_custom_message_handler(Box::new(move |peer, bytes| {
            node_ctx.handle_frame(peer, bytes, now_ts());
        }))
        .await
        .context("registering inbound hive message handler")?;
    }
    telemetry::register(Arc::clone(&host), Arc::clone(&db), identity.pubkey());

    // ── Governance safety bounds ─────────────────────────────────────────────
    let safety_bounds = SafetyBounds {
        max_channel_opens_per_day: args.max_channel_opens_per_day,
        max_sats_per_rebalance: args.max_sats_per_rebalance,
        max_fee_change_permille: args.max_fee_change_permille,
    };
    if matches!(governance_mode, GovernanceMode::Autonomous) {
        info!(?safety_bounds, "running in Autonomous governance mode");
    }
    if matches!(governance_mode, GovernanceMode::Oracle) && args.oracle_endpoint.is_none() {
        warn!("Oracle governance mode selected with no --oracle-endpoint; pending actions will never resolve");
    }

    info!(
        probation_window_secs = config.probation_window_secs,
        promotion_quorum_min = config.promotion_quorum_min,
        dunbar_cap = config.dunbar_cap,
        "effective protocol configuration"
    );

    // ── Intent monitor tick ──────────────────────────────────────────────────
    {
        let db = Arc::clone(&db);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(INTENT_MONITOR_INTERVAL_SECS));
            loop {
                interval.tick().await;
                if let Err(e) = hive_intent::run_monitor_tick(&db, now_ts()) {
                    warn!(error = %e, "intent monitor tick failed");
                }
            }
        });
    }

    // ── Gossip heartbeat + threshold-triggered emission ─────────────────────
    // Two clocks drive the same emit path: an unconditional heartbeat every
    // `GOSSIP_HEARTBEAT_SECS` that bypasses rate limiting entirely, and a
    // faster poll that only emits early when `should_emit` sees a capacity
    // band, fee-fingerprint, or flag change cross a threshold — and even
    // then only if the per-minute `RateWindow` still has room.
    {
        let db = Arc::clone(&db);
        let fleet_map = Arc::clone(&fleet_map);
        let host = Arc::clone(&host);
        let identity = Arc::clone(&identity);
        let self_pubkey = identity.pubkey();
        tokio::spawn(async move {
            let mut previous_version: hive_core::Version = fleet_map
                .get(&self_pubkey)
                .map(|e| e.version)
                .unwrap_or(0);
            let mut previous_trigger: Option<hive_gossip::GossipTriggerState> = None;
            let mut peak_sats: u64 = 0;
            let mut rate_window =
                hive_gossip::RateWindow::new(hive_core::RATE_GOSSIP_PER_MINUTE, 60, now_ts());
            let mut heartbeat_interval =
                tokio::time::interval(std::time::Duration::from_secs(GOSSIP_HEARTBEAT_SECS));
            let mut trigger_interval =
                tokio::time::interval(std::time::Duration::from_secs(GOSSIP_TRIGGER_POLL_SECS));

            loop {
                tokio::select! {
                    _ = heartbeat_interval.tick() => {
                        let channels = match host.list_channels().await {
                            Ok(channels) => channels,
                            Err(e) => {
                                warn!(error = %e, "failed to query host channel list for heartbeat");
                                continue;
                            }
                        };
                        let total_local_sats: u64 = channels.iter().map(|c| c.local_sats).sum();
                        peak_sats = peak_sats.max(total_local_sats);
                        previous_trigger = Some(trigger_state(&channels, total_local_sats, peak_sats));
                        let entry = hive_gossip::build_self_entry(
                            &identity,
                            previous_version,
                            estimate_capacity_tier(total_local_sats),
                            Vec::new(),
                            PeerFlags::default(),
                            now_ts(),
                        );
                        previous_version = entry.version;
                        emit_gossip_entry(&db, &fleet_map, host.as_ref(), &entry).await;
                        info!(version = previous_version, "gossip heartbeat emitted");
                    }
                    _ = trigger_interval.tick() => {
                        let channels = match host.list_channels().await {
                            Ok(channels) => channels,
                            Err(e) => {
                                warn!(error = %e, "failed to query host channel list for gossip trigger check");
                                continue;
                            }
                        };
                        let total_local_sats: u64 = channels.iter().map(|c| c.local_sats).sum();
                        peak_sats = peak_sats.max(total_local_sats);
                        let current = trigger_state(&channels, total_local_sats, peak_sats);
                        let crossed = previous_trigger
                            .map(|prev| hive_gossip::should_emit(&prev, &current))
                            .unwrap_or(false);
                        if !crossed {
                            previous_trigger = Some(current);
                            continue;
                        }
                        if !rate_window.try_consume(now_ts()) {
                            tracing::debug!("gossip trigger crossed a threshold but is rate-limited");
                            continue;
                        }
                        let entry = hive_gossip::build_self_entry(
                            &identity,
                            previous_version,
                            estimate_capacity_tier(total_local_sats),
                            Vec::new(),
                            PeerFlags::default(),
                            now_ts(),
                        );
                        previous_version = entry.version;
                        previous_trigger = Some(current);
                        emit_gossip_entry(&db, &fleet_map, host.as_ref(), &entry).await;
                        info!(version = previous_version, "gossip triggered emission");
                    }
                }
            }
        });
    }

    // ── Governance executor ──────────────────────────────────────────────────
    governance_task::spawn(
        Arc::clone(&db),
        Arc::clone(&host),
        governance_mode,
        safety_bounds.clone(),
        args.oracle_endpoint.clone(),
        args.oracle_timeout_secs,
    );

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        fleet_map: Arc::clone(&fleet_map),
        identity,
        hive_id,
        host,
        governance_mode,
        bridge_status: "ok".to_string(),
        clock: Box::new(now_ts),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(addr = %args.rpc_addr, "node ready");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received, flushing state database");
    db.flush().context("flushing state database on shutdown")?;
    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
