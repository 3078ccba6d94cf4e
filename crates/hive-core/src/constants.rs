//! ─── Hive Protocol Constants ─────────────────────────────────────────────
//!
//! Defaults are overridable per-hive via `HiveConfig`; the values here are
//! what a fresh node uses absent an override.

// ── Identity / signing ────────────────────────────────────────────────────

/// Domain-separation prefix hashed in front of every signed payload.
pub const SIGNING_DOMAIN_PREFIX: &[u8] = b"HIVE/v1/";

// ── Wire codec ────────────────────────────────────────────────────────────

/// 4-byte frame magic, ASCII "HIVE".
pub const FRAME_MAGIC: [u8; 4] = [0x48, 0x49, 0x56, 0x45];

/// Lowest odd message-type id in the hive's reserved range.
pub const MSG_TYPE_RANGE_START: u16 = 32_769;
/// Highest message-type id in the hive's reserved range.
pub const MSG_TYPE_RANGE_END: u16 = 33_000;

// ── Membership ────────────────────────────────────────────────────────────

/// Default probation window for a freshly joined Neophyte (seconds).
pub const DEFAULT_PROBATION_WINDOW_SECS: i64 = 30 * 24 * 3600;

/// Minimum absolute vouch quorum regardless of fleet size.
pub const PROMOTION_QUORUM_MIN: usize = 3;

/// Fraction of current Members required to vouch (numerator over 100).
pub const PROMOTION_QUORUM_FRACTION_PERCENT: u64 = 51;

/// Required rolling uptime fraction (permille) over the probation window.
pub const PROMOTION_MIN_UPTIME_PERMILLE: u32 = 995;

/// Required contribution ratio (forwarded / consumed) strictly greater than this.
pub const PROMOTION_MIN_CONTRIBUTION_RATIO: f64 = 1.0;

/// Dunbar cap: maximum members in a single hive.
pub const DUNBAR_CAP: usize = 50;

/// Market-share guard threshold (percent of a peer's network capacity).
pub const MARKET_SHARE_GUARD_PERCENT: u64 = 20;

// ── Fleet state / gossip ──────────────────────────────────────────────────

/// Capacity bucket band width, in percent, used for threshold-gossip triggers.
pub const CAPACITY_BAND_PERCENT: u64 = 10;

/// Forced heartbeat gossip interval (seconds).
pub const GOSSIP_HEARTBEAT_SECS: u64 = 300;

/// Anti-entropy full-sync timeout per peer (seconds).
pub const ANTI_ENTROPY_SYNC_TIMEOUT_SECS: u64 = 30;

// ── Replay / sequence guard ───────────────────────────────────────────────

/// Maximum allowed clock skew between frame timestamp and local time (seconds).
pub const REPLAY_WINDOW_SECS: i64 = 300;

/// Per-step handshake timeout (seconds).
pub const HANDSHAKE_STEP_TIMEOUT_SECS: u64 = 10;

/// Peer protocol-error threshold before disconnect.
pub const PEER_ERROR_DISCONNECT_THRESHOLD: u32 = 10;

/// Rolling window over which protocol errors are counted (seconds).
pub const PEER_ERROR_WINDOW_SECS: i64 = 60;

// ── Intent lock ───────────────────────────────────────────────────────────

/// Hold window before an uncontested intent commits (seconds).
pub const INTENT_HOLD_WINDOW_SECS: i64 = 60;

/// Monitor loop tick (seconds).
pub const INTENT_MONITOR_INTERVAL_SECS: u64 = 5;

/// Age after which a terminal-status intent row is purged (seconds).
pub const INTENT_PURGE_AGE_SECS: i64 = 3600;

// ── Governance ────────────────────────────────────────────────────────────

/// Default oracle decision timeout (seconds).
pub const ORACLE_DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Cap on oracle retry back-off (seconds).
pub const ORACLE_BACKOFF_CAP_SECS: u64 = 300;

// ── Backpressure / rate limiting ──────────────────────────────────────────

/// General gossip: 1 message per sender per minute (heartbeat exempted).
pub const RATE_GOSSIP_PER_MINUTE: u32 = 1;
/// Opportunity signals per hour.
pub const RATE_OPPORTUNITY_PER_HOUR: u32 = 10;
/// Task requests per hour.
pub const RATE_TASK_PER_HOUR: u32 = 20;
/// Strategy proposals per day.
pub const RATE_STRATEGY_PER_DAY: u32 = 5;
/// Alerts per hour.
pub const RATE_ALERT_PER_HOUR: u32 = 10;

// ── Contribution ledger ───────────────────────────────────────────────────

/// Reciprocity balance decay applied per 30-day window (permille, 500 = 50%).
pub const RECIPROCITY_DECAY_PERMILLE: u32 = 500;
pub const RECIPROCITY_DECAY_WINDOW_SECS: i64 = 30 * 24 * 3600;
