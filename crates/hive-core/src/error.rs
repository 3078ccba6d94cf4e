use thiserror::Error;

/// Error taxonomy shared across every `hive-*` crate.
///
/// Propagation policy: wire-boundary errors are contained locally (frame
/// dropped, peer error counter incremented); operator RPC errors are
/// returned verbatim; host-boundary errors are retried; database-boundary
/// errors are fatal.
#[derive(Debug, Error)]
pub enum HiveError {
    // ── Config ───────────────────────────────────────────────────────────────
    #[error("config error: {0}")]
    ConfigError(String),

    // ── Protocol (wire/session boundary) ────────────────────────────────────
    #[error("invalid signature")]
    InvalidSignature,

    #[error("sequence regression: last seen {last_seen}, got {got}")]
    SequenceRegression { last_seen: u64, got: u64 },

    #[error("timestamp out of window: now={now}, frame_ts={frame_ts}")]
    TimestampOutOfWindow { now: i64, frame_ts: i64 },

    #[error("unknown message type: {0}")]
    UnknownMessageType(u16),

    #[error("peer session not active: {0}")]
    SessionNotActive(String),

    #[error("handshake step timed out")]
    HandshakeTimeout,

    #[error("invitation ticket invalid: {0}")]
    InvalidTicket(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    // ── Consensus ────────────────────────────────────────────────────────────
    #[error("vouch rejected: voucher {voucher} is not an existing Member")]
    VouchFromNonMember { voucher: String },

    #[error("promotion below threshold: have {have}, need {need}")]
    PromotionBelowThreshold { have: usize, need: usize },

    #[error("genesis already performed for this hive")]
    DuplicateGenesis,

    #[error("consensus error: {0}")]
    ConsensusError(String),

    // ── Conflict (intent lock) ───────────────────────────────────────────────
    #[error("intent already pending for this (initiator, scope)")]
    AlreadyPending,

    #[error("conflict resolved by tie-break: {0}")]
    ConflictError(String),

    // ── Host boundary ────────────────────────────────────────────────────────
    #[error("host adapter unavailable: {0}")]
    HostUnavailable(String),

    // ── Governance bounds ────────────────────────────────────────────────────
    #[error("autonomous safety bounds exceeded: {reason}")]
    BoundsExceeded { reason: String },

    // ── Staleness ────────────────────────────────────────────────────────────
    #[error("stale data: version {got} does not exceed current {current}")]
    StaleData { current: u64, got: u64 },

    // ── Storage ──────────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity error: {0}")]
    IntegrityError(String),

    // ── General ──────────────────────────────────────────────────────────────
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}
