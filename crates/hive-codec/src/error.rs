use thiserror::Error;

/// Codec-level errors. Deliberately distinct from `hive_core::HiveError` so
/// the codec never depends on higher-layer error semantics — a frame that
/// isn't ours is not a failure, just not our business.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame magic does not match; not a hive frame")]
    NotOurs,

    #[error("frame truncated: need at least {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    #[error("malformed canonical JSON payload: {0}")]
    BadJson(String),

    #[error("unknown message type: {0}")]
    UnknownType(u16),
}
