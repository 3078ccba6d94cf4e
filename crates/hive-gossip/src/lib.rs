pub mod anti_entropy;
pub mod gossip;
pub mod rate_window;
pub mod triggers;

pub use anti_entropy::{apply_full_sync, log_if_still_diverged, merge_winner};
pub use gossip::{build_self_entry, verify_entry};
pub use rate_window::RateWindow;
pub use triggers::{capacity_band, should_emit, GossipTriggerState};
