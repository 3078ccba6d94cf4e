pub mod ban;
pub mod caps;
pub mod contribution;
pub mod demote;
pub mod genesis;
pub mod invitation;
pub mod promotion;
pub mod uptime;

pub use ban::{propose_ban, vote_ban};
pub use caps::market_share_guard_blocks;
pub use contribution::{aggregate_ratio, apply_decay, record_forward, record_received};
pub use demote::demote;
pub use genesis::perform_genesis;
pub use invitation::{dunbar_cap_reached, issue_ticket, join};
pub use promotion::{evaluate_for_vouch, finalize_promotion, quorum_required, record_vouch};
pub use uptime::UptimeTracker;
