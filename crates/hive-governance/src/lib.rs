pub mod audit;
pub mod bounds;
pub mod mode;
pub mod oracle;
pub mod queue;

pub use audit::{AuditChain, AuditRecord};
pub use bounds::{check_bounds, day_bucket, AutonomousUsage};
pub use mode::{GovernanceMode, SafetyBounds};
pub use oracle::{HttpOracleClient, OracleBackoff, OracleClient, OracleVerdict};
pub use queue::{approve, begin_execution, enqueue, expire_if_due, finish_execution, reject};
