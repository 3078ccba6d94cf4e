pub mod identity;
pub mod signable;

pub use identity::{domain_digest, verify, Identity};
pub use signable::Signable;
