pub mod constants;
pub mod error;
pub mod model;
pub mod types;

pub use constants::*;
pub use error::HiveError;
pub use model::*;
pub use types::*;
