pub mod adapter;
pub mod mock;

pub use adapter::{ChannelInfo, CloseUrgency, HostAdapter, HostEvent};
pub use mock::MockHostAdapter;
