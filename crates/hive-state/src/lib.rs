pub mod db;
pub mod fleet_map;

pub use db::HiveStateDb;
pub use fleet_map::FleetStateMap;
