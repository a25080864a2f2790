pub mod asset;
pub mod delegations;
pub mod error;
pub mod hive;
pub mod operations;
pub mod stats;
