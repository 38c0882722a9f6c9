pub mod config;
pub mod creature;
pub mod effectiveness;
pub mod ranking;
pub mod stats;
pub mod types;
