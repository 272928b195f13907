pub mod cache;
pub mod client;
pub mod football_data;
pub mod simulator;
