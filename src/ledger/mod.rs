pub mod client;
pub mod contract;
pub mod record;
pub mod simulator;
