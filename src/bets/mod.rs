pub mod classifier;
pub mod materializer;
pub mod odds;
