pub mod actor;
pub mod reporter;
