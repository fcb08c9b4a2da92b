pub mod configuration;
pub mod forklift;
