pub mod aqi;
pub mod config;
pub mod metrics;
pub mod policy;
pub mod purpleair;
