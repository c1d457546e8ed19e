pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

// Application ports and the use cases built on them
pub mod app;
// Adapters implementing the ports
pub mod infra;
