//! HTTP server for the tournament bracket engine.
//!
//! - [`api`]: REST routes for participants, matches and brackets
//! - [`config`]: environment and CLI configuration
//! - [`logging`]: tracing subscriber setup and structured log helpers
//! - [`metrics`]: Prometheus counters and the scrape handle

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
