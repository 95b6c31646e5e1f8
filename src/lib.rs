//! Library exports for nightly-exporter, shared between the binary and tests.

pub mod backend;
pub mod config;
pub mod metrics;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
