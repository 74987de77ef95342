pub mod auth;
pub mod bigquery;
pub mod conf;
pub mod core;
pub mod orchestrator;
pub mod plan;
pub mod sheet;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
