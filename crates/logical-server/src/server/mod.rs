//! Server-side components of the `LogicalHandler` service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration.
//! - [`lifecycle`] - Bind, serve, health reporting and graceful shutdown.
//! - [`pool`] - Task-per-call execution with drain and termination.
//! - [`service`] - The gRPC service and its request logic.
//! - [`signal`] - OS termination signals as a cancellation token.
//! - [`telemetry`] - Logging and optional OpenTelemetry export.

pub mod config;
pub mod lifecycle;
pub mod pool;
pub mod service;
pub mod signal;
pub mod telemetry;
