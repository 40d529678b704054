//! Shared types and error definitions used by the `LogicalHandler` server and
//! its clients.
//!
//! ## Submodules
//!
//! - [`error`] - Centralized service error type and its gRPC status mapping.
//! - [`random`] - Injectable random sources for the `call` decision.
//! - [`types`] - Wire constants shared by server and client.
//! - [`proto`] - Generated Protobuf service and message definitions.

pub mod error;
pub mod random;
pub mod types;

pub use error::{Error, Result};

/// gRPC service and message definitions generated from `proto/logical.proto`.
///
/// ## Service
///
/// - `LogicalHandler.Ping` - liveness probe, always `Reply { status: true, message: "pong" }`.
/// - `LogicalHandler.Call` - operate on a named table/record.
///
/// ## Messages
///
/// - [`PingMessage`](proto::PingMessage) - empty probe payload.
/// - [`CallMessage`](proto::CallMessage) - `table`, `id`, `operate`.
/// - [`Reply`](proto::Reply) - `status`, `message`.
pub mod proto {
    tonic::include_proto!("logical");

    /// Encoded descriptor set for gRPC server reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("logical_descriptor");

    impl Reply {
        /// The liveness probe answer.
        pub fn pong() -> Self {
            Self {
                status: true,
                message: crate::types::PONG.to_string(),
            }
        }

        /// A successful `call` outcome.
        pub fn success() -> Self {
            Self {
                status: true,
                message: crate::types::SUCCESS.to_string(),
            }
        }

        /// A business failure carrying the sampled value that caused it.
        ///
        /// This is a delivered reply, not a transport error.
        pub fn failure(sample: u32) -> Self {
            Self {
                status: false,
                message: format!("{}{sample}", crate::types::FAILURE_PREFIX),
            }
        }
    }
}
