//! Error types for the `LogicalHandler` service.
//!
//! This module defines the central `Error` enum for everything that can go
//! wrong around a call: binding the listener, validating a request, admitting
//! it into the call pool, and shutting down. It implements `From<Error>` for
//! `tonic::Status` so handler code can return it with `?`.
//!
//! A negative `Reply` from `call` is a business failure, not an error, and is
//! never represented here.
//!
//! ## Error Cases
//! - `Bind`: The listening address is malformed or already in use.
//! - `AlreadyStarted`: `start` was invoked on a server that left `UNSTARTED`.
//! - `NotStarted`: `serve_forever` was invoked before a successful `start`.
//! - `InvalidRequest`: The client request was missing a required field.
//! - `Overloaded`: The configured concurrency bound was reached.
//! - `ServiceShutdown`: A call arrived while the service was shutting down.
//! - `CallTerminated`: An in-flight call was killed after the grace period.
//! - `CallPanicked`: A call task panicked before producing a reply.
//! - `Transport`: The serve loop failed with an unrecoverable transport error.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the `LogicalHandler` service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Listening address unavailable or invalid. Fatal to startup.
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// The server has already been started once.
    #[error("Server already started")]
    AlreadyStarted,

    /// The server has not been started.
    #[error("Server not started")]
    NotStarted,

    /// The client request was invalid.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Too many calls are in flight.
    #[error("Concurrency limit of {limit} calls reached")]
    Overloaded { limit: usize },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// The call outlived the shutdown grace period and was terminated.
    #[error("Call terminated during shutdown")]
    CallTerminated,

    /// The task running the call panicked.
    #[error("Call task failed: {context}")]
    CallPanicked { context: String },

    /// Connection-level failure of the serve loop.
    #[error("Transport error: {context}")]
    Transport { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Bind { .. } | Error::AlreadyStarted | Error::NotStarted => {
                Status::failed_precondition(message)
            }
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::Overloaded { .. } => Status::resource_exhausted(message),
            Error::ServiceShutdown => Status::unavailable(message),
            Error::CallTerminated => Status::aborted(message),
            Error::CallPanicked { .. } | Error::Transport { .. } => Status::internal(message),
        }
    }
}
