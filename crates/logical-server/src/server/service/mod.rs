//! The `LogicalHandler` gRPC service.
//!
//! ## Structure
//!
//! - [`logic`] - Stateless request-in/reply-out logic of `ping` and `call`.
//! - [`handler`] - gRPC service entry point (`LogicalService`).

pub mod handler;
pub mod logic;
