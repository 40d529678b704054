//! Task-per-call execution for `call` requests.
//!
//! - [`manager`] - [`CallPool`](manager::CallPool), which spawns, counts,
//!   drains and terminates call tasks.
//! - [`guard`] - RAII in-flight accounting for a single admitted call.

pub mod guard;
pub mod manager;
