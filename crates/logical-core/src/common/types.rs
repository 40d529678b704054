//! Wire constants shared by the server and its clients.
//!
//! The reply messages are part of the contract: health checks match on
//! [`PONG`], and callers tell business failures apart by [`FAILURE_PREFIX`].

use core::ops::RangeInclusive;

/// Default listening address (IPv6 wildcard).
pub const DEFAULT_LISTEN_ADDR: &str = "[::]:50049";

/// Default endpoint used by the probe client.
pub const DEFAULT_ENDPOINT: &str = "http://[::1]:50049";

/// Message of every `ping` reply.
pub const PONG: &str = "pong";

/// Message of a successful `call` reply.
pub const SUCCESS: &str = "success";

/// Prefix of a failed `call` reply; followed by the sampled integer.
pub const FAILURE_PREFIX: &str = "failure: ";

/// Range the `call` decision samples from.
pub const DRAW_RANGE: RangeInclusive<u32> = 1..=10;

/// Samples strictly greater than this produce a business failure.
pub const FAILURE_THRESHOLD: u32 = 8;
