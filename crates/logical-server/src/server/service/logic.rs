//! Request-in/reply-out logic of the two `LogicalHandler` operations.
//!
//! Nothing here performs I/O or keeps state between invocations. The `call`
//! outcome is a stand-in for a real table-operation dispatcher: one uniform
//! draw from [`DRAW_RANGE`] decides between success and a business failure.

use logical_core::{
    Error,
    proto::{CallMessage, Reply},
    random::RandSource,
    types::{DRAW_RANGE, FAILURE_THRESHOLD},
};

/// Answers the liveness probe. Never fails.
pub fn ping() -> Reply {
    Reply::pong()
}

/// Checks the fields `call` requires. `operate` is opaque and may be empty.
pub fn validate(msg: &CallMessage) -> Result<(), Error> {
    if msg.table.trim().is_empty() {
        return Err(Error::InvalidRequest {
            reason: "table must not be empty".to_string(),
        });
    }
    if msg.id.trim().is_empty() {
        return Err(Error::InvalidRequest {
            reason: "id must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Logs the request triple and decides its outcome from one draw of `rand`.
pub fn call(msg: &CallMessage, rand: &dyn RandSource) -> Reply {
    tracing::info!(
        table = %msg.table,
        id = %msg.id,
        operate = %msg.operate,
        "Received call"
    );

    let sample = rand.rand_range(DRAW_RANGE);
    if sample > FAILURE_THRESHOLD {
        tracing::warn!(sample, "Call failed");
        Reply::failure(sample)
    } else {
        Reply::success()
    }
}
