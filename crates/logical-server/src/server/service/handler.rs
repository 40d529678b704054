//! gRPC service implementation of `LogicalHandler`.
//!
//! [`LogicalService`] wires the two operations from [`logic`](super::logic)
//! onto the generated tonic trait.
//!
//! ## Responsibilities
//!
//! - Answer `Ping` inline so it never waits behind slow calls.
//! - Validate `Call` requests and run each on its own task through the
//!   [`CallPool`].
//! - Translate pool rejections and terminations into gRPC statuses, keeping
//!   them distinct from business failures (`status = false` replies).

use super::logic;
use crate::server::{
    pool::manager::CallPool,
    telemetry::{
        increment_business_failures, increment_call_errors, increment_calls, increment_pings,
        record_call_duration,
    },
};
use logical_core::{
    proto::{CallMessage, PingMessage, Reply, logical_handler_server::LogicalHandler},
    random::RandSource,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// The `LogicalHandler` gRPC service.
///
/// Cloning is cheap; clones share the random source and the call pool.
#[derive(Clone)]
pub struct LogicalService {
    rand: Arc<dyn RandSource>,
    pool: Arc<CallPool>,
}

impl LogicalService {
    /// Creates a service drawing `call` outcomes from `rand` and running calls
    /// on `pool`.
    pub fn new(rand: Arc<dyn RandSource>, pool: Arc<CallPool>) -> Self {
        Self { rand, pool }
    }

    /// The pool running this service's calls.
    pub fn pool(&self) -> &Arc<CallPool> {
        &self.pool
    }
}

#[tonic::async_trait]
impl LogicalHandler for LogicalService {
    /// Liveness probe. Always `Reply { status: true, message: "pong" }`.
    async fn ping(&self, _req: Request<PingMessage>) -> Result<Response<Reply>, Status> {
        increment_pings();
        tracing::debug!("Received ping");
        Ok(Response::new(logic::ping()))
    }

    /// Operates on `table`/`id`. Exactly one reply per accepted call; a
    /// rejected or terminated call yields a status error instead.
    #[tracing::instrument(
        skip_all,
        fields(table = %req.get_ref().table, id = %req.get_ref().id, operate = %req.get_ref().operate)
    )]
    async fn call(&self, req: Request<CallMessage>) -> Result<Response<Reply>, Status> {
        let start = std::time::Instant::now();
        increment_calls();

        let msg = req.into_inner();
        if let Err(e) = logic::validate(&msg) {
            increment_call_errors();
            tracing::warn!("Rejected call: {e}");
            return Err(e.into());
        }

        let rand = Arc::clone(&self.rand);
        let reply = self
            .pool
            .spawn(async move { logic::call(&msg, rand.as_ref()) })
            .await
            .inspect_err(|e| {
                increment_call_errors();
                tracing::warn!("Call ended without a reply: {e}");
            })?;

        if !reply.status {
            increment_business_failures();
        }
        record_call_duration(start.elapsed().as_secs_f64() * 1000.0);

        Ok(Response::new(reply))
    }
}
