//! Process lifecycle of the `LogicalHandler` server.
//!
//! [`LogicalServer`] owns the listener, the tonic serve loop and the call pool,
//! and moves through `UNSTARTED → LISTENING → STOPPING → STOPPED`:
//!
//! - [`start`](LogicalServer::start) binds and spawns the serve loop.
//! - [`serve_forever`](LogicalServer::serve_forever) waits for a termination
//!   token or a fatal transport error, then stops.
//! - [`stop`](LogicalServer::stop) refuses new calls, drains in-flight calls
//!   for up to a grace period, terminates the rest and joins the serve loop.
//!
//! Termination is a [`CancellationToken`], so the shutdown path can be driven
//! from tests without sending process signals.

use crate::server::{
    config::ServerConfig, pool::manager::CallPool, service::handler::LogicalService,
};
use core::time::Duration;
use logical_core::{
    Error,
    proto::{FILE_DESCRIPTOR_SET, logical_handler_server::LogicalHandlerServer},
    random::RandSource,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle, time::timeout};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;

/// How long `stop` waits for the serve loop to exit after the pool is done.
const SERVE_JOIN_TIMEOUT: Duration = Duration::from_secs(3);

/// How the serve loop ended. Shared with the task running it.
#[derive(Debug)]
struct ServeExit {
    done: CancellationToken,
    error: Mutex<Option<String>>,
}

impl ServeExit {
    fn new() -> Self {
        Self {
            done: CancellationToken::new(),
            error: Mutex::new(None),
        }
    }

    fn finish(&self) {
        self.done.cancel();
    }

    /// Records a fatal serve-loop error and marks the loop finished.
    fn fail(&self, context: impl ToString) {
        *self.error.lock() = Some(context.to_string());
        self.done.cancel();
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}

/// Lifecycle state of a [`LogicalServer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    Unstarted,
    Listening,
    Stopping,
    Stopped,
}

/// A `LogicalHandler` gRPC server and its lifecycle.
pub struct LogicalServer {
    config: ServerConfig,
    service: LogicalService,
    state: watch::Sender<ServerState>,
    started: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
    health: Mutex<Option<HealthReporter>>,
    accept_shutdown: CancellationToken,
    serve_exit: Arc<ServeExit>,
    serve_task: Mutex<Option<JoinHandle<()>>>,
}

impl LogicalServer {
    /// Creates an unstarted server whose `call` outcomes are drawn from `rand`.
    pub fn new(config: ServerConfig, rand: Arc<dyn RandSource>) -> Self {
        let pool = Arc::new(CallPool::new(config.max_concurrent_calls));
        let (state, _) = watch::channel(ServerState::Unstarted);

        Self {
            service: LogicalService::new(rand, pool),
            config,
            state,
            started: AtomicBool::new(false),
            local_addr: Mutex::new(None),
            health: Mutex::new(None),
            accept_shutdown: CancellationToken::new(),
            serve_exit: Arc::new(ServeExit::new()),
            serve_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// The bound address, once `start` has succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// The pool running this server's calls.
    pub fn pool(&self) -> &Arc<CallPool> {
        self.service.pool()
    }

    /// Binds the configured address and starts accepting calls.
    ///
    /// Returns once the bind is confirmed; the serve loop runs on its own
    /// task. The returned address is the one actually bound, which differs from
    /// the configured one when port `0` was requested.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] on a second invocation.
    /// - [`Error::Bind`] if the address is malformed or unavailable.
    /// - [`Error::ServiceShutdown`] if `stop` ran first.
    pub async fn start(&self) -> Result<SocketAddr, Error> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyStarted);
        }

        let (listener, local_addr) = match self.bind().await {
            Ok(bound) => bound,
            Err(e) => {
                tracing::error!("{e}");
                self.serve_exit.finish();
                return Err(e);
            }
        };

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<LogicalHandlerServer<LogicalService>>()
            .await;

        let reflection = match Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()
        {
            Ok(reflection) => reflection,
            Err(e) => {
                self.serve_exit.finish();
                return Err(Error::Transport {
                    context: format!("reflection service: {e}"),
                });
            }
        };

        let router = Server::builder()
            .http2_adaptive_window(Some(true))
            .add_service(health_service)
            .add_service(reflection)
            .add_service(build_logical_service(self.service.clone()));

        let incoming = TcpListenerStream::new(listener);
        let accept_shutdown = self.accept_shutdown.clone();
        let serve_exit = Arc::clone(&self.serve_exit);

        let task = tokio::spawn(async move {
            match router
                .serve_with_incoming_shutdown(incoming, accept_shutdown.cancelled_owned())
                .await
            {
                Ok(()) => serve_exit.finish(),
                Err(e) => {
                    tracing::error!("Serve loop failed: {e}");
                    serve_exit.fail(e);
                }
            }
        });

        *self.serve_task.lock() = Some(task);
        *self.health.lock() = Some(health_reporter);
        *self.local_addr.lock() = Some(local_addr);

        let mut listening = false;
        self.state.send_if_modified(|state| {
            if *state == ServerState::Unstarted {
                *state = ServerState::Listening;
                listening = true;
            }
            listening
        });
        if !listening {
            // `stop` already cancelled the accept token; the serve loop exits
            // on its own.
            return Err(Error::ServiceShutdown);
        }

        log_startup_info(local_addr, &self.config);
        Ok(local_addr)
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr), Error> {
        let addr = self.config.listen_addr.as_str();
        let bind_error = |e: std::io::Error| Error::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        Ok((listener, local_addr))
    }

    /// Blocks until `termination` is cancelled or the serve loop dies, then
    /// stops the server with the configured grace period.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStarted`] if `start` has not succeeded.
    /// - [`Error::Transport`] if the serve loop failed.
    pub async fn serve_forever(&self, termination: CancellationToken) -> Result<(), Error> {
        if self.state() == ServerState::Unstarted {
            return Err(Error::NotStarted);
        }

        tokio::select! {
            () = termination.cancelled() => {
                tracing::info!("Termination requested");
            },
            () = self.serve_exit.done.cancelled() => {
                tracing::debug!("Serve loop exited");
            },
        }

        self.stop(self.config.grace_period).await?;

        match self.serve_exit.take_error() {
            Some(context) => Err(Error::Transport { context }),
            None => Ok(()),
        }
    }

    /// Gracefully stops the server.
    ///
    /// New calls are refused immediately. In-flight calls get up to `grace` to
    /// finish; any still running afterwards are terminated and their callers
    /// see an `ABORTED` status. Idempotent: later or concurrent invocations
    /// wait for `STOPPED` and return `Ok`.
    pub async fn stop(&self, grace: Duration) -> Result<(), Error> {
        let mut initiated = false;
        self.state.send_if_modified(|state| {
            if matches!(*state, ServerState::Unstarted | ServerState::Listening) {
                *state = ServerState::Stopping;
                initiated = true;
            }
            initiated
        });

        if !initiated {
            let mut rx = self.state.subscribe();
            let _ = rx.wait_for(|state| *state == ServerState::Stopped).await;
            return Ok(());
        }

        // === Phase 0: Stop accepting new calls ===
        tracing::info!("Shutdown initiated, refusing new calls");
        let health = self.health.lock().clone();
        if let Some(health) = health {
            health
                .set_not_serving::<LogicalHandlerServer<LogicalService>>()
                .await;
        }

        let pool = self.pool();
        pool.close();
        self.accept_shutdown.cancel();

        // === Phase 1: Drain in-flight calls within the grace period ===
        tracing::info!("Draining in-flight calls ({} active)", pool.inflight());
        if pool.drain(grace).await {
            tracing::debug!("All in-flight calls drained");
        } else {
            tracing::warn!(
                "Grace period of {grace:?} elapsed ({} calls still active), terminating",
                pool.inflight()
            );
        }

        // === Phase 2: Terminate whatever is left ===
        pool.terminate();

        // === Phase 3: Join the serve loop ===
        if !self.started.load(Ordering::Acquire) {
            // Never served; release anyone waiting in `serve_forever`.
            self.serve_exit.finish();
        } else if timeout(SERVE_JOIN_TIMEOUT, self.serve_exit.done.cancelled())
            .await
            .is_err()
        {
            tracing::warn!("Serve loop did not exit within {SERVE_JOIN_TIMEOUT:?}, aborting");
            if let Some(task) = self.serve_task.lock().take() {
                task.abort();
            }
        }

        self.state.send_replace(ServerState::Stopped);
        tracing::info!("Service shut down");
        Ok(())
    }
}

impl Drop for LogicalServer {
    fn drop(&mut self) {
        self.accept_shutdown.cancel();
        self.pool().close();
        self.pool().terminate();
    }
}

fn log_startup_info(addr: SocketAddr, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting LogicalHandler service on {} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!(
            "Starting LogicalHandler service on {} (max concurrent calls: {:?}, grace period: {:?})",
            addr,
            config.max_concurrent_calls,
            config.grace_period
        );
    }
}

fn build_logical_service(service: LogicalService) -> LogicalHandlerServer<LogicalService> {
    LogicalHandlerServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
