//! Probe client for a `LogicalHandler` upstream.
//!
//! Producers use [`ping_upstream`] as a startup health check before sending
//! any work, and [`call_upstream`] to submit a single table/record operation.

use anyhow::{Context, bail};
use core::time::Duration;
use logical_core::proto::{
    CallMessage, PingMessage, Reply, logical_handler_client::LogicalHandlerClient,
};
use tonic::transport::{Channel, Endpoint};

/// Connects to `endpoint` (e.g. `http://[::1]:50049`), bounding both the
/// connect and every request by `timeout`.
pub async fn connect(endpoint: &str, timeout: Duration) -> anyhow::Result<LogicalHandlerClient<Channel>> {
    let channel = Endpoint::from_shared(endpoint.to_string())
        .with_context(|| format!("invalid endpoint `{endpoint}`"))?
        .connect_timeout(timeout)
        .timeout(timeout)
        .connect()
        .await
        .with_context(|| format!("failed to connect to `{endpoint}`"))?;
    Ok(LogicalHandlerClient::new(channel))
}

/// Pings `endpoint` and fails unless a `status = true` reply arrives within
/// `timeout`.
pub async fn ping_upstream(endpoint: &str, timeout: Duration) -> anyhow::Result<Reply> {
    let mut client = connect(endpoint, timeout).await?;
    let reply = client
        .ping(PingMessage {})
        .await
        .with_context(|| format!("upstream health check failed: {endpoint}"))?
        .into_inner();
    if !reply.status {
        bail!("upstream health check failed: {endpoint} answered `{}`", reply.message);
    }
    Ok(reply)
}

/// Sends one `call` to `endpoint` and returns the reply, business failures
/// included. Only transport-level failures are errors.
pub async fn call_upstream(
    endpoint: &str,
    timeout: Duration,
    msg: CallMessage,
) -> anyhow::Result<Reply> {
    let mut client = connect(endpoint, timeout).await?;
    let reply = client
        .call(msg)
        .await
        .with_context(|| format!("call to `{endpoint}` failed"))?
        .into_inner();
    Ok(reply)
}
