use clap::Parser;
use logical_core::random::ThreadRandom;
use logical_server::server::{
    config::{CliArgs, ServerConfig},
    lifecycle::LogicalServer,
    signal::termination_token,
    telemetry::init_telemetry,
};
use std::sync::Arc;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.log_json)?;

    let server = LogicalServer::new(config, Arc::new(ThreadRandom));
    // A bind failure ends the process here; serving never begins.
    server.start().await?;

    let res = server.serve_forever(termination_token()).await;
    providers.shutdown();
    res?;

    tracing::info!("Service shut down successfully");
    Ok(())
}
