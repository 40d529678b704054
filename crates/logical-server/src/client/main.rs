use clap::{Parser, Subcommand};
use core::time::Duration;
use logical_core::{proto::CallMessage, types::DEFAULT_ENDPOINT};
use logical_server::client::{call_upstream, ping_upstream};
use tracing_subscriber::EnvFilter;

/// Command-line probe for a `LogicalHandler` server.
#[derive(Parser, Debug)]
#[command(name = "logical-client", version, about = "Probe a LogicalHandler gRPC server")]
struct ClientArgs {
    /// Server endpoint.
    ///
    /// Environment variable: `LOGICAL_ENDPOINT`
    #[arg(long, env = "LOGICAL_ENDPOINT", default_value_t = String::from(DEFAULT_ENDPOINT))]
    endpoint: String,

    /// Connect and request timeout in seconds.
    #[arg(long, env = "LOGICAL_TIMEOUT_SECS", default_value_t = 3)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a liveness probe; exits non-zero unless the server answers `pong`.
    Ping,
    /// Send one table/record operation.
    Call {
        #[arg(long)]
        table: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        operate: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let args = ClientArgs::parse();
    let timeout = Duration::from_secs(args.timeout_secs);

    let reply = match args.command {
        Command::Ping => ping_upstream(&args.endpoint, timeout).await?,
        Command::Call { table, id, operate } => {
            call_upstream(&args.endpoint, timeout, CallMessage { table, id, operate }).await?
        }
    };

    println!("status={} message={}", reply.status, reply.message);
    if !reply.status {
        std::process::exit(2);
    }
    Ok(())
}
