use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use logical_core::types::DEFAULT_LISTEN_ADDR;

/// Runtime configuration for the `logical-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. No
/// configuration file is read.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "logical-server",
    version,
    about = "A gRPC LogicalHandler service with a liveness probe and a table/record call"
)]
pub struct CliArgs {
    /// Address to listen on, as `host:port`. `[::]` listens on every IPv6 and
    /// (on dual-stack hosts) IPv4 interface.
    ///
    /// Environment variable: `LISTEN_ADDR`
    #[arg(long, env = "LISTEN_ADDR", default_value_t = String::from(DEFAULT_LISTEN_ADDR))]
    pub listen_addr: String,

    /// Seconds in-flight calls may take to finish once shutdown begins. Calls
    /// still running afterwards are terminated and their callers receive an
    /// `ABORTED` status.
    ///
    /// Environment variable: `GRACE_PERIOD_SECS`
    #[arg(long, env = "GRACE_PERIOD_SECS", default_value_t = 10)]
    pub grace_period_secs: u64,

    /// Upper bound on concurrently running calls. Unset means unbounded.
    /// Calls beyond the bound are rejected with `RESOURCE_EXHAUSTED`, not
    /// queued. `ping` is never counted.
    ///
    /// Environment variable: `MAX_CONCURRENT_CALLS`
    #[arg(long, env = "MAX_CONCURRENT_CALLS")]
    pub max_concurrent_calls: Option<usize>,

    /// Emit logs as JSON lines instead of the pretty console format.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub grace_period: Duration,
    pub max_concurrent_calls: Option<usize>,
    pub log_json: bool,
}

impl ServerConfig {
    /// Default configuration listening on `listen_addr`.
    pub fn with_listen_addr(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            grace_period: Duration::from_secs(10),
            max_concurrent_calls: None,
            log_json: false,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let listen_addr = args.listen_addr.trim().to_string();
        if listen_addr.is_empty() {
            bail!("LISTEN_ADDR must not be empty");
        }

        if args.max_concurrent_calls == Some(0) {
            bail!("MAX_CONCURRENT_CALLS must be greater than 0 when set");
        }

        Ok(Self {
            listen_addr,
            grace_period: Duration::from_secs(args.grace_period_secs),
            max_concurrent_calls: args.max_concurrent_calls,
            log_json: args.log_json,
        })
    }
}
