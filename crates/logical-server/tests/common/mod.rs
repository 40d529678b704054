#![allow(dead_code)]

use core::ops::RangeInclusive;
use core::time::Duration;
use logical_core::{
    proto::{CallMessage, logical_handler_client::LogicalHandlerClient},
    random::RandSource,
};
use logical_server::{LogicalServer, ServerConfig, client::connect};
use std::sync::Arc;
use tonic::transport::Channel;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Blocks the calling thread for a fixed time before answering.
pub struct SlowRand {
    pub delay: Duration,
    pub value: u32,
}

impl RandSource for SlowRand {
    fn rand_range(&self, range: RangeInclusive<u32>) -> u32 {
        std::thread::sleep(self.delay);
        self.value.clamp(*range.start(), *range.end())
    }
}

pub fn loopback_config() -> ServerConfig {
    ServerConfig {
        grace_period: Duration::from_secs(5),
        ..ServerConfig::with_listen_addr("127.0.0.1:0")
    }
}

/// Starts a server on an ephemeral loopback port and returns it with its
/// endpoint URL.
pub async fn start_server(config: ServerConfig, rand: impl RandSource + 'static) -> (LogicalServer, String) {
    let server = LogicalServer::new(config, Arc::new(rand));
    let addr = server.start().await.unwrap();
    (server, format!("http://{addr}"))
}

pub async fn client(endpoint: &str) -> LogicalHandlerClient<Channel> {
    connect(endpoint, TIMEOUT).await.unwrap()
}

pub fn users_update() -> CallMessage {
    CallMessage {
        table: "users".to_string(),
        id: "42".to_string(),
        operate: "update".to_string(),
    }
}
