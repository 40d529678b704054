#![doc = include_str!("../README.md")]

pub mod client;
pub mod server;

pub use server::config::ServerConfig;
pub use server::lifecycle::{LogicalServer, ServerState};
