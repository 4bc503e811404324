//! Kubernetes MCP gateway library.
//!
//! Exposes the internal modules for testing and reuse.

pub mod auth;
pub mod config;
pub mod kube;
pub mod mcp;
pub mod port_forward;
pub mod server;
pub mod tools;

pub use config::Settings;
pub use server::{make_app, run_http_server, run_stdio_server, ServerState};
