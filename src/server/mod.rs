//! Transports: stateless streamable HTTP and the persistent stdio channel.

pub mod http;
pub mod logging;
pub mod state;
pub mod stdio;

pub use http::{make_app, run_http_server};
pub use state::ServerState;
pub use stdio::run_stdio_server;
