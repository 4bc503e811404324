//! Model Context Protocol core: wire types, tool registry, and the
//! transport-agnostic dispatcher.

pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;

pub use context::ToolContext;
pub use handler::{handle_message, ChannelMode};
pub use protocol::{McpError, McpRequest, McpResponse, RequestId};
pub use registry::{ToolBuilder, ToolRegistry};
