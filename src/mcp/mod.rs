//! JSON-RPC 2.0 (MCP-style) interface to the cataloger.
//!
//! One method table is shared by two front-ends: newline-delimited frames
//! over stdio, and envelopes POSTed over HTTP. Both answer `initialize`,
//! `shutdown`, `exit` and `catalog/create`.

/// Method table and dispatch.
pub mod dispatcher;

/// HTTP front-end.
pub mod http;

/// Stdio front-end.
pub mod server;

/// Method handlers and the capability descriptor.
pub mod tools;

/// JSON-RPC 2.0 envelope types.
pub mod transport;

pub use dispatcher::{Dispatch, MethodKind, MethodTable};
pub use http::HttpState;
pub use server::{StdioExit, StdioServer};
pub use tools::{default_method_table, get_tool_definitions, ToolDefinition};
pub use transport::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
