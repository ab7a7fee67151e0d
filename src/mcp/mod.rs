//! MCP (Model Context Protocol) server surface
//!
//! # Module Layout
//!
//! - `types`   -- JSON-RPC primitives and the tools subset of the MCP wire types
//! - `catalog` -- the tools advertised by `tools/list`
//! - `handler` -- JSON-RPC dispatch for the `/mcp` endpoint

pub mod catalog;
pub mod handler;
pub mod types;

pub use catalog::ToolCatalog;
pub use handler::McpHandler;
