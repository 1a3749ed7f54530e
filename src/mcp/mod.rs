//! MCP protocol layer: wire types shared by connectors and the agent side.

pub mod types;

pub use types::{CallToolResult, Content, Tool};
