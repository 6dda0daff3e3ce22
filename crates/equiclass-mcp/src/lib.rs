//! Equiclass MCP Server
//!
//! Model Context Protocol server exposing golf ball classification to AI
//! assistants.

pub mod protocol;
mod server;
pub mod tools;

pub use server::{start_server, McpServer};
