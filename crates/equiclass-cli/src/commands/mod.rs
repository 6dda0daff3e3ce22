//! CLI command handlers

pub mod catalog;
pub mod classify;
pub mod config;
pub mod history;
pub mod index;
pub mod mcp;
