//! File cataloging service.
//!
//! Walks a directory tree and writes a tab-separated inventory of every file
//! in it. The cataloger is exposed through three front-ends: JSON-RPC over
//! stdio, JSON-RPC over HTTP, and a one-line plain TCP protocol.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod tcp;
pub mod types;
