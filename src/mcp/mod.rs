//! MCP (Model Context Protocol) server module.
//!
//! Re-exposes the catalog's read API as five callable tools for
//! AI-assistant integration. The server speaks JSON-RPC 2.0 either over
//! stdio (one request in flight per connection) or over HTTP
//! (`POST /mcp`, plus an unauthenticated `GET /health` reporting
//! upstream-API reachability).
//!
//! Tools:
//! - `search_lands`          — filtered land listing
//! - `get_land_details`      — single land by id
//! - `search_communities`    — filtered community listing
//! - `get_community_details` — single community by id
//! - `get_api_stats`         — total land/community counts

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use client::{ApiClient, UpstreamOutcome};
pub use server::McpServer;
