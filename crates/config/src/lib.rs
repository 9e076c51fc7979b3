//! Configuration loading for the usagemon server.
//!
//! Uses figment to merge built-in defaults, an optional YAML or JSON file,
//! and the `PORT` / `CLAUDE_SESSION_COOKIE` environment variables.

pub mod schema;

pub use schema::{Config, LogConfig, UpstreamConfig};
