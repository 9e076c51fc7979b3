//! Storage backends for the persisted session credential.
//!
//! Provides an in-memory store for testing and a JSON settings file store for
//! production.

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::InMemorySessionStore;
