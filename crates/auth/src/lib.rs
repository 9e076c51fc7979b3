//! Session credential lifecycle.
//!
//! The [`SessionManager`] owns the single in-memory session cookie and keeps
//! it in step with the persisted record of a [`SessionStore`].
//!
//! [`SessionStore`]: usagemon_types::SessionStore

pub mod manager;

pub use manager::SessionManager;
