//! Cache-related MCP tools.
//!
//! Read-only views of the worker's cache storage.

pub mod inspect;

pub use inspect::{CacheInspectParams, inspect_impl};
