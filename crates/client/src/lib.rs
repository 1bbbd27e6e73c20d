//! Client code for swcache.
//!
//! This crate provides the network port the worker fetches through, its
//! reqwest-backed implementation, and URL helpers for origin checks.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize, same_origin};
