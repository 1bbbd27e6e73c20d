//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model shared by the worker and its ports
//! - Cache storage port with in-memory and SQLite backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, Partition};
pub use config::{AppConfig, ConfigError, StorageBackend};
pub use error::Error;
pub use http::{Destination, Request, RequestKey, Response};
