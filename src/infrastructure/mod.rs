//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Latest-readings cache (Redis and no-op implementations)
//! - [`container`] - Selects and wires the repository backend
//! - [`persistence`] - In-memory and PostgreSQL repository implementations

pub mod cache;
pub mod container;
pub mod persistence;

pub use container::{Backend, Container};
