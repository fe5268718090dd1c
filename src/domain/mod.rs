//! Domain layer containing business entities and logic.
//!
//! Defines entities, paging primitives, repository interfaces and the reading
//! event consumed by the ingestion worker. Nothing here depends on the
//! infrastructure or presentation layers.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`pagination`] - Page requests, page metadata and station filters
//! - [`repositories`] - Data access trait definitions
//! - [`reading_event`] - Reading queued for asynchronous ingestion
//!
//! # Ingestion Flow
//!
//! 1. `POST /api/measurements` validates the payload
//! 2. A [`reading_event::ReadingEvent`] is pushed to a bounded channel
//! 3. [`crate::application::reading_worker::run_reading_worker`] records it
//!    with retry, updating the station and evaluating alert thresholds

pub mod entities;
pub mod pagination;
pub mod reading_event;
pub mod repositories;
