//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization; query strings
//! go through `serde_with` and request bodies that carry free-form input are
//! checked with `validator`.

pub mod activity;
pub mod alert;
pub mod auth;
pub mod health;
pub mod measurement;
pub mod normalize;
pub mod pagination;
pub mod report;
pub mod station;
pub mod user;
