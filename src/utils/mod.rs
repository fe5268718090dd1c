//! Utility functions shared across layers.
//!
//! - [`secrets`] - Session token generation and password hashing

pub mod secrets;
