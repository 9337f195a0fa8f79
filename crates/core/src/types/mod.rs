//! Core types for Minimart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod status;
pub mod username;

pub use id::*;
pub use status::OrderStatus;
pub use username::{Username, UsernameError};
