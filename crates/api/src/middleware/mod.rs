//! HTTP middleware for the API server.
//!
//! The only middleware beyond request tracing is bearer-token auth,
//! implemented as extractors so protected handlers simply take
//! [`auth::UserAuth`] / [`auth::AdminAuth`] as an argument.

pub mod auth;

pub use auth::{AdminAuth, AuthRejection, UserAuth};
