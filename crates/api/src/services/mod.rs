//! Business logic services for the API server.
//!
//! # Services
//!
//! - `auth` - Credential store (Argon2id) plus token issuing/verification
//! - `cart` - Cart mutation, checkout, and order history

pub mod auth;
pub mod cart;

pub use auth::{AuthError, AuthService, TokenIssuer};
pub use cart::{CartError, CartService};
