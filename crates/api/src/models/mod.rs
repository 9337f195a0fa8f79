//! Domain models for the API server.
//!
//! These are the records held by storage and serialized on the wire.
//! Password hashes are deliberately absent from the account models: the
//! credential is write-only and only the auth service ever touches it.

pub mod account;
pub mod item;
pub mod order;

pub use account::{AdminAccount, UserAccount};
pub use item::{Item, NewItem};
pub use order::{NewOrder, Order};
