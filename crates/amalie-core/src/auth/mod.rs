//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: the bearer token and the identity derived from its claims
//! - `TokenStore`: durable storage for the raw token (file, keychain, memory)
//!
//! The identity is never stored on its own; it is decoded from the token
//! each time it is read.

pub mod session;
pub mod store;

pub use session::{derive_identity, DecodeError, Identity, Session, SharedSession};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
