//! Ports (traits) for the platform collaborators
//!
//! The core depends on these abstractions, never on a concrete key store,
//! crypto engine or authenticator. They speak in raw platform terms
//! (status codes, byte buffers, opaque handles); translating that into the
//! crate's error taxonomy is the job of the adapters in `use_cases`.

mod authenticator;
mod crypto_engine;
mod key_store;


pub use authenticator::{Authenticator, OutcomeCallback};
pub use crypto_engine::CryptoEngine;
pub use key_store::KeyStore;
