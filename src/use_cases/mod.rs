//! Use cases (orchestration)
//!
//! The Key Store Adapter and Crypto Engine Adapter sit between the caller
//! surface and the ports. They speak in tags, blobs and [`EnclaveError`]s.
//!
//! [`EnclaveError`]: crate::EnclaveError

mod crypto_engine_adapter;
mod key_store_adapter;

pub use crypto_engine_adapter::CryptoEngineAdapter;
pub use key_store_adapter::KeyStoreAdapter;
