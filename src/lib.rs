//! Biometric-gated key management on a secure element
//!
//! P-256 key pairs are created in the secure element (or a software
//! stand-in) under an application tag. Anyone may encrypt to a key; every
//! decryption first requires the user to pass a biometric prompt.
//!
//! ```no_run
//! use enclave_keys::{EnclaveConfig, SecureEnclave, SoftwareKeychain, TerminalAuthenticator};
//!
//! # fn main() -> enclave_keys::EnclaveResult<()> {
//! let enclave = SecureEnclave::software(
//!     SoftwareKeychain::in_memory(),
//!     TerminalAuthenticator::new(),
//!     EnclaveConfig::default(),
//! )?;
//!
//! enclave.create_key_pair("t1").wait()?;
//! let ciphertext = enclave.encrypt("t1", b"hello").wait()?;
//! let plaintext = enclave
//!     .decrypt("t1", ciphertext.as_bytes(), "Unlock your secret")
//!     .wait()?;
//! assert_eq!(plaintext.as_bytes(), b"hello");
//! # Ok(())
//! # }
//! ```

mod adapters;
pub mod api;
mod completion;
pub mod config;
pub mod coordinator;
pub mod error;
mod logic;
pub mod model;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use error::{DomainError, EnclaveError, EnclaveResult};

// Re-export public API
pub use adapters::{SoftwareKey, SoftwareKeychain, TerminalAuthenticator};
#[cfg(any(test, feature = "test-util"))]
pub use adapters::fake_platform;
pub use api::SecureEnclave;
pub use completion::Pending;
pub use config::{EnclaveConfig, SameTagPolicy};
pub use coordinator::{CoordinatorStats, DecryptState};
