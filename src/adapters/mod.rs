//! Adapters - concrete implementations of ports (traits)

mod software_keychain;
mod terminal_authenticator;

#[cfg(any(test, feature = "test-util"))]
pub mod fake_platform;

// Re-export for convenience
pub use software_keychain::{SoftwareKey, SoftwareKeychain, P256_KEY_SIZE_BITS};
pub use terminal_authenticator::TerminalAuthenticator;
