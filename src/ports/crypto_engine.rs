//! CryptoEngine trait - scheme-selected encrypt/decrypt on key handles

use zeroize::Zeroizing;

use crate::model::{KeyOperation, OsStatus, Scheme};

/// Capability to encrypt and decrypt with keys of handle type `H`
///
/// Callers must ask [`CryptoEngine::supports`] before running an
/// operation instead of relying on the operation to report an
/// unsupported combination.
pub trait CryptoEngine<H>: Send + Sync {
    /// Whether `handle` can perform `op` under `scheme`
    fn supports(&self, handle: &H, op: KeyOperation, scheme: Scheme) -> bool;

    /// Encrypt `plaintext` to the public key behind `handle`
    fn encrypt(&self, handle: &H, scheme: Scheme, plaintext: &[u8]) -> Result<Vec<u8>, OsStatus>;

    /// Decrypt `ciphertext` with the private key behind `handle`
    ///
    /// # Errors
    ///
    /// Returns a status for which
    /// [`OsStatus::is_authentication_not_granted`] holds when the key
    /// requires a user authentication that was not granted
    fn decrypt(
        &self,
        handle: &H,
        scheme: Scheme,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, OsStatus>;
}
