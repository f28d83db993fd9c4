//! Crypto Engine Adapter use case
//!
//! Checks the engine's capability for the configured scheme before every
//! operation and maps engine statuses to [`EnclaveError`].

use std::sync::Arc;

use tracing::debug;

use crate::error::{EnclaveError, EnclaveResult};
use crate::model::{EncryptedBlob, KeyOperation, PlaintextBlob, Scheme};
use crate::ports::CryptoEngine;

pub struct CryptoEngineAdapter<E> {
    engine: Arc<E>,
    scheme: Scheme,
}

impl<E> Clone for CryptoEngineAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            scheme: self.scheme,
        }
    }
}

impl<E> CryptoEngineAdapter<E> {
    pub fn new(engine: Arc<E>, scheme: Scheme) -> Self {
        Self { engine, scheme }
    }

    /// Encrypt `plaintext` to the public key `public`
    ///
    /// # Errors
    ///
    /// - `AlgorithmUnsupported` if the key cannot encrypt with the scheme
    /// - `Engine` for any engine failure
    pub fn encrypt<H>(&self, public: &H, plaintext: &PlaintextBlob) -> EnclaveResult<EncryptedBlob>
    where
        E: CryptoEngine<H>,
    {
        self.ensure_supported(public, KeyOperation::Encrypt)?;

        let ciphertext = self
            .engine
            .encrypt(public, self.scheme, plaintext.as_bytes())
            .map_err(|status| EnclaveError::from_engine_status(status, "encrypt"))?;
        debug!("Encrypted {} bytes into {}", plaintext.len(), ciphertext.len());

        EncryptedBlob::new(ciphertext).map_err(|_| EnclaveError::Engine {
            op: "encrypt",
            code: 0,
        })
    }

    /// Decrypt `ciphertext` with the private key `private`
    ///
    /// Authentication-related engine codes surface as
    /// `AuthenticationRejected`, everything else as `Engine`.
    pub fn decrypt<H>(&self, private: &H, ciphertext: &EncryptedBlob) -> EnclaveResult<PlaintextBlob>
    where
        E: CryptoEngine<H>,
    {
        self.ensure_supported(private, KeyOperation::Decrypt)?;

        self.engine
            .decrypt(private, self.scheme, ciphertext.as_bytes())
            .map(PlaintextBlob::from_engine)
            .map_err(|status| EnclaveError::from_engine_status(status, "decrypt"))
    }

    fn ensure_supported<H>(&self, handle: &H, op: KeyOperation) -> EnclaveResult<()>
    where
        E: CryptoEngine<H>,
    {
        if self.engine.supports(handle, op, self.scheme) {
            Ok(())
        } else {
            debug!("{:?} with {} not supported by key", op, self.scheme.name());
            Err(EnclaveError::AlgorithmUnsupported)
        }
    }
}
