//! Caller-facing surface
//!
//! [`SecureEnclave`] takes plain strings and byte slices, validates them,
//! and answers every request with a [`Pending`] that resolves exactly once.
//! Create, find, delete and encrypt complete before returning; decrypt
//! resolves after the user has answered the biometric prompt.

use std::sync::Arc;

use tracing::debug;

use crate::adapters::SoftwareKeychain;
use crate::completion::Pending;
use crate::config::EnclaveConfig;
use crate::coordinator::{CoordinatorStats, DecryptCoordinator, DecryptionRequest};
use crate::error::{EnclaveError, EnclaveResult};
use crate::model::{EncryptedBlob, KeyTag, PlaintextBlob, PromptMessage, PublicKeyBytes};
use crate::ports::{Authenticator, CryptoEngine, KeyStore};
use crate::use_cases::{CryptoEngineAdapter, KeyStoreAdapter};

pub struct SecureEnclave<S, E, A> {
    keys: KeyStoreAdapter<S>,
    engine: CryptoEngineAdapter<E>,
    authenticator: Arc<A>,
    coordinator: DecryptCoordinator,
}

impl<A> SecureEnclave<SoftwareKeychain, SoftwareKeychain, A>
where
    A: Authenticator + 'static,
{
    /// Enclave backed by the software keychain, which serves as both key
    /// store and crypto engine.
    pub fn software(
        keychain: SoftwareKeychain,
        authenticator: A,
        config: EnclaveConfig,
    ) -> EnclaveResult<Self> {
        let keychain = Arc::new(keychain);
        Self::new(Arc::clone(&keychain), keychain, Arc::new(authenticator), config)
    }
}

impl<S, E, A> SecureEnclave<S, E, A>
where
    S: KeyStore + 'static,
    E: CryptoEngine<S::Handle> + 'static,
    A: Authenticator + 'static,
{
    pub fn new(
        store: Arc<S>,
        engine: Arc<E>,
        authenticator: Arc<A>,
        config: EnclaveConfig,
    ) -> EnclaveResult<Self> {
        let keys = KeyStoreAdapter::new(store, &config);
        let engine = CryptoEngineAdapter::new(engine, config.scheme);
        let coordinator = DecryptCoordinator::spawn(
            keys.clone(),
            engine.clone(),
            Arc::clone(&authenticator),
            &config,
        )?;

        Ok(Self {
            keys,
            engine,
            authenticator,
            coordinator,
        })
    }

    /// Whether biometric authentication is available. Asked fresh each time.
    pub fn is_supported(&self) -> bool {
        self.authenticator.is_supported()
    }

    /// Generate a key pair under `tag` and return its public key
    pub fn create_key_pair(&self, tag: &str) -> Pending<PublicKeyBytes> {
        Pending::ready(self.checked_tag(tag).and_then(|tag| self.keys.create_key_pair(&tag)))
    }

    /// Public key of the pair under `tag`, `None` if there is none
    pub fn find_key_pair(&self, tag: &str) -> Pending<Option<PublicKeyBytes>> {
        Pending::ready(self.checked_tag(tag).and_then(|tag| self.keys.find_key_pair(&tag)))
    }

    /// `true` if a pair was removed, `false` if there was none
    pub fn delete_key_pair(&self, tag: &str) -> Pending<bool> {
        Pending::ready(self.checked_tag(tag).and_then(|tag| self.keys.delete_key_pair(&tag)))
    }

    /// Encrypt `data` to the public key of the pair under `tag`.
    ///
    /// No prompt is shown; only decryption needs the user.
    pub fn encrypt(&self, tag: &str, data: &[u8]) -> Pending<EncryptedBlob> {
        let encrypted = self.checked_tag(tag).and_then(|tag| {
            let plaintext = PlaintextBlob::new(data.to_vec())?;
            let public = self.keys.public_key(&tag)?;
            self.engine.encrypt(&public, &plaintext)
        });
        Pending::ready(encrypted)
    }

    /// Decrypt `data` with the private key under `tag` after the user
    /// confirms `prompt`.
    ///
    /// The key is not looked up until the prompt is approved, so a
    /// rejection resolves with `AuthenticationRejected` without touching
    /// the key store.
    pub fn decrypt(&self, tag: &str, data: &[u8], prompt: &str) -> Pending<PlaintextBlob> {
        let request = self.checked_tag(tag).and_then(|tag| {
            Ok(DecryptionRequest {
                tag,
                ciphertext: EncryptedBlob::new(data.to_vec())?,
                prompt: prompt.parse::<PromptMessage>()?,
            })
        });

        match request {
            Ok(request) => self.coordinator.submit(request),
            Err(e) => Pending::ready(Err(e)),
        }
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    fn checked_tag(&self, tag: &str) -> EnclaveResult<KeyTag> {
        if !self.is_supported() {
            debug!("Biometric authentication unavailable");
            return Err(EnclaveError::NotSupported);
        }
        Ok(tag.parse::<KeyTag>()?)
    }
}
