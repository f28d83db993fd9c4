//! Key Store Adapter use case
//!
//! Turns tag-level requests (create, find, delete) into key store queries
//! and maps platform statuses to [`EnclaveError`]. Every call goes to the
//! store; handles are dropped before returning.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EnclaveConfig;
use crate::error::{EnclaveError, EnclaveResult};
use crate::model::{
    KeyClass, KeyGenerationAttributes, KeyQueryAttributes, KeyTag, OsStatus, PublicKeyBytes,
    TokenScope,
};
use crate::ports::KeyStore;

pub struct KeyStoreAdapter<S> {
    store: Arc<S>,
    token: TokenScope,
    key_size_bits: u32,
}

impl<S> Clone for KeyStoreAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            token: self.token,
            key_size_bits: self.key_size_bits,
        }
    }
}

impl<S: KeyStore> KeyStoreAdapter<S> {
    pub fn new(store: Arc<S>, config: &EnclaveConfig) -> Self {
        Self {
            store,
            token: config.token,
            key_size_bits: config.key_size_bits,
        }
    }

    /// Query for the private half of `tag` in the configured token
    pub fn query(&self, tag: &KeyTag) -> KeyQueryAttributes {
        KeyQueryAttributes::private_key(tag.clone(), self.token)
    }

    /// Generate a new key pair under `tag` and return its public key
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `tag` is taken
    /// - `BadParameter` / `Store` for any other store failure
    pub fn create_key_pair(&self, tag: &KeyTag) -> EnclaveResult<PublicKeyBytes> {
        if self.lookup(&self.query(tag), "find_key")?.is_some() {
            debug!("Key pair {} already exists", tag);
            return Err(EnclaveError::AlreadyExists);
        }

        let attrs = KeyGenerationAttributes::new(tag.clone(), self.token, self.key_size_bits);
        debug!("Creating key pair {} in {}", tag, self.token.as_str());

        let private = self
            .store
            .create(&attrs)
            .map_err(|status| EnclaveError::from_store_status(status, "create_key"))?;
        let public = self.export(&private)?;

        info!("Created key pair {}", tag);
        Ok(public)
    }

    /// Public key of the pair tagged `tag`, or `None` when absent
    pub fn find_key_pair(&self, tag: &KeyTag) -> EnclaveResult<Option<PublicKeyBytes>> {
        match self.lookup(&self.query(tag), "find_key")? {
            Some(private) => self.export(&private).map(Some),
            None => Ok(None),
        }
    }

    /// Remove the pair tagged `tag`; `false` when there was nothing to remove
    ///
    /// In keychain scope the public item is removed too. Failing to remove
    /// it is logged and does not fail the call, since the private half is
    /// already gone by then.
    pub fn delete_key_pair(&self, tag: &KeyTag) -> EnclaveResult<bool> {
        let query = self.query(tag);
        let removed = self.remove(&query)?;

        if self.token == TokenScope::Keychain {
            if let Err(err) = self.remove(&query.with_class(KeyClass::Public)) {
                warn!("Public key of {} was left behind: {}", tag, err);
            }
        }

        if removed {
            info!("Deleted key pair {}", tag);
        } else {
            debug!("Nothing to delete for {}", tag);
        }
        Ok(removed)
    }

    /// Private key handle for `query`; absence is an error here
    pub fn private_key(&self, query: &KeyQueryAttributes) -> EnclaveResult<S::Handle> {
        self.lookup(query, "find_key")?.ok_or(EnclaveError::NotFound)
    }

    /// Public key handle derived from the private item tagged `tag`
    pub fn public_key(&self, tag: &KeyTag) -> EnclaveResult<S::Handle> {
        let private = self.private_key(&self.query(tag))?;
        self.copy_public(&private)
    }

    fn lookup(
        &self,
        query: &KeyQueryAttributes,
        op: &'static str,
    ) -> EnclaveResult<Option<S::Handle>> {
        match self.store.find(query) {
            Ok(handle) => Ok(handle),
            Err(OsStatus::ITEM_NOT_FOUND) => Ok(None),
            Err(status) => Err(EnclaveError::from_store_status(status, op)),
        }
    }

    fn remove(&self, query: &KeyQueryAttributes) -> EnclaveResult<bool> {
        match self.store.delete(query) {
            Ok(removed) => Ok(removed),
            Err(OsStatus::ITEM_NOT_FOUND) => Ok(false),
            Err(status) => Err(EnclaveError::from_store_status(status, "delete_key")),
        }
    }

    /// The store gives no status when the public half cannot be derived
    fn copy_public(&self, private: &S::Handle) -> EnclaveResult<S::Handle> {
        self.store.copy_public(private).ok_or(EnclaveError::Store {
            op: "copy_public_key",
            code: OsStatus::SUCCESS.code(),
        })
    }

    fn export(&self, private: &S::Handle) -> EnclaveResult<PublicKeyBytes> {
        let public = self.copy_public(private)?;
        let bytes = self
            .store
            .export_public(&public)
            .map_err(|status| EnclaveError::from_store_status(status, "export_public_key"))?;
        Ok(PublicKeyBytes::new(bytes))
    }
}
