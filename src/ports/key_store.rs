//! KeyStore trait - persistent, hardware-scoped storage of key pairs

use crate::model::{KeyGenerationAttributes, KeyQueryAttributes, OsStatus};

/// Capability to create, find and delete key items
///
/// Implementations are globally shared and internally synchronized; callers
/// hold no locks around them. Every call goes to the backing store, nothing
/// is cached in process.
pub trait KeyStore: Send + Sync {
    /// Opaque reference to a stored key (or one half of a pair).
    ///
    /// Dropping the handle releases it.
    type Handle: Send + 'static;

    /// Generate a new key pair inside the store
    ///
    /// # Returns
    ///
    /// A handle to the private half
    ///
    /// # Errors
    ///
    /// Returns the platform status if generation fails, for example
    /// [`OsStatus::DUPLICATE_ITEM`] when the tag is taken
    fn create(&self, attrs: &KeyGenerationAttributes) -> Result<Self::Handle, OsStatus>;

    /// Look up a key item; `Ok(None)` when nothing matches
    fn find(&self, query: &KeyQueryAttributes) -> Result<Option<Self::Handle>, OsStatus>;

    /// Remove the matching item; `Ok(false)` when nothing matched
    fn delete(&self, query: &KeyQueryAttributes) -> Result<bool, OsStatus>;

    /// Derive the public half of a key, `None` if it cannot be extracted
    fn copy_public(&self, handle: &Self::Handle) -> Option<Self::Handle>;

    /// Serialize a public key to its external representation
    fn export_public(&self, handle: &Self::Handle) -> Result<Vec<u8>, OsStatus>;
}
