//! Software implementation of the key store and crypto engine
//!
//! Stands in for the secure element on machines without one (CI, Linux,
//! development). Key material is held in memory or in a directory with one
//! hex-encoded file per item. The directory is re-read on every call so
//! several processes see each other's changes.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::logic::ecies;
use crate::model::{
    KeyClass, KeyGenerationAttributes, KeyOperation, KeyQueryAttributes, KeyTag, KeyType,
    OsStatus, Scheme, TokenScope,
};
use crate::ports::{CryptoEngine, KeyStore};

/// Only 256-bit EC keys exist in the secure element
pub const P256_KEY_SIZE_BITS: u32 = 256;

/// Handle to a key held by [`SoftwareKeychain`]
#[derive(Clone)]
pub struct SoftwareKey {
    material: KeyMaterial,
}

#[derive(Clone)]
enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

impl SoftwareKey {
    fn private(secret: SecretKey) -> Self {
        Self {
            material: KeyMaterial::Private(secret),
        }
    }

    fn public(public: PublicKey) -> Self {
        Self {
            material: KeyMaterial::Public(public),
        }
    }

    pub fn class(&self) -> KeyClass {
        match self.material {
            KeyMaterial::Private(_) => KeyClass::Private,
            KeyMaterial::Public(_) => KeyClass::Public,
        }
    }
}

impl fmt::Debug for SoftwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.material {
            KeyMaterial::Private(_) => write!(f, "SoftwareKey(private, [REDACTED])"),
            KeyMaterial::Public(public) => {
                let point = public.to_encoded_point(false);
                write!(f, "SoftwareKey(public, {}..)", hex::encode(&point.as_bytes()[..8]))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ItemId {
    token: TokenScope,
    class: KeyClass,
    tag: KeyTag,
}

impl ItemId {
    fn new(token: TokenScope, class: KeyClass, tag: KeyTag) -> Self {
        Self { token, class, tag }
    }

    fn from_query(query: &KeyQueryAttributes) -> Self {
        Self::new(query.token, query.class, query.tag.clone())
    }

    fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.key",
            self.token.as_str(),
            self.class.as_str(),
            self.tag.to_hex()
        )
    }
}

enum Backend {
    Memory(Mutex<HashMap<ItemId, Zeroizing<Vec<u8>>>>),
    Directory(PathBuf),
}

/// In-process secure element emulation
pub struct SoftwareKeychain {
    backend: Backend,
}

impl SoftwareKeychain {
    /// Keychain that lives as long as the value does
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    /// Keychain persisted under `dir`, created if missing
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Software keychain opened at {}", dir.display());
        Ok(Self {
            backend: Backend::Directory(dir),
        })
    }

    fn insert(&self, id: &ItemId, bytes: &[u8]) -> Result<(), OsStatus> {
        match &self.backend {
            Backend::Memory(items) => {
                let mut items = items.lock().unwrap_or_else(PoisonError::into_inner);
                if items.contains_key(id) {
                    return Err(OsStatus::DUPLICATE_ITEM);
                }
                items.insert(id.clone(), Zeroizing::new(bytes.to_vec()));
                Ok(())
            }
            Backend::Directory(dir) => {
                write_new_file(&dir.join(id.file_name()), bytes).map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => OsStatus::DUPLICATE_ITEM,
                    _ => io_status(e, "write"),
                })
            }
        }
    }

    fn read(&self, id: &ItemId) -> Result<Option<Zeroizing<Vec<u8>>>, OsStatus> {
        match &self.backend {
            Backend::Memory(items) => {
                let items = items.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(items.get(id).cloned())
            }
            Backend::Directory(dir) => match fs::read_to_string(dir.join(id.file_name())) {
                Ok(encoded) => {
                    let encoded = Zeroizing::new(encoded);
                    hex::decode(encoded.trim())
                        .map(|bytes| Some(Zeroizing::new(bytes)))
                        .map_err(|_| OsStatus::DECODE)
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_status(e, "read")),
            },
        }
    }

    fn remove(&self, id: &ItemId) -> Result<bool, OsStatus> {
        match &self.backend {
            Backend::Memory(items) => {
                let mut items = items.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(items.remove(id).is_some())
            }
            Backend::Directory(dir) => match fs::remove_file(dir.join(id.file_name())) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(io_status(e, "remove")),
            },
        }
    }
}

impl fmt::Debug for SoftwareKeychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Backend::Memory(_) => write!(f, "SoftwareKeychain(memory)"),
            Backend::Directory(dir) => write!(f, "SoftwareKeychain({})", dir.display()),
        }
    }
}

fn write_new_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    let written = file
        .write_all(hex::encode(bytes).as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);
    discard_on_error(path, written)
}

/// A half-written item would shadow its tag, so it goes away with the error
fn discard_on_error(path: &Path, written: io::Result<()>) -> io::Result<()> {
    if written.is_err() {
        if let Err(err) = fs::remove_file(path) {
            warn!("Could not remove partial item {}: {}", path.display(), err);
        }
    }
    written
}

fn io_status(err: io::Error, what: &str) -> OsStatus {
    warn!("Software keychain {} failed: {}", what, err);
    OsStatus::INTERNAL
}

impl KeyStore for SoftwareKeychain {
    type Handle = SoftwareKey;

    fn create(&self, attrs: &KeyGenerationAttributes) -> Result<SoftwareKey, OsStatus> {
        if attrs.key_type != KeyType::Ec || attrs.size_bits != P256_KEY_SIZE_BITS {
            return Err(OsStatus::PARAM);
        }

        let secret = SecretKey::random(&mut OsRng);
        if !attrs.permanent {
            return Ok(SoftwareKey::private(secret));
        }

        let private_id = ItemId::new(attrs.token, KeyClass::Private, attrs.tag.clone());
        self.insert(&private_id, &secret.to_bytes())?;

        if attrs.store_public {
            let public = secret.public_key().to_encoded_point(false);
            let public_id = ItemId::new(attrs.token, KeyClass::Public, attrs.tag.clone());
            if let Err(status) = self.insert(&public_id, public.as_bytes()) {
                self.remove(&private_id)?;
                return Err(status);
            }
        }

        info!(
            "Generated P-256 key pair {} in {}",
            attrs.tag,
            attrs.token.as_str()
        );
        Ok(SoftwareKey::private(secret))
    }

    fn find(&self, query: &KeyQueryAttributes) -> Result<Option<SoftwareKey>, OsStatus> {
        let id = ItemId::from_query(query);
        let Some(bytes) = self.read(&id)? else {
            debug!("No {} key for {}", query.class.as_str(), query.tag);
            return Ok(None);
        };

        let key = match query.class {
            KeyClass::Private => SecretKey::from_slice(&bytes)
                .map(SoftwareKey::private)
                .map_err(|_| OsStatus::DECODE)?,
            KeyClass::Public => PublicKey::from_sec1_bytes(&bytes)
                .map(SoftwareKey::public)
                .map_err(|_| OsStatus::DECODE)?,
        };
        Ok(Some(key))
    }

    fn delete(&self, query: &KeyQueryAttributes) -> Result<bool, OsStatus> {
        self.remove(&ItemId::from_query(query))
    }

    fn copy_public(&self, handle: &SoftwareKey) -> Option<SoftwareKey> {
        match &handle.material {
            KeyMaterial::Private(secret) => Some(SoftwareKey::public(secret.public_key())),
            KeyMaterial::Public(public) => Some(SoftwareKey::public(public.clone())),
        }
    }

    fn export_public(&self, handle: &SoftwareKey) -> Result<Vec<u8>, OsStatus> {
        match &handle.material {
            KeyMaterial::Public(public) => Ok(public.to_encoded_point(false).as_bytes().to_vec()),
            KeyMaterial::Private(_) => Err(OsStatus::PARAM),
        }
    }
}

impl CryptoEngine<SoftwareKey> for SoftwareKeychain {
    fn supports(&self, handle: &SoftwareKey, op: KeyOperation, scheme: Scheme) -> bool {
        scheme == Scheme::EciesCofactorVariableIvX963Sha256AesGcm
            && matches!(
                (&handle.material, op),
                (KeyMaterial::Public(_), KeyOperation::Encrypt)
                    | (KeyMaterial::Private(_), KeyOperation::Decrypt)
            )
    }

    fn encrypt(
        &self,
        handle: &SoftwareKey,
        _scheme: Scheme,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, OsStatus> {
        match &handle.material {
            KeyMaterial::Public(public) => ecies::encrypt(public, plaintext),
            KeyMaterial::Private(_) => Err(OsStatus::PARAM),
        }
    }

    fn decrypt(
        &self,
        handle: &SoftwareKey,
        _scheme: Scheme,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, OsStatus> {
        match &handle.material {
            KeyMaterial::Private(secret) => ecies::decrypt(secret, ciphertext),
            KeyMaterial::Public(_) => Err(OsStatus::PARAM),
        }
    }
}
