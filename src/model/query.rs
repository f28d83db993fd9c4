//! Search and creation attributes handed to the key store
//!
//! These are value objects rebuilt for every operation from a [`KeyTag`]
//! and the configured [`TokenScope`]; nothing here is cached.

use super::KeyTag;

/// Which half of a key pair an item holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Private,
    Public,
}

impl KeyClass {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyClass::Private => "private",
            KeyClass::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    /// NIST P-256 elliptic curve key
    #[default]
    Ec,
}

/// Where key material lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenScope {
    /// Private keys are generated in and never leave the secure element
    #[default]
    SecureEnclave,
    /// Regular keychain items; both halves are stored, no access control.
    /// Used for testing on machines without a secure element.
    Keychain,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::SecureEnclave => "secure-enclave",
            TokenScope::Keychain => "keychain",
        }
    }
}

/// When the key may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    WhenUnlockedThisDeviceOnly,
}

/// Access control attached to a secure-element private key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessControl {
    pub accessibility: Accessibility,
    pub private_key_usage: bool,
    pub biometry_current_set: bool,
}

impl AccessControl {
    pub fn biometry_current_set() -> Self {
        Self {
            accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
            private_key_usage: true,
            biometry_current_set: true,
        }
    }
}

/// Search criteria identifying one stored key item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyQueryAttributes {
    pub class: KeyClass,
    pub key_type: KeyType,
    pub tag: KeyTag,
    pub token: TokenScope,
    pub return_ref: bool,
}

impl KeyQueryAttributes {
    /// Query for the private half of the pair tagged `tag`.
    pub fn private_key(tag: KeyTag, token: TokenScope) -> Self {
        Self {
            class: KeyClass::Private,
            key_type: KeyType::Ec,
            tag,
            token,
            return_ref: true,
        }
    }

    pub fn with_class(mut self, class: KeyClass) -> Self {
        self.class = class;
        self
    }
}

/// Attributes for generating a new key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenerationAttributes {
    pub tag: KeyTag,
    pub label: KeyTag,
    pub key_type: KeyType,
    pub size_bits: u32,
    pub permanent: bool,
    pub token: TokenScope,
    pub access_control: Option<AccessControl>,
    /// Store the public half as its own item as well
    pub store_public: bool,
}

impl KeyGenerationAttributes {
    pub fn new(tag: KeyTag, token: TokenScope, size_bits: u32) -> Self {
        let (access_control, store_public) = match token {
            TokenScope::SecureEnclave => (Some(AccessControl::biometry_current_set()), false),
            TokenScope::Keychain => (None, true),
        };
        Self {
            label: tag.clone(),
            tag,
            key_type: KeyType::Ec,
            size_bits,
            permanent: true,
            token,
            access_control,
            store_public,
        }
    }

    /// Query matching the private half this request will create.
    pub fn query(&self) -> KeyQueryAttributes {
        KeyQueryAttributes::private_key(self.tag.clone(), self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> KeyTag {
        "net.example.key".parse().unwrap()
    }

    #[test]
    fn test_private_key_query() {
        let query = KeyQueryAttributes::private_key(tag(), TokenScope::SecureEnclave);
        assert_eq!(query.class, KeyClass::Private);
        assert_eq!(query.key_type, KeyType::Ec);
        assert!(query.return_ref);
        assert_eq!(query.with_class(KeyClass::Public).class, KeyClass::Public);
    }

    #[test]
    fn test_secure_enclave_generation_has_access_control() {
        let attrs = KeyGenerationAttributes::new(tag(), TokenScope::SecureEnclave, 256);
        assert_eq!(attrs.access_control, Some(AccessControl::biometry_current_set()));
        assert!(!attrs.store_public);
        assert!(attrs.permanent);
        assert_eq!(attrs.label, attrs.tag);
    }

    #[test]
    fn test_keychain_generation_stores_public_half() {
        let attrs = KeyGenerationAttributes::new(tag(), TokenScope::Keychain, 256);
        assert_eq!(attrs.access_control, None);
        assert!(attrs.store_public);
        assert_eq!(attrs.query().token, TokenScope::Keychain);
    }
}
