//! Encryption scheme identifiers understood by the crypto engine

/// Asymmetric encryption scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// ECIES, cofactor ECDH, ANSI X9.63 KDF with SHA-256, AES-GCM with a
    /// KDF-derived 16-byte IV
    #[default]
    EciesCofactorVariableIvX963Sha256AesGcm,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Scheme::EciesCofactorVariableIvX963Sha256AesGcm => {
                "eciesEncryptionCofactorVariableIVX963SHA256AESGCM"
            }
        }
    }
}

/// Operation a key is asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOperation {
    Encrypt,
    Decrypt,
}
