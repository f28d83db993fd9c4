use std::fmt;

/// Exported external representation of a public key.
///
/// For P-256 keys this is the 65-byte uncompressed SEC1 point
/// (`0x04 || X || Y`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes(Vec<u8>);

impl PublicKeyBytes {
    pub const UNCOMPRESSED_P256_LEN: usize = 65;

    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.0.len().min(8);
        write!(f, "PublicKeyBytes({}..)", hex::encode(&self.0[..shown]))
    }
}

impl AsRef<[u8]> for PublicKeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
