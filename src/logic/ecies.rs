//! ECIES over P-256 with the X9.63 SHA-256 KDF and AES-GCM
//!
//! Wire layout: `ephemeral_public (65) || aes_gcm_ciphertext || tag (16)`.
//!
//! Key agreement uses cofactor ECDH (identical to plain ECDH on P-256, whose
//! cofactor is 1). The KDF shared info is the uncompressed ephemeral public
//! key. The KDF output supplies the AES-128 key followed by a 16-byte IV
//! ("variable IV" mode), so no nonce is transmitted.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes128;
use aes_gcm::AesGcm;
use p256::ecdh::{diffie_hellman, EphemeralSecret};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::model::OsStatus;

/// AES-128-GCM with a 16-byte IV
type Aes128Gcm16 = AesGcm<Aes128, U16>;

pub const EPHEMERAL_KEY_LEN: usize = 65;
pub const TAG_LEN: usize = 16;
const AES_KEY_LEN: usize = 16;
const IV_LEN: usize = 16;

pub fn encrypt(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, OsStatus> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_public = ephemeral.public_key().to_encoded_point(false);
    let shared = ephemeral.diffie_hellman(recipient);

    let (key, iv) = derive_key_and_iv(
        shared.raw_secret_bytes().as_slice(),
        ephemeral_public.as_bytes(),
    );
    let cipher = Aes128Gcm16::new_from_slice(&key[..]).map_err(|_| OsStatus::INTERNAL)?;
    let sealed = cipher
        .encrypt(GenericArray::from_slice(&iv[..]), plaintext)
        .map_err(|_| OsStatus::INTERNAL)?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LEN + sealed.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&sealed);
    Ok(out)
}

pub fn decrypt(recipient: &SecretKey, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, OsStatus> {
    if ciphertext.len() < EPHEMERAL_KEY_LEN + TAG_LEN {
        return Err(OsStatus::DECODE);
    }
    let (ephemeral_bytes, sealed) = ciphertext.split_at(EPHEMERAL_KEY_LEN);
    let ephemeral = PublicKey::from_sec1_bytes(ephemeral_bytes).map_err(|_| OsStatus::DECODE)?;

    let shared = diffie_hellman(recipient.to_nonzero_scalar(), ephemeral.as_affine());
    let (key, iv) = derive_key_and_iv(shared.raw_secret_bytes().as_slice(), ephemeral_bytes);
    let cipher = Aes128Gcm16::new_from_slice(&key[..]).map_err(|_| OsStatus::INTERNAL)?;

    cipher
        .decrypt(GenericArray::from_slice(&iv[..]), sealed)
        .map(Zeroizing::new)
        .map_err(|_| OsStatus::DECODE)
}

fn derive_key_and_iv(
    shared_secret: &[u8],
    shared_info: &[u8],
) -> (Zeroizing<[u8; AES_KEY_LEN]>, [u8; IV_LEN]) {
    let okm = x963_kdf(shared_secret, shared_info, AES_KEY_LEN + IV_LEN);

    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    key.copy_from_slice(&okm[..AES_KEY_LEN]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&okm[AES_KEY_LEN..]);
    (key, iv)
}

/// ANSI X9.63 KDF: `SHA-256(Z || counter_be32 || shared_info)` blocks,
/// counter starting at 1, truncated to `len`.
pub fn x963_kdf(shared_secret: &[u8], shared_info: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(len + 32));
    let mut counter: u32 = 1;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(shared_secret);
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_info);
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(len);
    out
}
