//! Wire format of an encrypted column encryption key.
//!
//! ```text
//! +---------+----------------+---------------+----------+------------+-----------+
//! | version | key path len   | ciphertext len| key path | ciphertext | signature |
//! | 0x01    | u16 LE         | u16 LE        | UTF-16LE |            |           |
//! +---------+----------------+---------------+----------+------------+-----------+
//! ```
//!
//! The signature is RS256 over everything that precedes it.

use sha2::{Digest, Sha256};

use crate::error::KeyStoreError;

const VERSION: u8 = 0x01;
const HEADER_LEN: usize = 5;

/// Parsed view of an encrypted column encryption key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedColumnKey<'a> {
    key_path: &'a [u8],
    ciphertext: &'a [u8],
    signature: &'a [u8],
    signed: &'a [u8],
}

impl<'a> EncryptedColumnKey<'a> {
    /// Split `bytes` into its parts, checking version and lengths
    pub fn parse(bytes: &'a [u8]) -> Result<Self, KeyStoreError> {
        let invalid = |reason: &str| KeyStoreError::InvalidEncryptedKey(reason.to_string());

        if bytes.len() < HEADER_LEN {
            return Err(invalid("shorter than header"));
        }
        if bytes[0] != VERSION {
            return Err(KeyStoreError::InvalidEncryptedKey(format!(
                "unsupported version byte 0x{:02x}",
                bytes[0]
            )));
        }

        let key_path_len = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
        let ciphertext_len = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;

        let ciphertext_start = HEADER_LEN + key_path_len;
        let signature_start = ciphertext_start + ciphertext_len;
        if signature_start >= bytes.len() {
            return Err(invalid("lengths exceed payload, no room for signature"));
        }
        if ciphertext_len == 0 {
            return Err(invalid("empty ciphertext"));
        }

        let signature = &bytes[signature_start..];
        // Both are one RSA block of the master key's modulus size.
        if signature.len() != ciphertext_len {
            return Err(invalid("signature length does not match ciphertext length"));
        }

        Ok(Self {
            key_path: &bytes[HEADER_LEN..ciphertext_start],
            ciphertext: &bytes[ciphertext_start..signature_start],
            signature,
            signed: &bytes[..signature_start],
        })
    }

    /// Master key path recorded in the envelope, decoded from UTF-16LE
    pub fn key_path(&self) -> Option<String> {
        if self.key_path.len() % 2 != 0 {
            return None;
        }
        let units: Vec<u16> = self
            .key_path
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    }

    /// Wrapped key bytes
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    /// Signature over [`Self::signed_digest`]'s input
    pub fn signature(&self) -> &'a [u8] {
        self.signature
    }

    /// SHA-256 of version, lengths, key path and ciphertext
    pub fn signed_digest(&self) -> [u8; 32] {
        digest(self.signed)
    }
}

pub(crate) fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Header, key path and ciphertext of a new envelope, ready to be signed.
///
/// The key path is stored lowercased.
pub(crate) fn unsigned_envelope(
    master_key_path: &str,
    ciphertext: &[u8],
) -> Result<Vec<u8>, KeyStoreError> {
    let key_path: Vec<u8> = master_key_path
        .to_lowercase()
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();

    let key_path_len = u16::try_from(key_path.len())
        .map_err(|_| KeyStoreError::InvalidEncryptedKey("master key path too long".into()))?;
    let ciphertext_len = u16::try_from(ciphertext.len())
        .map_err(|_| KeyStoreError::InvalidEncryptedKey("ciphertext too long".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + key_path.len() + ciphertext.len() * 2);
    out.push(VERSION);
    out.extend_from_slice(&key_path_len.to_le_bytes());
    out.extend_from_slice(&ciphertext_len.to_le_bytes());
    out.extend_from_slice(&key_path);
    out.extend_from_slice(ciphertext);
    Ok(out)
}
