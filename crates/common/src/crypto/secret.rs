//! Payload encryption using ChaCha20-Poly1305
//!
//! A [`SymmetricKey`] is derived fresh for every envelope and seals exactly one
//! payload. The sealed blob is self-contained: `nonce (12) || ciphertext || tag (16)`.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Errors that can occur while sealing
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("failed to generate nonce: {0}")]
    Rng(#[from] getrandom::Error),
    #[error("encrypt error")]
    Encrypt,
}

/// The sealed blob did not authenticate under the given key
///
/// Wrong key, truncation and tampering are deliberately indistinguishable.
#[derive(Debug, thiserror::Error)]
#[error("authentication failed: wrong key or tampered data")]
pub struct AuthenticationError;

/// A 256-bit symmetric key for sealing one payload
///
/// Never persisted; wiped from memory on drop.
///
/// # Examples
///
/// ```ignore
/// let key = derive_key(&shared_secret, &ephemeral_public, &custodian_public);
///
/// let blob = key.seal(b"sensitive data")?;
/// let recovered = key.open(&blob)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl From<[u8; SYMMETRIC_KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        SymmetricKey(bytes)
    }
}

impl SymmetricKey {
    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.bytes()))
    }

    /// Encrypt `plaintext` under this key
    ///
    /// The output format is: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.
    /// A fresh random nonce is drawn for every call.
    ///
    /// # Errors
    ///
    /// Returns an error only if the system RNG fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(nonce, plaintext)
            .map_err(|_| SecretError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt a blob produced by [`SymmetricKey::seal`]
    ///
    /// No plaintext is returned unless the tag verifies.
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, AuthenticationError> {
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(AuthenticationError);
        }

        let nonce = Nonce::from_slice(&blob[..NONCE_SIZE]);
        self.cipher()
            .decrypt(nonce, &blob[NONCE_SIZE..])
            .map_err(|_| AuthenticationError)
    }
}
