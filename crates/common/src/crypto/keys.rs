use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

/// Size of a P-256 scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of a SEC1 compressed P-256 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 33;

const SEC1_EVEN_Y: u8 = 0x02;
const SEC1_ODD_Y: u8 = 0x03;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("random number generator failure: {0}")]
    Rng(#[from] getrandom::Error),
}

/// A P-256 public key
///
/// Always carried on the wire in SEC1 compressed form (`0x02`/`0x03` || x),
/// 33 bytes long. Parsing validates that the point lies on the curve and is
/// not the identity, so any `PublicKey` value is safe to run ECDH against.
///
/// # Examples
///
/// ```ignore
/// let ephemeral = EphemeralKey::generate()?;
/// let public_key = ephemeral.public();
///
/// let bytes = public_key.to_bytes();
/// let recovered = PublicKey::try_from(&bytes[..])?;
/// assert_eq!(public_key, recovered);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(p256::PublicKey);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<p256::PublicKey> for PublicKey {
    fn from(key: p256::PublicKey) -> Self {
        PublicKey(key)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(KeyError::InvalidPublicKey(format!(
                "expected {} compressed bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        // from_sec1_bytes also takes the compact 0x05 tag
        if !matches!(bytes[0], SEC1_EVEN_Y | SEC1_ODD_Y) {
            return Err(KeyError::InvalidPublicKey(format!(
                "expected a compressed SEC1 tag, got {:#04x}",
                bytes[0]
            )));
        }
        let key = p256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| KeyError::InvalidPublicKey("point is not on the P-256 curve".into()))?;
        Ok(PublicKey(key))
    }
}

impl PublicKey {
    /// Convert public key to its SEC1 compressed encoding
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Convert public key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub(crate) fn as_p256(&self) -> &p256::PublicKey {
        &self.0
    }
}

/// An in-memory P-256 private key
///
/// Seal generates one per envelope and drops it once the symmetric key is
/// derived. The software custodian also materializes one briefly while a
/// handle is unwrapped. The scalar is wiped from memory on drop and never
/// serialized; only the public half leaves the process.
#[derive(Clone)]
pub struct EphemeralKey(p256::SecretKey);

impl fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKey")
            .field("public", &self.public())
            .finish_non_exhaustive()
    }
}

impl EphemeralKey {
    /// Generate a new random key using the operating system RNG
    ///
    /// Candidate scalars outside `[1, n)` are rejected and redrawn.
    pub fn generate() -> Result<Self, KeyError> {
        loop {
            let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
            getrandom::getrandom(&mut bytes[..])?;
            if let Ok(key) = Self::from_scalar_bytes(&bytes[..]) {
                return Ok(key);
            }
        }
    }

    /// Derive the public key from this private key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Build a key from a big-endian scalar
    pub(crate) fn from_scalar_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(KeyError::InvalidPrivateKey);
        }
        let key = p256::SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(EphemeralKey(key))
    }

    /// Export the big-endian scalar, wiped on drop
    pub(crate) fn to_scalar_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(self.0.to_bytes().as_slice());
        out
    }

    pub(crate) fn as_p256(&self) -> &p256::SecretKey {
        &self.0
    }
}
