//! Software key custodian
//!
//! Stands in for secure hardware on hosts that have none. Protected keys are
//! P-256 scalars wrapped with ChaCha20-Poly1305 under a per-device [`DeviceKey`];
//! the wrapped form is the key handle.
//!
//! # Handle Format
//!
//! ```text
//! [ format: 1 ][ flags: 1 ][ nonce: 12 ][ wrapped scalar: 32 ][ tag: 16 ]
//! ```
//!
//! `format` and `flags` are bound as associated data, so the access policy
//! cannot be edited without invalidating the handle.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{AccessPolicy, AuthContext, Custodian, CustodianError, KeyHandle, ProtectedKey};
use crate::crypto::{EphemeralKey, PublicKey, SharedSecret, NONCE_SIZE, PRIVATE_KEY_SIZE, TAG_SIZE};

/// Size of a device key in bytes
pub const DEVICE_KEY_SIZE: usize = 32;
/// Size of a software custodian key handle in bytes
pub const HANDLE_SIZE: usize = HEADER_SIZE + NONCE_SIZE + PRIVATE_KEY_SIZE + TAG_SIZE;

const HANDLE_FORMAT: u8 = 1;
const HEADER_SIZE: usize = 2;
const FLAG_REQUIRE_PRESENCE: u8 = 0b0000_0001;

const PEM_TAG: &str = "SECRYPT DEVICE KEY";

/// The secret a software custodian wraps its protected keys under
///
/// Plays the role of the hardware root key: whoever holds it can use every
/// handle issued on this device.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceKey([u8; DEVICE_KEY_SIZE]);

impl fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceKey(..)")
    }
}

impl From<[u8; DEVICE_KEY_SIZE]> for DeviceKey {
    fn from(bytes: [u8; DEVICE_KEY_SIZE]) -> Self {
        DeviceKey(bytes)
    }
}

impl DeviceKey {
    /// Generate a new random device key
    pub fn generate() -> Result<Self, CustodianError> {
        let mut buff = [0u8; DEVICE_KEY_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| CustodianError::Unavailable(format!("rng failure: {}", e)))?;
        Ok(Self(buff))
    }

    /// Encode the device key in PEM format for storage
    ///
    /// Returns a PEM-encoded string with tag "SECRYPT DEVICE KEY".
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(PEM_TAG, self.0.to_vec());
        pem::encode(&pem)
    }

    /// Parse a device key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "SECRYPT DEVICE KEY"
    /// - The key size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, CustodianError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| CustodianError::Unavailable(format!("failed to parse PEM: {}", e)))?;

        if pem.tag() != PEM_TAG {
            return Err(CustodianError::Unavailable(format!(
                "invalid PEM tag, expected {}",
                PEM_TAG
            )));
        }

        let contents = pem.contents();
        if contents.len() != DEVICE_KEY_SIZE {
            return Err(CustodianError::Unavailable(format!(
                "invalid device key size in PEM, expected {}, got {}",
                DEVICE_KEY_SIZE,
                contents.len()
            )));
        }

        let mut buff = [0u8; DEVICE_KEY_SIZE];
        buff.copy_from_slice(contents);
        Ok(Self(buff))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

/// Custodian that keeps protected keys wrapped under a [`DeviceKey`]
#[derive(Debug, Clone)]
pub struct SoftwareCustodian {
    device_key: DeviceKey,
}

impl SoftwareCustodian {
    pub fn new(device_key: DeviceKey) -> Self {
        Self { device_key }
    }

    fn wrap(&self, key: &EphemeralKey, policy: AccessPolicy) -> Result<KeyHandle, CustodianError> {
        let flags = if policy.require_presence {
            FLAG_REQUIRE_PRESENCE
        } else {
            0
        };
        let header = [HANDLE_FORMAT, flags];

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| CustodianError::Unavailable(format!("rng failure: {}", e)))?;

        let scalar = key.to_scalar_bytes();
        let wrapped = self
            .device_key
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &scalar[..],
                    aad: &header,
                },
            )
            .map_err(|_| CustodianError::Unavailable("key wrap failed".into()))?;

        let mut handle = Vec::with_capacity(HANDLE_SIZE);
        handle.extend_from_slice(&header);
        handle.extend_from_slice(&nonce_bytes);
        handle.extend_from_slice(&wrapped);
        Ok(KeyHandle::new(handle))
    }

    fn unwrap_key(&self, handle: &[u8]) -> Result<(EphemeralKey, AccessPolicy), CustodianError> {
        if handle.len() != HANDLE_SIZE {
            return Err(CustodianError::InvalidHandle(format!(
                "expected {} bytes, got {}",
                HANDLE_SIZE,
                handle.len()
            )));
        }

        let (header, rest) = handle.split_at(HEADER_SIZE);
        if header[0] != HANDLE_FORMAT {
            return Err(CustodianError::InvalidHandle(format!(
                "unknown handle format {}",
                header[0]
            )));
        }
        if header[1] & !FLAG_REQUIRE_PRESENCE != 0 {
            return Err(CustodianError::InvalidHandle(format!(
                "unknown policy flags {:#04x}",
                header[1]
            )));
        }
        let policy = AccessPolicy {
            require_presence: header[1] & FLAG_REQUIRE_PRESENCE != 0,
        };

        let (nonce, wrapped) = rest.split_at(NONCE_SIZE);
        let scalar = self
            .device_key
            .cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: wrapped,
                    aad: header,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| {
                CustodianError::InvalidHandle("handle was not issued by this device".into())
            })?;

        let key = EphemeralKey::from_scalar_bytes(&scalar)
            .map_err(|e| CustodianError::InvalidHandle(e.to_string()))?;
        Ok((key, policy))
    }
}

impl Custodian for SoftwareCustodian {
    fn generate_protected_key(
        &self,
        policy: AccessPolicy,
        _auth: &AuthContext,
    ) -> Result<ProtectedKey, CustodianError> {
        let key = EphemeralKey::generate()
            .map_err(|e| CustodianError::Unavailable(e.to_string()))?;
        let handle = self.wrap(&key, policy)?;

        tracing::debug!(
            require_presence = policy.require_presence,
            "generated protected key"
        );

        Ok(ProtectedKey {
            handle,
            public_key: key.public(),
        })
    }

    fn reconstruct_handle(
        &self,
        bytes: &[u8],
        _auth: &AuthContext,
    ) -> Result<ProtectedKey, CustodianError> {
        let (key, _) = self.unwrap_key(bytes)?;
        Ok(ProtectedKey {
            handle: KeyHandle::new(bytes.to_vec()),
            public_key: key.public(),
        })
    }

    fn agree(
        &self,
        handle: &KeyHandle,
        peer: &PublicKey,
        auth: &AuthContext,
    ) -> Result<SharedSecret, CustodianError> {
        let (key, policy) = self.unwrap_key(handle.as_bytes())?;
        if policy.require_presence {
            auth.confirm_presence()?;
        }
        Ok(key.diffie_hellman(peer))
    }
}
