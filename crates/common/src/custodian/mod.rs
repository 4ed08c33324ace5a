//! The key custodian
//!
//! A custodian holds private keys inside a protection domain the rest of the
//! program cannot see into (a secure element, a TPM, or the software fallback in
//! [`SoftwareCustodian`]). It hands out two things per key:
//!
//! - an opaque [`KeyHandle`], safe to persist inside an envelope, that only the
//!   same custodian can turn back into a usable key
//! - the key's [`PublicKey`]
//!
//! Every use of a protected key goes through [`Custodian::agree`] and carries an
//! explicit [`AuthContext`]. There is no process-wide authentication state.

mod auth;
mod software;

use std::fmt;

use crate::crypto::{KeyAgreement, KeyAgreementError, PublicKey, SharedSecret};

pub use auth::{AssumePresent, AuthContext, PresenceVerifier, TerminalPrompt};
pub use software::{DeviceKey, SoftwareCustodian, DEVICE_KEY_SIZE, HANDLE_SIZE};

/// Errors reported by a custodian
#[derive(Debug, thiserror::Error)]
pub enum CustodianError {
    #[error("invalid key handle: {0}")]
    InvalidHandle(String),
    #[error("user presence check was denied")]
    PresenceDenied,
    #[error("user presence check failed: {0}")]
    PresenceCheck(#[from] std::io::Error),
    #[error("custodian unavailable: {0}")]
    Unavailable(String),
}

/// Conditions a protected key imposes on its own use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    /// Require a local presence check before every key agreement
    pub require_presence: bool,
}

impl AccessPolicy {
    /// The policy every sealing key is created with
    pub fn user_presence() -> Self {
        Self {
            require_presence: true,
        }
    }
}

/// Opaque reference to a custodian-held private key
///
/// The bytes are only meaningful to the custodian that issued them. They are
/// not key material and expose no way to be used as such.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyHandle(Vec<u8>);

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHandle({} bytes)", self.0.len())
    }
}

impl KeyHandle {
    /// Wrap handle bytes produced by a custodian
    pub fn new(bytes: Vec<u8>) -> Self {
        KeyHandle(bytes)
    }

    /// The serialized handle, as carried in an envelope
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A custodian-held key: its handle and its public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedKey {
    pub handle: KeyHandle,
    pub public_key: PublicKey,
}

/// Capability of an external key custodian
///
/// Implementations may block for as long as a presence check takes; callers
/// that must stay responsive should run them on a blocking thread.
pub trait Custodian: Send + Sync {
    /// Create a new P-256 key inside the protection domain
    fn generate_protected_key(
        &self,
        policy: AccessPolicy,
        auth: &AuthContext,
    ) -> Result<ProtectedKey, CustodianError>;

    /// Turn serialized handle bytes back into a usable key reference
    fn reconstruct_handle(
        &self,
        bytes: &[u8],
        auth: &AuthContext,
    ) -> Result<ProtectedKey, CustodianError>;

    /// ECDH between the protected key behind `handle` and `peer`
    ///
    /// Subject to the key's [`AccessPolicy`], checked against `auth`.
    fn agree(
        &self,
        handle: &KeyHandle,
        peer: &PublicKey,
        auth: &AuthContext,
    ) -> Result<SharedSecret, CustodianError>;
}

/// A protected key bound to its custodian and the caller's auth context
///
/// This is the custodian-backed [`KeyAgreement`] variant.
pub struct CustodianKey<'a, C: Custodian + ?Sized> {
    custodian: &'a C,
    key: &'a ProtectedKey,
    auth: &'a AuthContext,
}

impl<'a, C: Custodian + ?Sized> CustodianKey<'a, C> {
    pub fn new(custodian: &'a C, key: &'a ProtectedKey, auth: &'a AuthContext) -> Self {
        Self {
            custodian,
            key,
            auth,
        }
    }
}

impl<C: Custodian + ?Sized> KeyAgreement for CustodianKey<'_, C> {
    fn public_key(&self) -> PublicKey {
        self.key.public_key
    }

    fn agree(&self, peer: &PublicKey) -> Result<SharedSecret, KeyAgreementError> {
        Ok(self.custodian.agree(&self.key.handle, peer, self.auth)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::EphemeralKey;

    #[test]
    fn test_custodian_key_matches_ephemeral_side() {
        let custodian = SoftwareCustodian::new(DeviceKey::generate().unwrap());
        let auth = AuthContext::new(AssumePresent);
        let protected = custodian
            .generate_protected_key(AccessPolicy::user_presence(), &auth)
            .unwrap();
        let ephemeral = EphemeralKey::generate().unwrap();

        let custodian_key = CustodianKey::new(&custodian, &protected, &auth);
        assert_eq!(custodian_key.public_key(), protected.public_key);

        let from_custodian = custodian_key.agree(&ephemeral.public_key()).unwrap();
        let from_ephemeral = ephemeral.agree(&protected.public_key).unwrap();
        assert_eq!(from_custodian, from_ephemeral);
    }

    #[test]
    fn test_custodian_key_via_trait_object() {
        let custodian: Box<dyn Custodian> =
            Box::new(SoftwareCustodian::new(DeviceKey::generate().unwrap()));
        let auth = AuthContext::new(AssumePresent);
        let protected = custodian
            .generate_protected_key(AccessPolicy::default(), &auth)
            .unwrap();
        let peer = EphemeralKey::generate().unwrap();

        let key = CustodianKey::new(custodian.as_ref(), &protected, &auth);
        assert!(key.agree(&peer.public()).is_ok());
    }

    #[test]
    fn test_key_handle_debug_hides_bytes() {
        let handle = KeyHandle::new(vec![0xaa; 4]);
        assert_eq!(format!("{:?}", handle), "KeyHandle(4 bytes)");
    }
}
