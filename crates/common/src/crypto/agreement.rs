//! Elliptic-curve key agreement
//!
//! [`KeyAgreement`] is the single capability the rest of the protocol needs from a
//! private key: compute an ECDH shared secret with a peer's public key. Two variants
//! implement it:
//!
//! - [`EphemeralKey`]: the scalar lives in process memory; agreement is a pure local
//!   computation that cannot fail once the peer key has been parsed.
//! - [`CustodianKey`](crate::custodian::CustodianKey): the scalar lives with the
//!   custodian; agreement is one call out to it and may be refused.
//!
//! Key derivation and the AEAD never learn which variant produced the secret.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::keys::{EphemeralKey, KeyError, PublicKey};
use crate::custodian::CustodianError;

/// Size of a P-256 ECDH shared secret (the affine x coordinate) in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// Errors that can occur during key agreement
#[derive(Debug, thiserror::Error)]
pub enum KeyAgreementError {
    #[error("invalid peer public key: {0}")]
    InvalidPeerKey(#[from] KeyError),
    #[error("custodian refused key agreement: {0}")]
    Custodian(#[from] CustodianError),
}

/// Raw output of one key agreement
///
/// Lives only for the duration of a single seal or open and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl SharedSecret {
    /// Wrap raw shared secret bytes, e.g. as returned by a hardware custodian
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        SharedSecret(bytes)
    }

    /// Get a reference to the shared secret bytes
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

/// A private key capable of ECDH with a peer public key
pub trait KeyAgreement {
    /// The public half of this key
    fn public_key(&self) -> PublicKey;

    /// Compute the shared secret with `peer`
    fn agree(&self, peer: &PublicKey) -> Result<SharedSecret, KeyAgreementError>;
}

impl KeyAgreement for EphemeralKey {
    fn public_key(&self) -> PublicKey {
        self.public()
    }

    fn agree(&self, peer: &PublicKey) -> Result<SharedSecret, KeyAgreementError> {
        Ok(self.diffie_hellman(peer))
    }
}

impl EphemeralKey {
    /// Raw P-256 ECDH; infallible because `peer` is already a validated point
    pub(crate) fn diffie_hellman(&self, peer: &PublicKey) -> SharedSecret {
        let shared = p256::ecdh::diffie_hellman(
            self.as_p256().to_nonzero_scalar(),
            peer.as_p256().as_affine(),
        );

        let mut secret = SharedSecret([0u8; SHARED_SECRET_SIZE]);
        secret
            .0
            .copy_from_slice(shared.raw_secret_bytes().as_slice());
        secret
    }
}
