//! Seal and open
//!
//! Both operations are short linear pipelines. Any failing step aborts the whole
//! operation: seal never returns a partial envelope and open never returns
//! plaintext that did not authenticate.
//!
//! ```text
//! seal: generate custodian key -> generate ephemeral key -> agree -> derive -> AEAD seal -> encode
//! open: decode -> agree -> derive -> AEAD open
//! ```

use crate::crypto::{
    derive_key, AuthenticationError, EphemeralKey, KeyAgreement, KeyAgreementError, KeyError,
    PublicKey, SecretError,
};
use crate::custodian::{AccessPolicy, AuthContext, Custodian, CustodianError, CustodianKey};
use crate::envelope::{DecodeError, EncodingError, Envelope};

/// Errors that can abort a seal
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("failed to create protected key: {0}")]
    Custodian(#[from] CustodianError),
    #[error("failed to create ephemeral key: {0}")]
    EphemeralKey(#[from] KeyError),
    #[error(transparent)]
    KeyAgreement(#[from] KeyAgreementError),
    #[error("failed to seal payload: {0}")]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Errors that can abort an open
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    KeyAgreement(#[from] KeyAgreementError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
}

/// Seal `plaintext` to a fresh custodian key
///
/// 1. Asks the custodian for a new presence-gated key
/// 2. Generates an ephemeral P-256 key in memory
/// 3. Agrees on a shared secret from the ephemeral side
/// 4. Derives the symmetric key and seals the payload
/// 5. Encodes the envelope
///
/// Sealing agrees from the ephemeral side, so the new key's presence policy
/// is not exercised until the envelope is opened.
pub fn seal<C: Custodian + ?Sized>(
    custodian: &C,
    auth: &AuthContext,
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    let protected = custodian.generate_protected_key(AccessPolicy::user_presence(), auth)?;
    tracing::debug!(custodian_key = %protected.public_key, "created custodian key");

    let ephemeral = EphemeralKey::generate()?;
    let ephemeral_public = ephemeral.public_key();

    let shared = ephemeral.agree(&protected.public_key)?;
    let key = derive_key(&shared, &ephemeral_public, &protected.public_key);
    drop(shared);
    drop(ephemeral);

    let sealed_box = key.seal(plaintext)?;
    tracing::trace!(len = sealed_box.len(), "sealed payload");

    let envelope = Envelope {
        ephemeral_public_key: ephemeral_public.to_bytes().to_vec(),
        private_key: protected.handle,
        sealed_box,
    };
    Ok(envelope.encode()?)
}

/// Open an envelope produced by [`seal`]
///
/// 1. Decodes the envelope
/// 2. Reconstructs the custodian key from its handle
/// 3. Agrees on the shared secret from the custodian side (may prompt)
/// 4. Derives the same symmetric key and opens the payload
pub fn open<C: Custodian + ?Sized>(
    custodian: &C,
    auth: &AuthContext,
    envelope: &[u8],
) -> Result<Vec<u8>, OpenError> {
    let envelope = Envelope::decode(envelope)?;

    let ephemeral_public = PublicKey::try_from(envelope.ephemeral_public_key.as_slice())
        .map_err(KeyAgreementError::from)?;
    let protected = custodian
        .reconstruct_handle(envelope.private_key.as_bytes(), auth)
        .map_err(KeyAgreementError::from)?;
    tracing::debug!(custodian_key = %protected.public_key, "reconstructed custodian key");

    let custodian_key = CustodianKey::new(custodian, &protected, auth);
    let shared = custodian_key.agree(&ephemeral_public)?;
    let key = derive_key(&shared, &ephemeral_public, &custodian_key.public_key());
    drop(shared);

    let plaintext = key.open(&envelope.sealed_box).map_err(|e| {
        tracing::warn!("sealed box failed authentication");
        e
    })?;
    Ok(plaintext)
}
