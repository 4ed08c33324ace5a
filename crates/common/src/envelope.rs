//! Sealed envelope wire format
//!
//! An envelope is a DAG-CBOR map:
//!
//! ```text
//! {
//!   "version":            1,
//!   "ephemeralPublicKey": bytes,   // SEC1 compressed P-256 point
//!   "privateKey":         bytes,   // custodian key handle
//!   "sealedBox":          bytes,   // nonce || ciphertext || tag
//! }
//! ```
//!
//! DAG-CBOR sorts map keys canonically, so encoding is byte-stable. Decoding
//! accepts the keys in any order, ignores unknown keys, and treats a missing
//! `version` as version 1. Nothing here checks that the public key is a
//! curve point or that the handle is usable; that surfaces at key agreement.

use std::collections::BTreeMap;

use ipld_core::ipld::Ipld;

use crate::custodian::KeyHandle;

/// Envelope format version written by this crate
pub const ENVELOPE_VERSION: u64 = 1;

const VERSION: &str = "version";
const EPHEMERAL_PUBLIC_KEY: &str = "ephemeralPublicKey";
const PRIVATE_KEY: &str = "privateKey";
const SEALED_BOX: &str = "sealedBox";

/// Errors that can occur while decoding an envelope
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("envelope has no ephemeral public key")]
    MissingEphemeralPublicKey,
    #[error("envelope has no private key handle")]
    MissingPrivateKey,
    #[error("envelope has no sealed box")]
    MissingSealedBox,
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(i128),
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// Failed to serialize an in-memory envelope
#[derive(Debug, thiserror::Error)]
#[error("envelope encoding failed: {0}")]
pub struct EncodingError(String);

/// Everything a key holder needs to repeat the agreement and open the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Compressed public key of the sender's ephemeral key
    pub ephemeral_public_key: Vec<u8>,
    /// Handle of the custodian key the payload was sealed to
    pub private_key: KeyHandle,
    /// `nonce || ciphertext || tag`
    pub sealed_box: Vec<u8>,
}

impl Envelope {
    /// Serialize to DAG-CBOR
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let mut map = BTreeMap::new();
        map.insert(VERSION.to_string(), Ipld::Integer(ENVELOPE_VERSION.into()));
        map.insert(
            EPHEMERAL_PUBLIC_KEY.to_string(),
            Ipld::Bytes(self.ephemeral_public_key.clone()),
        );
        map.insert(
            PRIVATE_KEY.to_string(),
            Ipld::Bytes(self.private_key.as_bytes().to_vec()),
        );
        map.insert(SEALED_BOX.to_string(), Ipld::Bytes(self.sealed_box.clone()));

        serde_ipld_dagcbor::to_vec(&Ipld::Map(map)).map_err(|e| EncodingError(e.to_string()))
    }

    /// Parse from CBOR bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let ipld: Ipld = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let Ipld::Map(mut map) = ipld else {
            return Err(DecodeError::Malformed("envelope is not a map".into()));
        };

        match map.get(VERSION) {
            None => {}
            Some(Ipld::Integer(v)) if *v == i128::from(ENVELOPE_VERSION) => {}
            Some(Ipld::Integer(v)) => return Err(DecodeError::UnsupportedVersion(*v)),
            Some(_) => return Err(DecodeError::Malformed("version is not an integer".into())),
        }

        let ephemeral_public_key = take_bytes(&mut map, EPHEMERAL_PUBLIC_KEY)
            .ok_or(DecodeError::MissingEphemeralPublicKey)?;
        let private_key =
            take_bytes(&mut map, PRIVATE_KEY).ok_or(DecodeError::MissingPrivateKey)?;
        let sealed_box = take_bytes(&mut map, SEALED_BOX).ok_or(DecodeError::MissingSealedBox)?;

        Ok(Self {
            ephemeral_public_key,
            private_key: KeyHandle::new(private_key),
            sealed_box,
        })
    }
}

/// A field counts as present only if it is a non-empty byte string
fn take_bytes(map: &mut BTreeMap<String, Ipld>, key: &str) -> Option<Vec<u8>> {
    match map.remove(key) {
        Some(Ipld::Bytes(bytes)) if !bytes.is_empty() => Some(bytes),
        _ => None,
    }
}
