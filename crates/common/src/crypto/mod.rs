//! Cryptographic primitives for secrypt
//!
//! This module provides the building blocks of the envelope protocol:
//!
//! - **Keys**: P-256 public keys (SEC1 compressed, 33 bytes) and in-memory ephemeral keys
//! - **Key Agreement**: ECDH behind the [`KeyAgreement`] capability, implemented both by
//!   ephemeral keys and by custodian-held keys
//! - **Key Derivation**: HKDF-SHA256 salted with the XOR of both public keys
//! - **Encryption**: ChaCha20-Poly1305 with a fresh random nonce per seal
//!
//! # Protocol Overview
//!
//! To seal data for a custodian key `C`:
//! 1. Generate an ephemeral keypair `(e, E)`
//! 2. Compute `ss = ECDH(e, C)`
//! 3. Derive `k = HKDF(salt = E ^ C, ikm = ss, info = "se-crypt/1.0")`
//! 4. Seal the payload with ChaCha20-Poly1305 under `k`
//!
//! The holder of the custodian key repeats the agreement from the other side,
//! `ECDH(c, E)`, which yields the same `ss` and therefore the same `k`.

mod agreement;
mod kdf;
mod keys;
mod secret;
mod xor;

pub use agreement::{KeyAgreement, KeyAgreementError, SharedSecret, SHARED_SECRET_SIZE};
pub use kdf::{derive_key, KDF_INFO};
pub use keys::{EphemeralKey, KeyError, PublicKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{
    AuthenticationError, SecretError, SymmetricKey, NONCE_SIZE, SYMMETRIC_KEY_SIZE, TAG_SIZE,
};
pub use xor::xor_combine;
