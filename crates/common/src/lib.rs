/**
 * Cryptographic types and operations.
 *  - P-256 public keys and ephemeral keys
 *  - Key agreement, key derivation and AEAD
 */
pub mod crypto;
/**
 * The key custodian capability: an external holder
 *  of protected private keys, gated behind an explicit
 *  authentication context.
 * Ships with a software custodian for hosts without
 *  secure hardware.
 */
pub mod custodian;
/**
 * Binary (DAG-CBOR) envelope carrying everything needed
 *  to repeat the key agreement on open.
 */
pub mod envelope;
/**
 * End-to-end seal and open operations.
 */
pub mod pipeline;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::crypto::{EphemeralKey, KeyAgreement, PublicKey, SymmetricKey};
    pub use crate::custodian::{
        AccessPolicy, AssumePresent, AuthContext, Custodian, DeviceKey, KeyHandle,
        SoftwareCustodian, TerminalPrompt,
    };
    pub use crate::envelope::{DecodeError, Envelope};
    pub use crate::pipeline::{open, seal, OpenError, SealError};
    pub use crate::version::BuildInfo;
}
