use hkdf::Hkdf;
use sha2::Sha256;

use super::agreement::SharedSecret;
use super::keys::PublicKey;
use super::secret::{SymmetricKey, SYMMETRIC_KEY_SIZE};
use super::xor::xor_combine;

/// HKDF info label binding derived keys to this protocol and version
pub const KDF_INFO: &[u8] = b"se-crypt/1.0";

/// Derive the envelope's symmetric key from a shared secret
///
/// HKDF-SHA256 with:
/// - salt = `ephemeral ^ custodian` over the compressed encodings
/// - ikm = the shared secret
/// - info = [`KDF_INFO`]
///
/// Seal and open both pass the ephemeral key first. The XOR does not depend on
/// argument order anyway, so swapping the two keys still yields the same salt.
pub fn derive_key(
    secret: &SharedSecret,
    ephemeral: &PublicKey,
    custodian: &PublicKey,
) -> SymmetricKey {
    let salt = xor_combine(&ephemeral.to_bytes(), &custodian.to_bytes());
    let hk = Hkdf::<Sha256>::new(Some(&salt), secret.as_bytes());

    let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
    hk.expand(KDF_INFO, &mut okm)
        .expect("HKDF expand should not fail with a 32-byte output");
    SymmetricKey::from(okm)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{EphemeralKey, KeyAgreement, SHARED_SECRET_SIZE};

    #[test]
    fn test_derive_is_deterministic() {
        let e = EphemeralKey::generate().unwrap().public();
        let c = EphemeralKey::generate().unwrap().public();
        let secret = SharedSecret::from_bytes([9u8; SHARED_SECRET_SIZE]);

        assert_eq!(derive_key(&secret, &e, &c), derive_key(&secret, &e, &c));
    }

    #[test]
    fn test_derive_ignores_key_order() {
        let e = EphemeralKey::generate().unwrap().public();
        let c = EphemeralKey::generate().unwrap().public();
        let secret = SharedSecret::from_bytes([9u8; SHARED_SECRET_SIZE]);

        assert_eq!(derive_key(&secret, &e, &c), derive_key(&secret, &c, &e));
    }

    #[test]
    fn test_derive_depends_on_every_input() {
        let e = EphemeralKey::generate().unwrap().public();
        let c = EphemeralKey::generate().unwrap().public();
        let other = EphemeralKey::generate().unwrap().public();
        let secret = SharedSecret::from_bytes([9u8; SHARED_SECRET_SIZE]);
        let other_secret = SharedSecret::from_bytes([8u8; SHARED_SECRET_SIZE]);

        let base = derive_key(&secret, &e, &c);
        assert_ne!(base, derive_key(&other_secret, &e, &c));
        assert_ne!(base, derive_key(&secret, &other, &c));
        assert_ne!(base, derive_key(&secret, &e, &other));
    }

    #[test]
    fn test_both_sides_derive_same_key() {
        let ephemeral = EphemeralKey::generate().unwrap();
        let custodian = EphemeralKey::generate().unwrap();
        let e = ephemeral.public_key();
        let c = custodian.public_key();

        let seal_side = derive_key(&ephemeral.agree(&c).unwrap(), &e, &c);
        let open_side = derive_key(&custodian.agree(&e).unwrap(), &e, &c);
        assert_eq!(seal_side, open_side);
    }

    #[test]
    fn test_known_vector() {
        // ephemeral = G, custodian = 2G on P-256, ikm = 00..1f
        let e = PublicKey::try_from(
            &hex::decode("036b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296")
                .unwrap()[..],
        )
        .unwrap();
        let c = PublicKey::try_from(
            &hex::decode("037cf27b188d034f7e8a52380304b51ac3c08969e277f21b35a60b48fc47669978")
                .unwrap()[..],
        )
        .unwrap();
        let mut ikm = [0u8; SHARED_SECRET_SIZE];
        for (i, b) in ikm.iter_mut().enumerate() {
            *b = i as u8;
        }
        let secret = SharedSecret::from_bytes(ikm);

        assert_eq!(
            hex::encode(xor_combine(&e.to_bytes(), &c.to_bytes())),
            "0017e5aaea6c2f0d3972eedee667115a31b78a14635a19289552aa71b99ffe5bee"
        );
        assert_eq!(
            hex::encode(derive_key(&secret, &e, &c).bytes()),
            "3bbe6363aa6e6f90c0bf6ff004bd8aaee7100d97736a35976a6f88d6605c8239"
        );
    }
}
