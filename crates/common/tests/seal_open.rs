//! Integration tests for the end-to-end seal and open operations

mod common;

use ::common::crypto::{derive_key, EphemeralKey, KeyAgreement, KeyAgreementError, NONCE_SIZE};
use ::common::custodian::{
    AccessPolicy, AuthContext, Custodian, CustodianError, CustodianKey, KeyHandle,
};
use ::common::envelope::{DecodeError, Envelope};
use ::common::pipeline::{open, seal, OpenError};

#[test]
fn test_hello_world_roundtrip() {
    let (custodian, auth) = common::setup_custodian();

    let envelope = seal(&custodian, &auth, b"hello world").unwrap();
    let plaintext = open(&custodian, &auth, &envelope).unwrap();

    assert_eq!(plaintext, b"hello world");
}

#[test]
fn test_roundtrip_various_sizes() {
    let (custodian, auth) = common::setup_custodian();

    for len in [0usize, 1, 15, 16, 17, 63, 64, 65, 1000, 1 << 16] {
        let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let envelope = seal(&custodian, &auth, &plaintext).unwrap();
        assert_eq!(open(&custodian, &auth, &envelope).unwrap(), plaintext);
    }
}

#[test]
fn test_empty_roundtrip() {
    let (custodian, auth) = common::setup_custodian();

    let envelope = seal(&custodian, &auth, b"").unwrap();
    assert_eq!(open(&custodian, &auth, &envelope).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_every_bit_flip_in_sealed_box_fails() {
    let (custodian, auth) = common::setup_custodian();
    let envelope = Envelope::decode(&seal(&custodian, &auth, b"attack at dawn").unwrap()).unwrap();

    // ciphertext and tag; the nonce is covered by the tag as well
    for byte in 0..envelope.sealed_box.len() {
        for bit in 0..8 {
            let mut tampered = envelope.clone();
            tampered.sealed_box[byte] ^= 1 << bit;
            let bytes = tampered.encode().unwrap();

            let result = open(&custodian, &auth, &bytes);
            assert!(
                matches!(result, Err(OpenError::Authentication(_))),
                "flip at byte {} bit {} (nonce: {}) gave {:?}",
                byte,
                bit,
                byte < NONCE_SIZE,
                result
            );
        }
    }
}

#[test]
fn test_truncated_sealed_box_fails() {
    let (custodian, auth) = common::setup_custodian();
    let mut envelope = Envelope::decode(&seal(&custodian, &auth, b"data").unwrap()).unwrap();

    envelope.sealed_box.truncate(NONCE_SIZE + 3);
    let result = open(&custodian, &auth, &envelope.encode().unwrap());
    assert!(matches!(result, Err(OpenError::Authentication(_))));
}

#[test]
fn test_swapped_sealed_box_fails() {
    let (custodian, auth) = common::setup_custodian();
    let first = Envelope::decode(&seal(&custodian, &auth, b"first").unwrap()).unwrap();
    let second = Envelope::decode(&seal(&custodian, &auth, b"second").unwrap()).unwrap();

    let mixed = Envelope {
        sealed_box: second.sealed_box,
        ..first
    };
    let result = open(&custodian, &auth, &mixed.encode().unwrap());
    assert!(matches!(result, Err(OpenError::Authentication(_))));
}

#[test]
fn test_missing_fields_reported() {
    let (custodian, auth) = common::setup_custodian();
    let e = Envelope::decode(&seal(&custodian, &auth, b"x").unwrap()).unwrap();
    let epk = ("ephemeralPublicKey", e.ephemeral_public_key.as_slice());
    let pk = ("privateKey", e.private_key.as_bytes());
    let sb = ("sealedBox", e.sealed_box.as_slice());

    let result = open(&custodian, &auth, &common::cbor_byte_map(&[pk, sb]));
    assert!(matches!(
        result,
        Err(OpenError::Decode(DecodeError::MissingEphemeralPublicKey))
    ));

    let result = open(&custodian, &auth, &common::cbor_byte_map(&[epk, sb]));
    assert!(matches!(
        result,
        Err(OpenError::Decode(DecodeError::MissingPrivateKey))
    ));

    let result = open(&custodian, &auth, &common::cbor_byte_map(&[epk, pk]));
    assert!(matches!(
        result,
        Err(OpenError::Decode(DecodeError::MissingSealedBox))
    ));

    let result = open(&custodian, &auth, b"\x83\x01\x02\x03");
    assert!(matches!(
        result,
        Err(OpenError::Decode(DecodeError::Malformed(_)))
    ));
}

#[test]
fn test_versionless_envelope_in_any_order_opens() {
    let (custodian, auth) = common::setup_custodian();
    let e = Envelope::decode(&seal(&custodian, &auth, b"legacy").unwrap()).unwrap();

    let bytes = common::cbor_byte_map(&[
        ("sealedBox", e.sealed_box.as_slice()),
        ("ephemeralPublicKey", e.ephemeral_public_key.as_slice()),
        ("privateKey", e.private_key.as_bytes()),
    ]);
    assert_eq!(open(&custodian, &auth, &bytes).unwrap(), b"legacy");
}

#[test]
fn test_invalid_ephemeral_key_is_agreement_error() {
    let (custodian, auth) = common::setup_custodian();
    let mut envelope = Envelope::decode(&seal(&custodian, &auth, b"x").unwrap()).unwrap();

    envelope.ephemeral_public_key = vec![0x02; 33];
    envelope.ephemeral_public_key[1..].fill(0xff);
    let result = open(&custodian, &auth, &envelope.encode().unwrap());
    assert!(matches!(
        result,
        Err(OpenError::KeyAgreement(KeyAgreementError::InvalidPeerKey(_)))
    ));

    envelope.ephemeral_public_key = vec![0x04; 65];
    let result = open(&custodian, &auth, &envelope.encode().unwrap());
    assert!(matches!(
        result,
        Err(OpenError::KeyAgreement(KeyAgreementError::InvalidPeerKey(_)))
    ));
}

#[test]
fn test_ephemeral_key_must_use_compressed_tag() {
    let (custodian, auth) = common::setup_custodian();
    let original = Envelope::decode(&seal(&custodian, &auth, b"hello world").unwrap()).unwrap();

    // 0x05 is the SEC1 compact tag for the same x coordinate
    for tag in [0x04u8, 0x05, 0x06, 0x07] {
        let mut envelope = original.clone();
        envelope.ephemeral_public_key[0] = tag;

        let result = open(&custodian, &auth, &envelope.encode().unwrap());
        assert!(
            matches!(
                result,
                Err(OpenError::KeyAgreement(KeyAgreementError::InvalidPeerKey(_)))
            ),
            "tag {:#04x} gave {:?}",
            tag,
            result
        );
    }

    assert_eq!(
        open(&custodian, &auth, &original.encode().unwrap()).unwrap(),
        b"hello world"
    );
}

#[test]
fn test_wrong_ephemeral_key_fails_authentication() {
    let (custodian, auth) = common::setup_custodian();
    let mut envelope = Envelope::decode(&seal(&custodian, &auth, b"x").unwrap()).unwrap();

    // a valid but unrelated point derives a different key
    envelope.ephemeral_public_key = EphemeralKey::generate().unwrap().public().to_bytes().to_vec();
    let result = open(&custodian, &auth, &envelope.encode().unwrap());
    assert!(matches!(result, Err(OpenError::Authentication(_))));
}

#[test]
fn test_other_device_cannot_open() {
    let (ours, auth) = common::setup_custodian();
    let (theirs, _) = common::setup_custodian();

    let envelope = seal(&ours, &auth, b"only for this device").unwrap();
    let result = open(&theirs, &auth, &envelope);
    assert!(matches!(
        result,
        Err(OpenError::KeyAgreement(KeyAgreementError::Custodian(
            CustodianError::InvalidHandle(_)
        )))
    ));
}

#[test]
fn test_garbage_handle_rejected() {
    let (custodian, auth) = common::setup_custodian();
    let mut envelope = Envelope::decode(&seal(&custodian, &auth, b"x").unwrap()).unwrap();

    envelope.private_key = KeyHandle::new(vec![0x01; 7]);
    let result = open(&custodian, &auth, &envelope.encode().unwrap());
    assert!(matches!(
        result,
        Err(OpenError::KeyAgreement(KeyAgreementError::Custodian(
            CustodianError::InvalidHandle(_)
        )))
    ));
}

#[test]
fn test_presence_denied_aborts_open() {
    let (custodian, auth) = common::setup_custodian();
    let envelope = seal(&custodian, &auth, b"guarded").unwrap();

    let denied = AuthContext::new(common::Deny);
    let result = open(&custodian, &denied, &envelope);
    assert!(matches!(
        result,
        Err(OpenError::KeyAgreement(KeyAgreementError::Custodian(
            CustodianError::PresenceDenied
        )))
    ));

    // the envelope is intact; a later attempt can still succeed
    assert_eq!(open(&custodian, &auth, &envelope).unwrap(), b"guarded");
}

#[test]
fn test_presence_checked_on_open_only() {
    let (custodian, _) = common::setup_custodian();
    let counter = common::Counting::default();
    let auth = AuthContext::new(counter.clone());

    let envelope = seal(&custodian, &auth, b"count me").unwrap();
    assert_eq!(counter.count(), 0);

    open(&custodian, &auth, &envelope).unwrap();
    assert_eq!(counter.count(), 1);

    open(&custodian, &auth, &envelope).unwrap();
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_agreement_symmetry_through_custodian() {
    let (custodian, auth) = common::setup_custodian();
    let protected = custodian
        .generate_protected_key(AccessPolicy::user_presence(), &auth)
        .unwrap();
    let ephemeral = EphemeralKey::generate().unwrap();
    let custodian_key = CustodianKey::new(&custodian, &protected, &auth);

    let e = ephemeral.public_key();
    let c = custodian_key.public_key();

    let seal_secret = ephemeral.agree(&c).unwrap();
    let open_secret = custodian_key.agree(&e).unwrap();
    assert_eq!(seal_secret, open_secret);

    assert_eq!(
        derive_key(&seal_secret, &e, &c),
        derive_key(&open_secret, &e, &c)
    );
}

#[test]
fn test_concurrent_seal_open() {
    let (custodian, auth) = common::setup_custodian();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let custodian = &custodian;
                let auth = &auth;
                scope.spawn(move || {
                    let plaintext = vec![i; 100 + i as usize];
                    let envelope = seal(custodian, auth, &plaintext).unwrap();
                    assert_eq!(open(custodian, auth, &envelope).unwrap(), plaintext);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    });
}
