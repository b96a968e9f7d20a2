/*
 * Copyright (c) 2024-2025 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use ciborium::Value;
use rstest::rstest;

use crate::error::CoseCipherError;
use crate::framing::{self, MessageKind, ReadOptions, Recipients};
use crate::header::{CoseHeaders, NamedHeaders, ProtectedEncoding};
use crate::signed::{self, SignCreateOptions, SignCryptoBackend, Signer, Verifier};
use crate::test_helper::{other_p256_key, p256_key, p521_key, Ec2KeyMaterial};

#[cfg(feature = "openssl")]
use crate::test_helper::openssl_ctx;
#[cfg(feature = "rustcrypto-rsa")]
use crate::test_helper::rsa_key;
#[cfg(any(feature = "rustcrypto-ecdsa", feature = "rustcrypto-rsa"))]
use crate::test_helper::rustcrypto_ctx;

const PAYLOAD: &[u8] = b"Important message!";

fn headers(alg: &str) -> CoseHeaders {
    CoseHeaders::new(
        NamedHeaders::new().with("alg", alg),
        NamedHeaders::new().with("kid", "11"),
    )
}

fn create_sign1<B: SignCryptoBackend>(
    backend: &mut B,
    alg: &str,
    signer: Signer<'_>,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    signed::create(
        backend,
        &headers(alg),
        PAYLOAD,
        &Recipients::One(signer),
        &SignCreateOptions::default(),
    )
}

/// Returns the array items of a tagged message.
fn message_items(message: &[u8]) -> Vec<Value> {
    let Value::Tag(_, inner) = framing::decode_first::<()>(message).unwrap() else {
        panic!("message is not tagged");
    };
    let Value::Array(items) = *inner else {
        panic!("message is not an array");
    };
    items
}

fn tagged(tag: u64, items: Vec<Value>) -> Vec<u8> {
    framing::encode::<()>(&Value::Tag(tag, Box::new(Value::Array(items)))).unwrap()
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn sign1_create_and_verify<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
    other_p256_key: Ec2KeyMaterial,
) {
    let message = create_sign1(&mut backend, "ES256", Signer::new(p256_key.full()))
        .expect("unable to create message");
    // Tag 18, array of 4, protected header {1: -7}.
    assert_eq!(&message[..6], &[0xD2, 0x84, 0x43, 0xA1, 0x01, 0x26]);
    assert_eq!(message_items(&message)[3].as_bytes().map(Vec::len), Some(64));

    let payload = signed::verify(
        &mut backend,
        &message,
        Verifier::new(p256_key.public()),
        &ReadOptions::default(),
    )
    .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);

    let result = signed::verify(
        &mut backend,
        &message,
        Verifier::new(other_p256_key.public()),
        &ReadOptions::default(),
    );
    assert!(matches!(result, Err(CoseCipherError::SignatureMismatch(p)) if p == PAYLOAD));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn sign1_p521<B: SignCryptoBackend>(#[case] mut backend: B, p521_key: Ec2KeyMaterial) {
    let message = create_sign1(&mut backend, "ES512", Signer::new(p521_key.full()))
        .expect("unable to create message");
    // Both components are padded to 66 bytes.
    assert_eq!(message_items(&message)[3].as_bytes().map(Vec::len), Some(132));

    let payload = signed::verify(
        &mut backend,
        &message,
        Verifier::new(p521_key.public()),
        &ReadOptions::default(),
    )
    .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);
}

#[cfg(feature = "rustcrypto-rsa")]
#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[case::rustcrypto(rustcrypto_ctx())]
fn sign1_rsa<B: SignCryptoBackend>(#[case] mut backend: B) {
    // Key generation is slow, so all algorithms share one key.
    let key = rsa_key();
    for alg in ["PS256", "PS384", "PS512", "RS256", "RS384", "RS512"] {
        let message = create_sign1(&mut backend, alg, Signer::new(key.full()))
            .expect("unable to create message");
        assert_eq!(message_items(&message)[3].as_bytes().map(Vec::len), Some(256));

        let payload = signed::verify(
            &mut backend,
            &message,
            Verifier::new(key.public()),
            &ReadOptions::default(),
        )
        .expect("unable to verify message");
        assert_eq!(payload, PAYLOAD);
    }

    let public = key.public();
    let result = create_sign1(&mut backend, "PS256", Signer::new(public));
    assert!(matches!(result, Err(CoseCipherError::InvalidKey(_))));
}

#[cfg(all(feature = "openssl", feature = "rustcrypto-ecdsa"))]
#[rstest]
fn backends_agree(
    #[values("ES256", "ES512")] alg: &str,
    p256_key: Ec2KeyMaterial,
    p521_key: Ec2KeyMaterial,
) {
    let key = if alg == "ES256" { p256_key } else { p521_key };
    let message = create_sign1(&mut rustcrypto_ctx(), alg, Signer::new(key.full()))
        .expect("unable to create message");
    signed::verify(
        &mut openssl_ctx(),
        &message,
        Verifier::new(key.public()),
        &ReadOptions::default(),
    )
    .expect("unable to verify message created by rustcrypto");

    let message = create_sign1(&mut openssl_ctx(), alg, Signer::new(key.full()))
        .expect("unable to create message");
    signed::verify(
        &mut rustcrypto_ctx(),
        &message,
        Verifier::new(key.public()),
        &ReadOptions::default(),
    )
    .expect("unable to verify message created by openssl");
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn tampered_payload_is_rejected<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
) {
    let message = create_sign1(&mut backend, "ES256", Signer::new(p256_key.full())).unwrap();
    let mut items = message_items(&message);
    items[2] = Value::Bytes(b"Unimportant message".to_vec());
    let tampered = tagged(18, items);

    let result = signed::verify(
        &mut backend,
        &tampered,
        Verifier::new(p256_key.public()),
        &ReadOptions::default(),
    );
    assert!(matches!(
        result,
        Err(CoseCipherError::SignatureMismatch(p)) if p == b"Unimportant message"
    ));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn external_aad_is_authenticated<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
) {
    let signer = Signer::new(p256_key.full()).with_external_aad(b"context");
    let message = create_sign1(&mut backend, "ES256", signer).expect("unable to create message");

    let verifier = Verifier::new(p256_key.public());
    let payload = signed::verify(
        &mut backend,
        &message,
        verifier.with_external_aad(b"context"),
        &ReadOptions::default(),
    )
    .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);

    let result = signed::verify(&mut backend, &message, verifier, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::SignatureMismatch(_))));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn sign_with_signer_list<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
) {
    let signer = Signer::new(p256_key.full()).with_headers(
        NamedHeaders::new().with("alg", "ES256"),
        NamedHeaders::new().with("kid", "11"),
    );
    let message = signed::create(
        &mut backend,
        &CoseHeaders::default(),
        PAYLOAD,
        &Recipients::Many(vec![signer]),
        &SignCreateOptions::default(),
    )
    .expect("unable to create message");
    // Tag 98, array of 4, empty protected header.
    assert_eq!(&message[..5], &[0xD8, 0x62, 0x84, 0x41, 0xA0]);

    let verifier = Verifier::new(p256_key.public());
    let payload = signed::verify(
        &mut backend,
        &message,
        verifier.with_kid(b"11"),
        &ReadOptions::default(),
    )
    .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);

    let result = signed::verify(
        &mut backend,
        &message,
        verifier.with_kid(b"22"),
        &ReadOptions::default(),
    );
    assert!(matches!(
        result,
        Err(CoseCipherError::SignerNotFound(Some(kid))) if kid == b"11"
    ));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn verifier_is_resolved_by_kid<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
    other_p256_key: Ec2KeyMaterial,
) {
    let message = create_sign1(&mut backend, "ES256", Signer::new(p256_key.full())).unwrap();

    let mut asked = Vec::new();
    let resolver = |kid: Option<&[u8]>| {
        asked.push(kid.map(<[u8]>::to_vec));
        match kid {
            Some(b"11") => Some(Verifier::new(p256_key.public())),
            Some(b"22") => Some(Verifier::new(other_p256_key.public())),
            _ => None,
        }
    };
    let payload = signed::verify(&mut backend, &message, resolver, &ReadOptions::default())
        .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);
    assert_eq!(asked, vec![Some(b"11".to_vec())]);

    let result = signed::verify(
        &mut backend,
        &message,
        |_: Option<&[u8]>| -> Option<Verifier<'static>> { None },
        &ReadOptions::default(),
    );
    assert!(matches!(
        result,
        Err(CoseCipherError::SignerNotFound(Some(kid))) if kid == b"11"
    ));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn algorithm_and_key_are_checked<B: SignCryptoBackend>(
    #[case] mut backend: B,
    p256_key: Ec2KeyMaterial,
) {
    let not_a_signature = create_sign1(&mut backend, "SHA-256", Signer::new(p256_key.full()));
    assert!(matches!(
        not_a_signature,
        Err(CoseCipherError::UnsupportedAlgorithm(5))
    ));

    let wrong_key_type = create_sign1(&mut backend, "PS256", Signer::new(p256_key.full()));
    assert!(matches!(wrong_key_type, Err(CoseCipherError::InvalidKey(_))));

    let missing = signed::create(
        &mut backend,
        &CoseHeaders::default(),
        PAYLOAD,
        &Recipients::One(Signer::new(p256_key.full())),
        &SignCreateOptions::default(),
    );
    assert!(matches!(missing, Err(CoseCipherError::MissingAlg)));

    let none = signed::create(
        &mut backend,
        &headers("ES256"),
        PAYLOAD,
        &Recipients::Many(vec![]),
        &SignCreateOptions::default(),
    );
    assert!(matches!(none, Err(CoseCipherError::NoRecipients)));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn alg_in_unprotected_header<B: SignCryptoBackend>(
    #[case] mut backend: B,
    #[values(ProtectedEncoding::Map, ProtectedEncoding::Empty)] encoding: ProtectedEncoding,
    p256_key: Ec2KeyMaterial,
) {
    let options = SignCreateOptions::builder()
        .encode_protected(encoding)
        .build()
        .unwrap();
    let message = signed::create(
        &mut backend,
        &CoseHeaders::new(NamedHeaders::new(), NamedHeaders::new().with("alg", "ES256")),
        PAYLOAD,
        &Recipients::One(Signer::new(p256_key.full())),
        &options,
    )
    .expect("unable to create message");
    match encoding {
        ProtectedEncoding::Map => assert_eq!(&message[2..4], &[0x41, 0xA0]),
        ProtectedEncoding::Empty => assert_eq!(message[2], 0x40),
    }

    let payload = signed::verify(
        &mut backend,
        &message,
        Verifier::new(p256_key.public()),
        &ReadOptions::default(),
    )
    .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn untagged_messages<B: SignCryptoBackend>(#[case] mut backend: B, p256_key: Ec2KeyMaterial) {
    let options = SignCreateOptions::builder().exclude_tag(true).build().unwrap();
    let message = signed::create(
        &mut backend,
        &headers("ES256"),
        PAYLOAD,
        &Recipients::One(Signer::new(p256_key.full())),
        &options,
    )
    .expect("unable to create message");
    assert_eq!(message[0], 0x84);

    // Untagged messages are read as COSE_Sign unless configured otherwise.
    let verifier = Verifier::new(p256_key.public());
    let result = signed::verify(&mut backend, &message, verifier, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));

    let sign1 = ReadOptions::builder()
        .default_kind(MessageKind::Sign1)
        .build()
        .unwrap();
    let payload = signed::verify(&mut backend, &message, verifier, &sign1)
        .expect("unable to verify message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-ecdsa", case::rustcrypto(rustcrypto_ctx()))]
fn malformed_messages<B: SignCryptoBackend>(#[case] mut backend: B, p256_key: Ec2KeyMaterial) {
    let verifier = Verifier::new(p256_key.public());
    let message = create_sign1(&mut backend, "ES256", Signer::new(p256_key.full())).unwrap();
    let items = message_items(&message);

    let wrong_tag = tagged(17, items.clone());
    let result = signed::verify(&mut backend, &wrong_tag, verifier, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::UnexpectedTag(17))));

    let short = tagged(18, items[..3].to_vec());
    let result = signed::verify(&mut backend, &short, verifier, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));

    let mut bad_signers = items;
    bad_signers[3] = Value::Array(vec![Value::Bytes(vec![])]);
    let result = signed::verify(
        &mut backend,
        &tagged(98, bad_signers),
        verifier,
        &ReadOptions::default(),
    );
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));
}
