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
use crate::maced::{self, MacCreateOptions, MacCryptoBackend, MacRecipient};
use crate::test_helper::{b64, unhex};

#[cfg(feature = "openssl")]
use crate::test_helper::openssl_ctx;
#[cfg(any(feature = "rustcrypto-hmac", feature = "rustcrypto-aes-cbc-mac"))]
use crate::test_helper::rustcrypto_ctx;

const PAYLOAD: &[u8] = b"Important message!";
const KEY_HEX: &str = "231f4c4d4d3051fdc2ec0a3851d5b383";

/// `mac0-tests/mac-pass-01` from the `cose-wg/Examples` repository.
const MAC_PASS_01: &str = "D18441A0A1010554546869732069732074686520636F6E74656E742E5820176DCE14C1E57430C13658233F41DC89AA4FA0FF9B8783F23B0EF51CA6B026BC";
/// `mac0-tests/mac-fail-02` from the `cose-wg/Examples` repository (tag is invalid).
const MAC_FAIL_02: &str = "D18443A10105A054546869732069732074686520636F6E74656E742E5820A1A848D3471F9D61EE49018D244C824772F223AD4F935293F1789FC3A08D8C59";
const EXAMPLE_KEY: &str = "hJtXIZ2uSN5kbQfbtTNWbpdmhkV8FJG-Onbc6mxCcYg";

fn headers(alg: &str) -> CoseHeaders {
    CoseHeaders::new(
        NamedHeaders::new().with("alg", alg),
        NamedHeaders::new().with("kid", "our-secret"),
    )
}

fn create_mac0<B: MacCryptoBackend>(
    backend: &mut B,
    alg: &str,
    key: &[u8],
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    maced::create(
        backend,
        &headers(alg),
        PAYLOAD,
        &Recipients::One(MacRecipient::new(key)),
        None,
        &MacCreateOptions::default(),
    )
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn cose_examples_mac_pass_01<B: MacCryptoBackend>(#[case] mut backend: B) {
    let payload = maced::read(
        &mut backend,
        &unhex(MAC_PASS_01),
        &b64(EXAMPLE_KEY),
        None,
        &ReadOptions::default(),
    )
    .expect("unable to verify reference message");
    assert_eq!(payload, b"This is the content.");
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn cose_examples_mac_fail_02<B: MacCryptoBackend>(#[case] mut backend: B) {
    let result = maced::read(
        &mut backend,
        &unhex(MAC_FAIL_02),
        &b64(EXAMPLE_KEY),
        None,
        &ReadOptions::default(),
    );
    assert!(matches!(result, Err(CoseCipherError::TagMismatch)));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn mac0_create_and_read<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let message = create_mac0(&mut backend, "SHA-256", &key).expect("unable to create message");
    // Tag 17, array of 4, protected header {1: 5}.
    assert_eq!(&message[..5], &[0xD1, 0x84, 0x43, 0xA1, 0x01]);

    let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);

    let mut wrong_key = key.clone();
    wrong_key[0] ^= 0x01;
    let result = maced::read(
        &mut backend,
        &message,
        &wrong_key,
        None,
        &ReadOptions::default(),
    );
    assert!(matches!(result, Err(CoseCipherError::TagMismatch)));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn mac0_tag_is_truncated<B: MacCryptoBackend>(
    #[case] mut backend: B,
    #[values(("SHA-256_64", 8), ("SHA-256", 32), ("SHA-384", 48), ("SHA-512", 64))]
    alg: (&str, usize),
) {
    let (alg, tag_len) = alg;
    let key = unhex(KEY_HEX);
    let message = create_mac0(&mut backend, alg, &key).expect("unable to create message");
    let Value::Tag(_, inner) = framing::decode_first::<()>(&message).unwrap() else {
        panic!("message is not tagged");
    };
    let Value::Array(items) = *inner else {
        panic!("message is not an array");
    };
    assert_eq!(items[3].as_bytes().map(Vec::len), Some(tag_len));

    let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-aes-cbc-mac", case::rustcrypto(rustcrypto_ctx()))]
fn mac0_cbc_mac<B: MacCryptoBackend>(
    #[case] mut backend: B,
    #[values(
        ("AES-MAC-128/64", 16),
        ("AES-MAC-256/64", 32),
        ("AES-MAC-128/128", 16),
        ("AES-MAC-256/128", 32)
    )]
    alg: (&str, usize),
) {
    let (alg, key_len) = alg;
    let key: Vec<u8> = (0..key_len as u8).collect();
    let message = create_mac0(&mut backend, alg, &key).expect("unable to create message");
    let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);

    let result = create_mac0(&mut backend, alg, &key[1..]);
    assert!(matches!(result, Err(CoseCipherError::InvalidKey(_))));
}

#[cfg(all(feature = "openssl", feature = "rustcrypto-hmac", feature = "rustcrypto-aes-cbc-mac"))]
#[rstest]
fn backends_agree(
    #[values("SHA-256_64", "SHA-512", "AES-MAC-128/64", "AES-MAC-128/128")] alg: &str,
) {
    let key: Vec<u8> = (0..16).collect();
    let message =
        create_mac0(&mut rustcrypto_ctx(), alg, &key).expect("unable to create message");
    let payload = maced::read(
        &mut openssl_ctx(),
        &message,
        &key,
        None,
        &ReadOptions::default(),
    )
    .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn external_aad_is_authenticated<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let message = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::One(MacRecipient::new(&key)),
        Some(b"context".as_slice()),
        &MacCreateOptions::default(),
    )
    .expect("unable to create message");

    let payload = maced::read(
        &mut backend,
        &message,
        &key,
        Some(b"context".as_slice()),
        &ReadOptions::default(),
    )
    .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);

    let result = maced::read(&mut backend, &message, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::TagMismatch)));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn tampered_tag_is_rejected<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let mut message = create_mac0(&mut backend, "SHA-256", &key).unwrap();
    let last = message.len() - 1;
    message[last] ^= 0x80;
    let result = maced::read(&mut backend, &message, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::TagMismatch)));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn mac_with_single_recipient<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let recipient = MacRecipient::new(&key)
        .with_unprotected(NamedHeaders::new().with("alg", "direct").with("kid", "our-secret"));
    let message = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::Many(vec![recipient]),
        None,
        &MacCreateOptions::default(),
    )
    .expect("unable to create message");
    // Tag 97, array of 5.
    assert_eq!(&message[..3], &[0xD8, 0x61, 0x85]);

    let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn recipient_count_is_checked<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let none = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::Many(vec![]),
        None,
        &MacCreateOptions::default(),
    );
    assert!(matches!(none, Err(CoseCipherError::NoRecipients)));

    let two = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::Many(vec![MacRecipient::new(&key), MacRecipient::new(&key)]),
        None,
        &MacCreateOptions::default(),
    );
    assert!(matches!(two, Err(CoseCipherError::TooManyRecipients(2))));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn algorithm_is_checked<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let missing = maced::create(
        &mut backend,
        &CoseHeaders::new(NamedHeaders::new(), NamedHeaders::new().with("kid", "k")),
        PAYLOAD,
        &Recipients::One(MacRecipient::new(&key)),
        None,
        &MacCreateOptions::default(),
    );
    assert!(matches!(missing, Err(CoseCipherError::MissingAlg)));

    let not_a_mac = create_mac0(&mut backend, "A128GCM", &key);
    assert!(matches!(
        not_a_mac,
        Err(CoseCipherError::UnsupportedAlgorithm(1))
    ));
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn alg_in_unprotected_header<B: MacCryptoBackend>(
    #[case] mut backend: B,
    #[values(ProtectedEncoding::Map, ProtectedEncoding::Empty)] encoding: ProtectedEncoding,
) {
    let key = unhex(KEY_HEX);
    let options = MacCreateOptions::builder()
        .encode_protected(encoding)
        .build()
        .unwrap();
    let message = maced::create(
        &mut backend,
        &CoseHeaders::new(NamedHeaders::new(), NamedHeaders::new().with("alg", "SHA-256")),
        PAYLOAD,
        &Recipients::One(MacRecipient::new(&key)),
        None,
        &options,
    )
    .expect("unable to create message");
    match encoding {
        ProtectedEncoding::Map => assert_eq!(&message[2..4], &[0x41, 0xA0]),
        ProtectedEncoding::Empty => assert_eq!(message[2], 0x40),
    }

    let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn empty_protected_header_is_authenticated_as_empty_bytes<B: MacCryptoBackend>(
    #[case] mut backend: B,
) {
    let key = b64(EXAMPLE_KEY);
    let headers = CoseHeaders::new(NamedHeaders::new(), NamedHeaders::new().with("alg", "SHA-256"));
    let create = |backend: &mut B, encoding: ProtectedEncoding| {
        let options = MacCreateOptions::builder()
            .encode_protected(encoding)
            .build()
            .unwrap();
        maced::create(
            backend,
            &headers,
            b"This is the content.",
            &Recipients::One(MacRecipient::new(&key)),
            None,
            &options,
        )
        .expect("unable to create message")
    };

    // Both wire forms carry the tag of the reference message.
    let as_map = create(&mut backend, ProtectedEncoding::Map);
    assert_eq!(as_map, unhex(MAC_PASS_01));
    let as_empty = create(&mut backend, ProtectedEncoding::Empty);
    assert_eq!(as_empty, unhex(&MAC_PASS_01.replacen("41A0", "40", 1)));
    assert_eq!(&as_map[as_map.len() - 32..], &as_empty[as_empty.len() - 32..]);

    let payload = maced::read(&mut backend, &as_empty, &key, None, &ReadOptions::default())
        .expect("unable to read message");
    assert_eq!(payload, b"This is the content.");
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn untagged_messages<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = unhex(KEY_HEX);
    let options = MacCreateOptions::builder().exclude_tag(true).build().unwrap();
    let mac0 = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::One(MacRecipient::new(&key)),
        None,
        &options,
    )
    .unwrap();
    assert_eq!(mac0[0], 0x84);
    let payload = maced::read(&mut backend, &mac0, &key, None, &ReadOptions::default()).unwrap();
    assert_eq!(payload, PAYLOAD);

    let mac = maced::create(
        &mut backend,
        &headers("SHA-256"),
        PAYLOAD,
        &Recipients::Many(vec![MacRecipient::new(&key)]),
        None,
        &options,
    )
    .unwrap();
    assert_eq!(mac[0], 0x85);
    // Untagged messages are COSE_Mac0 unless stated otherwise.
    let result = maced::read(&mut backend, &mac, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));

    let read_options = ReadOptions::builder()
        .default_kind(MessageKind::Mac)
        .build()
        .unwrap();
    let payload = maced::read(&mut backend, &mac, &key, None, &read_options).unwrap();
    assert_eq!(payload, PAYLOAD);
}

#[rstest]
#[cfg_attr(feature = "openssl", case::openssl(openssl_ctx()))]
#[cfg_attr(feature = "rustcrypto-hmac", case::rustcrypto(rustcrypto_ctx()))]
fn malformed_messages<B: MacCryptoBackend>(#[case] mut backend: B) {
    let key = b64(EXAMPLE_KEY);
    let mut sign1 = unhex(MAC_PASS_01);
    sign1[0] = 0xD2;
    let result = maced::read(&mut backend, &sign1, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::UnexpectedTag(18))));

    let short = framing::encode::<()>(&Value::Tag(
        17,
        Box::new(Value::Array(vec![
            Value::Bytes(vec![]),
            Value::Map(vec![]),
            Value::Bytes(PAYLOAD.to_vec()),
        ])),
    ))
    .unwrap();
    let result = maced::read(&mut backend, &short, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));

    let detached = framing::encode::<()>(&Value::Tag(
        17,
        Box::new(Value::Array(vec![
            Value::Bytes(vec![0xA1, 0x01, 0x05]),
            Value::Map(vec![]),
            Value::Null,
            Value::Bytes(vec![0; 32]),
        ])),
    ))
    .unwrap();
    let result = maced::read(&mut backend, &detached, &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::MalformedMessage(_))));

    let result = maced::read(&mut backend, &[0xFF], &key, None, &ReadOptions::default());
    assert!(matches!(result, Err(CoseCipherError::CborDecode(_))));
}
