/*
 * Copyright (c) 2024 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use core::convert::Infallible;

use ciborium::Value;
use coset::iana;
use rstest::rstest;

use super::*;

#[rstest]
#[case("ES256", -7)]
#[case("ES384", -35)]
#[case("ES512", -36)]
#[case("RS256", -257)]
#[case("RS384", -258)]
#[case("RS512", -259)]
#[case("PS256", -37)]
#[case("direct", -6)]
#[case("A128GCM", 1)]
#[case("A192GCM", 2)]
#[case("A256GCM", 3)]
#[case("SHA-256_64", 4)]
#[case("HS256/64", 4)]
#[case("SHA-256", 5)]
#[case("HS256", 5)]
#[case("SHA-384", 6)]
#[case("SHA-512", 7)]
#[case("AES-CCM-16-64-128", 10)]
#[case("AES-MAC-128/64", 14)]
#[case("AES-MAC-256/128", 26)]
fn registry_values(#[case] name: &str, #[case] code: i64) {
    let entry = by_name::<Infallible>(name).expect("algorithm should be known");
    assert_eq!(entry.code(), code);
    assert_eq!(resolve::<Infallible>(code).unwrap(), entry);
}

#[rstest]
#[case(4, 8)]
#[case(5, 32)]
#[case(6, 48)]
#[case(7, 64)]
#[case(14, 8)]
#[case(15, 8)]
#[case(25, 16)]
#[case(26, 16)]
fn mac_truncation(#[case] code: i64, #[case] len: usize) {
    assert_eq!(mac_tag_len::<Infallible>(code), Ok(len));
}

#[test]
fn mac_tag_len_of_non_mac_algorithm() {
    assert_eq!(
        mac_tag_len::<Infallible>(1),
        Err(CoseCipherError::UnsupportedAlgorithm(1))
    );
}

#[test]
fn unregistered_code_is_unknown() {
    assert_eq!(
        resolve::<Infallible>(12345),
        Err(CoseCipherError::UnknownAlgorithm(Value::from(12345)))
    );
}

#[test]
fn registered_but_unsupported() {
    let eddsa = iana::Algorithm::EdDSA as i64;
    assert_eq!(
        resolve::<Infallible>(eddsa),
        Err(CoseCipherError::UnsupportedAlgorithm(eddsa))
    );
}

#[test]
fn unknown_mnemonic() {
    assert_eq!(
        by_name::<Infallible>("HS1024"),
        Err(CoseCipherError::UnknownAlgorithm(Value::Text(
            "HS1024".into()
        )))
    );
}

#[test]
fn non_integer_header_value() {
    let value = Value::Text("A128GCM".into());
    assert_eq!(
        resolve_value::<Infallible>(&value),
        Err(CoseCipherError::UnknownAlgorithm(value.clone()))
    );
}

#[test]
fn aead_parameters() {
    let gcm = by_name::<Infallible>("A256GCM").unwrap();
    assert_eq!(gcm.nonce_len(), Some(12));
    assert_eq!(gcm.aead_tag_len(), Some(16));
    assert_eq!(gcm.symmetric_key_len(), Some(32));
    let ccm = by_name::<Infallible>("AES-CCM-64-128-128").unwrap();
    assert_eq!(ccm.nonce_len(), Some(7));
    assert_eq!(ccm.aead_tag_len(), Some(16));
    assert!(ccm.is_aead() && !ccm.is_mac() && !ccm.is_signature());
}

#[test]
fn names_are_unique() {
    for (i, a) in ALGORITHMS.iter().enumerate() {
        for b in &ALGORITHMS[i + 1..] {
            assert_ne!(a.alg, b.alg);
            assert!(a.names.iter().all(|n| !b.names.contains(n)));
        }
    }
}
