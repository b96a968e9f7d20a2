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

use alloc::vec;
use core::convert::Infallible;

use coset::iana;
use coset::iana::EnumI64;
use rstest::rstest;

use super::*;

type Error = CoseCipherError<Infallible>;

#[rstest]
#[case(iana::EllipticCurve::P_256, 32)]
#[case(iana::EllipticCurve::P_384, 48)]
#[case(iana::EllipticCurve::P_521, 66)]
fn field_lengths(#[case] crv: iana::EllipticCurve, #[case] len: usize) {
    let d = vec![1u8; len];
    let key = CoseEc2Key::private(crv, &d);
    assert_eq!(key.field_len::<Infallible>(), Ok(len));
    assert_eq!(key.private_scalar::<Infallible>(), Ok(d.as_slice()));
}

#[test]
fn unsupported_curve() {
    let key = CoseEc2Key::private(iana::EllipticCurve::Secp256k1, &[1; 32]);
    assert_eq!(
        key.private_scalar::<Infallible>(),
        Err(Error::UnsupportedCurve(
            iana::EllipticCurve::Secp256k1.to_i64()
        ))
    );
}

#[test]
fn short_coordinates_are_rejected() {
    let key = CoseEc2Key::public(iana::EllipticCurve::P_256, &[1; 32], &[2; 31]);
    assert!(matches!(
        key.public_coordinates::<Infallible>(),
        Err(Error::InvalidKey(_))
    ));
    assert!(matches!(
        key.private_scalar::<Infallible>(),
        Err(Error::InvalidKey(_))
    ));
}

#[test]
fn rsa_public_key_cannot_sign() {
    let key = CoseRsaKey::public(&[0xc5; 128], &[1, 0, 1]);
    assert!(matches!(
        key.private_components::<Infallible>(),
        Err(Error::InvalidKey(_))
    ));
    assert!(matches!(
        CoseAsymmetricKey::from(key),
        CoseAsymmetricKey::Rsa(_)
    ));
}
