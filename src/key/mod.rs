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

//! Borrowed views on the key material used by the backends.
//!
//! Keys are only ever borrowed for the duration of a single operation.

use alloc::format;

use coset::iana;
use coset::iana::EnumI64;

use crate::error::CoseCipherError;

#[cfg(test)]
mod tests;

/// A symmetric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoseSymmetricKey<'a> {
    /// The raw key bytes.
    pub k: &'a [u8],
}

impl<'a> CoseSymmetricKey<'a> {
    /// Wraps the raw key bytes `k`.
    #[must_use]
    pub fn new(k: &'a [u8]) -> CoseSymmetricKey<'a> {
        CoseSymmetricKey { k }
    }
}

/// An elliptic curve key in uncompressed form.
///
/// For signing, `d` must be set. For verification, `x` and `y` must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoseEc2Key<'a> {
    /// The curve this key belongs to.
    pub crv: iana::EllipticCurve,
    /// Private key scalar.
    pub d: Option<&'a [u8]>,
    /// X coordinate of the public key.
    pub x: Option<&'a [u8]>,
    /// Y coordinate of the public key.
    pub y: Option<&'a [u8]>,
}

impl<'a> CoseEc2Key<'a> {
    /// Creates a private key.
    #[must_use]
    pub fn private(crv: iana::EllipticCurve, d: &'a [u8]) -> CoseEc2Key<'a> {
        CoseEc2Key {
            crv,
            d: Some(d),
            x: None,
            y: None,
        }
    }

    /// Creates a public key from its affine coordinates.
    #[must_use]
    pub fn public(crv: iana::EllipticCurve, x: &'a [u8], y: &'a [u8]) -> CoseEc2Key<'a> {
        CoseEc2Key {
            crv,
            d: None,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Size of a field element (and scalar) of the key's curve in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::UnsupportedCurve`] for curves other than P-256, P-384 and P-521.
    pub fn field_len<T>(&self) -> Result<usize, CoseCipherError<T>> {
        match self.crv {
            iana::EllipticCurve::P_256 => Ok(32),
            iana::EllipticCurve::P_384 => Ok(48),
            iana::EllipticCurve::P_521 => Ok(66),
            v => Err(CoseCipherError::UnsupportedCurve(v.to_i64())),
        }
    }

    /// Returns the private scalar, checking its length.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::InvalidKey`] if `d` is missing or has the wrong length.
    pub fn private_scalar<T>(&self) -> Result<&'a [u8], CoseCipherError<T>> {
        let len = self.field_len()?;
        match self.d {
            Some(d) if d.len() == len => Ok(d),
            Some(d) => Err(CoseCipherError::InvalidKey(format!(
                "private key has length {}, expected {len}",
                d.len()
            ))),
            None => Err(CoseCipherError::InvalidKey(
                "key has no private component".into(),
            )),
        }
    }

    /// Returns the public coordinates, checking their lengths.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::InvalidKey`] if `x` or `y` is missing or has the wrong length.
    pub fn public_coordinates<T>(&self) -> Result<(&'a [u8], &'a [u8]), CoseCipherError<T>> {
        let len = self.field_len()?;
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.len() == len && y.len() == len => Ok((x, y)),
            (Some(_), Some(_)) => Err(CoseCipherError::InvalidKey(format!(
                "public key coordinates must have length {len}"
            ))),
            _ => Err(CoseCipherError::InvalidKey(
                "key has no public component".into(),
            )),
        }
    }
}

/// An RSA key given by its big-endian components.
///
/// For verification, `n` and `e` suffice. For signing, `d`, `p` and `q` must be set as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoseRsaKey<'a> {
    /// Modulus.
    pub n: &'a [u8],
    /// Public exponent.
    pub e: &'a [u8],
    /// Private exponent.
    pub d: Option<&'a [u8]>,
    /// First prime factor.
    pub p: Option<&'a [u8]>,
    /// Second prime factor.
    pub q: Option<&'a [u8]>,
}

impl<'a> CoseRsaKey<'a> {
    /// Creates a public key.
    #[must_use]
    pub fn public(n: &'a [u8], e: &'a [u8]) -> CoseRsaKey<'a> {
        CoseRsaKey {
            n,
            e,
            d: None,
            p: None,
            q: None,
        }
    }

    /// Creates a private key.
    #[must_use]
    pub fn private(
        n: &'a [u8],
        e: &'a [u8],
        d: &'a [u8],
        p: &'a [u8],
        q: &'a [u8],
    ) -> CoseRsaKey<'a> {
        CoseRsaKey {
            n,
            e,
            d: Some(d),
            p: Some(p),
            q: Some(q),
        }
    }

    /// Returns `(d, p, q)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::InvalidKey`] if one of them is missing.
    pub fn private_components<T>(
        &self,
    ) -> Result<(&'a [u8], &'a [u8], &'a [u8]), CoseCipherError<T>> {
        match (self.d, self.p, self.q) {
            (Some(d), Some(p), Some(q)) => Ok((d, p, q)),
            _ => Err(CoseCipherError::InvalidKey(
                "RSA private key requires d, p and q".into(),
            )),
        }
    }
}

/// Key material of a signer or verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAsymmetricKey<'a> {
    /// Elliptic curve key (ECDSA).
    Ec2(CoseEc2Key<'a>),
    /// RSA key (RSASSA-PKCS1-v1_5 and RSASSA-PSS).
    Rsa(CoseRsaKey<'a>),
}

impl<'a> From<CoseEc2Key<'a>> for CoseAsymmetricKey<'a> {
    fn from(value: CoseEc2Key<'a>) -> Self {
        CoseAsymmetricKey::Ec2(value)
    }
}

impl<'a> From<CoseRsaKey<'a>> for CoseAsymmetricKey<'a> {
    fn from(value: CoseRsaKey<'a>) -> Self {
        CoseAsymmetricKey::Rsa(value)
    }
}
