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
use rand::{CryptoRng, RngCore};
use strum_macros::Display;

use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;

#[cfg(rustcrypto_encrypt_base)]
mod encrypt;
#[cfg(rustcrypto_mac_base)]
mod mac;
#[cfg(rustcrypto_sign_base)]
mod sign;

#[derive(Debug, Display)]
/// Errors that might be returned from the `RustCrypto` cryptographic backend.
pub enum CoseRustCryptoCipherError {
    /// Provided parameter has invalid length.
    #[cfg(rustcrypto_mac_base)]
    InvalidLength(digest::InvalidLength),
    /// Error regarding elliptic curve operations.
    #[cfg(feature = "rustcrypto-ecdsa")]
    EcError(elliptic_curve::Error),
    /// Error in ECDSA operation.
    #[cfg(feature = "rustcrypto-ecdsa")]
    EcdsaError(ecdsa::Error),
    /// Invalid elliptic curve point.
    #[cfg(feature = "rustcrypto-ecdsa")]
    InvalidPoint,
    /// Error in RSA key handling or signing.
    #[cfg(feature = "rustcrypto-rsa")]
    RsaError(rsa::Error),
    /// Error in an RSA signature operation.
    #[cfg(feature = "rustcrypto-rsa")]
    RsaSignatureError(rsa::signature::Error),
}

#[cfg(rustcrypto_mac_base)]
impl From<digest::InvalidLength> for CoseRustCryptoCipherError {
    fn from(value: digest::InvalidLength) -> Self {
        CoseRustCryptoCipherError::InvalidLength(value)
    }
}

#[cfg(feature = "rustcrypto-ecdsa")]
impl From<elliptic_curve::Error> for CoseRustCryptoCipherError {
    fn from(value: elliptic_curve::Error) -> Self {
        CoseRustCryptoCipherError::EcError(value)
    }
}

#[cfg(feature = "rustcrypto-rsa")]
impl From<rsa::Error> for CoseRustCryptoCipherError {
    fn from(value: rsa::Error) -> Self {
        CoseRustCryptoCipherError::RsaError(value)
    }
}

#[cfg(rustcrypto_mac_base)]
impl From<digest::InvalidLength> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: digest::InvalidLength) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::from(value))
    }
}

#[cfg(feature = "rustcrypto-ecdsa")]
impl From<elliptic_curve::Error> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: elliptic_curve::Error) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::EcError(value))
    }
}

#[cfg(feature = "rustcrypto-ecdsa")]
impl From<ecdsa::Error> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: ecdsa::Error) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::EcdsaError(value))
    }
}

#[cfg(feature = "rustcrypto-rsa")]
impl From<rsa::Error> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: rsa::Error) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::RsaError(value))
    }
}

#[cfg(rustcrypto_mac_base)]
impl From<digest::MacError> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(_value: digest::MacError) -> Self {
        CoseCipherError::VerificationFailure
    }
}

#[cfg(rustcrypto_encrypt_base)]
impl From<aead::Error> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(_value: aead::Error) -> Self {
        CoseCipherError::VerificationFailure
    }
}

/// Context for the RustCrypto cryptographic backend
///
/// Can be used as a [`CryptoBackend`] for COSE operations.
///
/// Generic properties of this backend:
/// - [x] Can derive EC public key components if only the private component (d) is present.
/// - [x] Compares MAC tags in constant time.
///
/// Algorithm support:
/// - Signature Algorithms (for COSE_Sign and COSE_Sign1)
///     - [x] ECDSA
///         - [x] ES256
///         - [x] ES384
///         - [x] ES512
///     - [x] RSASSA-PSS
///         - [x] PS256
///         - [x] PS384
///         - [x] PS512
///     - [x] RSASSA-PKCS1-v1_5
///         - [x] RS256
///         - [x] RS384
///         - [x] RS512
/// - Message Authentication Code Algorithms (for COSE_Mac and COSE_Mac0)
///     - [x] HMAC
///         - [x] HMAC 256/64
///         - [x] HMAC 256/256
///         - [x] HMAC 384/384
///         - [x] HMAC 512/512
///     - [x] AES-CBC-MAC
///         - [x] AES-MAC 128/64
///         - [x] AES-MAC 256/64
///         - [x] AES-MAC 128/128
///         - [x] AES-MAC 256/128
/// - Content Encryption Algorithms (for COSE_Encrypt and COSE_Encrypt0)
///     - [x] AES-GCM
///         - [x] A128GCM
///         - [x] A192GCM
///         - [x] A256GCM
///     - [x] AES-CCM
///         - [x] AES-CCM-16-64-128
///         - [x] AES-CCM-16-64-256
///         - [x] AES-CCM-64-64-128
///         - [x] AES-CCM-64-64-256
///         - [x] AES-CCM-16-128-128
///         - [x] AES-CCM-16-128-256
///         - [x] AES-CCM-64-128-128
///         - [x] AES-CCM-64-128-256
///
/// Elliptic Curve support (for EC algorithms):
/// - ES256/ES384 [^1]
///     - [x] P-256
///     - [x] P-384
/// - ES512
///     - [x] P-521 [^2]
///
/// [^1]: RFC 9053, Section 2.1 suggests using ES256 only with curve P-256, ES384 with curve P-384
///       and ES512 only with curve P-521.
/// [^2]: P-521 keys can only be used with ES512.
pub struct RustCryptoContext<RNG: RngCore + CryptoRng> {
    rng: RNG,
}

impl<RNG: RngCore + CryptoRng> RustCryptoContext<RNG> {
    /// Creates a new RustCrypto context for cryptographic COSE operations using the given random
    /// number generator `rng`.
    pub fn new(rng: RNG) -> RustCryptoContext<RNG> {
        RustCryptoContext { rng }
    }
}

impl<RNG: RngCore + CryptoRng> CryptoBackend for RustCryptoContext<RNG> {
    type Error = CoseRustCryptoCipherError;

    fn generate_rand(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.rng.fill_bytes(buf);
        Ok(())
    }
}
