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
use alloc::vec::Vec;
use coset::iana;
use coset::iana::EnumI64;
use digest::{KeyInit, Mac};
use hmac::Hmac;
use rand::{CryptoRng, RngCore};
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm;
use crate::crypto_impl::rustcrypto::RustCryptoContext;
use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;

impl<RNG: RngCore + CryptoRng> RustCryptoContext<RNG> {
    /// Compute the HMAC of `payload` using the given `key` with the HMAC function
    /// `MAC`.
    ///
    /// HMAC keys may have any length, keys longer than the block size are hashed first.
    fn compute_hmac_using_mac<MAC: Mac + KeyInit>(
        key: &CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>> {
        let mut hmac = <MAC as Mac>::new_from_slice(key.k)?;
        hmac.update(payload);
        Ok(hmac.finalize().into_bytes().to_vec())
    }

    /// Verify the (possibly truncated) HMAC `tag` of `payload` using the given `key` with the HMAC
    /// function `MAC`.
    fn verify_hmac_using_mac<MAC: Mac + KeyInit>(
        key: &CoseSymmetricKey<'_>,
        payload: &[u8],
        tag: &[u8],
        tag_len: usize,
    ) -> Result<(), CoseCipherError<<Self as CryptoBackend>::Error>> {
        let mut hmac = <MAC as Mac>::new_from_slice(key.k)?;
        hmac.update(payload);

        // verify_truncated_left() accepts any tag length up to the output size.
        if tag.len() != tag_len {
            return Err(CoseCipherError::VerificationFailure);
        }

        hmac.verify_truncated_left(tag).map_err(CoseCipherError::from)
    }

    /// Compute the HMAC of `payload` using the given `key` with the HMAC function
    /// specified in the `algorithm`.
    ///
    /// The full output of the HMAC is returned, truncation is up to the caller.
    pub(super) fn compute_hmac(
        algorithm: iana::Algorithm,
        key: &CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>> {
        match algorithm {
            iana::Algorithm::HMAC_256_64 | iana::Algorithm::HMAC_256_256 => {
                Self::compute_hmac_using_mac::<Hmac<Sha256>>(key, payload)
            }
            iana::Algorithm::HMAC_384_384 => {
                Self::compute_hmac_using_mac::<Hmac<Sha384>>(key, payload)
            }
            iana::Algorithm::HMAC_512_512 => {
                Self::compute_hmac_using_mac::<Hmac<Sha512>>(key, payload)
            }
            a => Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        }
    }

    /// Verify the HMAC `tag` of `payload` using the given `key` with the HMAC
    /// function specified in the `algorithm`.
    pub(super) fn verify_hmac(
        algorithm: iana::Algorithm,
        key: &CoseSymmetricKey<'_>,
        tag: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<<Self as CryptoBackend>::Error>> {
        let tag_len = algorithm::mac_tag_len(algorithm.to_i64())?;
        match algorithm {
            iana::Algorithm::HMAC_256_64 | iana::Algorithm::HMAC_256_256 => {
                Self::verify_hmac_using_mac::<Hmac<Sha256>>(key, payload, tag, tag_len)
            }
            iana::Algorithm::HMAC_384_384 => {
                Self::verify_hmac_using_mac::<Hmac<Sha384>>(key, payload, tag, tag_len)
            }
            iana::Algorithm::HMAC_512_512 => {
                Self::verify_hmac_using_mac::<Hmac<Sha512>>(key, payload, tag, tag_len)
            }
            a => Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        }
    }
}
