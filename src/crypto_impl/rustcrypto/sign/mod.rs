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
use rand::{CryptoRng, RngCore};

use crate::crypto_impl::rustcrypto::RustCryptoContext;
use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseRsaKey};
use crate::signed::SignCryptoBackend;

#[cfg(feature = "rustcrypto-ecdsa")]
mod ecdsa;
#[cfg(feature = "rustcrypto-rsa")]
mod rsa;

impl<RNG: RngCore + CryptoRng> SignCryptoBackend for RustCryptoContext<RNG> {
    #[cfg(feature = "rustcrypto-ecdsa")]
    fn sign_ecdsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        RustCryptoContext::sign_ecdsa(self, algorithm, key, payload)
    }

    #[cfg(feature = "rustcrypto-ecdsa")]
    fn verify_ecdsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        sig: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Self::verify_ecdsa(algorithm, key, sig, payload)
    }

    #[cfg(feature = "rustcrypto-rsa")]
    fn sign_rsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        RustCryptoContext::sign_rsa(self, algorithm, key, payload)
    }

    #[cfg(feature = "rustcrypto-rsa")]
    fn verify_rsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        sig: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Self::verify_rsa(algorithm, key, sig, payload)
    }
}
