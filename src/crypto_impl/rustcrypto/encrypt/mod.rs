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
use crate::encrypted::EncryptCryptoBackend;
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;

use self::aead::{AeadInput, AeadOp};

mod aead;
#[cfg(feature = "rustcrypto-aes-ccm")]
mod aes_ccm;
#[cfg(feature = "rustcrypto-aes-gcm")]
mod aes_gcm;

impl<RNG: RngCore + CryptoRng> EncryptCryptoBackend for RustCryptoContext<RNG> {
    #[cfg(feature = "rustcrypto-aes-gcm")]
    fn encrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        aes_gcm::aes_gcm(
            AeadOp::Seal,
            algorithm,
            &AeadInput {
                key: &key,
                data: plaintext,
                aad,
                iv,
            },
        )
    }

    #[cfg(feature = "rustcrypto-aes-gcm")]
    fn decrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        aes_gcm::aes_gcm(
            AeadOp::Open,
            algorithm,
            &AeadInput {
                key: &key,
                data: ciphertext_with_tag,
                aad,
                iv,
            },
        )
    }

    #[cfg(feature = "rustcrypto-aes-ccm")]
    fn encrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        aes_ccm::aes_ccm(
            AeadOp::Seal,
            algorithm,
            &AeadInput {
                key: &key,
                data: plaintext,
                aad,
                iv,
            },
        )
    }

    #[cfg(feature = "rustcrypto-aes-ccm")]
    fn decrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        aes_ccm::aes_ccm(
            AeadOp::Open,
            algorithm,
            &AeadInput {
                key: &key,
                data: ciphertext_with_tag,
                aad,
                iv,
            },
        )
    }
}
