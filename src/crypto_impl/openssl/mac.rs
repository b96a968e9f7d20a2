/*
 * Copyright (c) 2022-2024 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use alloc::vec;
use alloc::vec::Vec;

use coset::iana;
use coset::iana::EnumI64;
use openssl::cipher_ctx::CipherCtx;
use openssl::pkey::PKey;
use openssl::sign::Signer;

use crate::algorithm;
use crate::crypto_impl::openssl::{CoseOpensslCipherError, OpensslContext};
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;
use crate::maced::MacCryptoBackend;

const AES_BLOCK_LEN: usize = 16;

/// Computes an HMAC for `input` using the given `algorithm` and `key`.
fn compute_hmac(
    algorithm: iana::Algorithm,
    key: &CoseSymmetricKey<'_>,
    input: &[u8],
) -> Result<Vec<u8>, CoseCipherError<CoseOpensslCipherError>> {
    let hash = super::get_algorithm_hash_function(algorithm)?;
    let hmac_key = PKey::hmac(key.k)?;
    let mut signer = Signer::new(hash, &hmac_key)?;
    signer
        .sign_oneshot_to_vec(input)
        .map_err(CoseCipherError::from)
}

/// Computes the CBC-MAC of `input`, which is the last block of its AES-CBC encryption with a zero
/// IV. The input is padded with zeros to a multiple of the block size.
fn compute_cbc_mac(
    algorithm: iana::Algorithm,
    key: &CoseSymmetricKey<'_>,
    input: &[u8],
) -> Result<Vec<u8>, CoseCipherError<CoseOpensslCipherError>> {
    let cipher = super::algorithm_to_cipher(algorithm)?;
    let blocks = ((input.len() + AES_BLOCK_LEN - 1) / AES_BLOCK_LEN).max(1);
    let mut padded = vec![0u8; blocks * AES_BLOCK_LEN];
    padded[..input.len()].copy_from_slice(input);

    let mut ctx = CipherCtx::new()?;
    ctx.encrypt_init(Some(cipher), Some(key.k), Some(&[0u8; AES_BLOCK_LEN]))?;
    ctx.set_padding(false);
    let mut ciphertext = vec![];
    ctx.cipher_update_vec(&padded, &mut ciphertext)?;
    ctx.cipher_final_vec(&mut ciphertext)?;
    Ok(ciphertext.split_off(ciphertext.len() - AES_BLOCK_LEN))
}

/// Compares the truncated `mac` against `tag`.
fn verify_truncated(
    algorithm: iana::Algorithm,
    mac: &[u8],
    tag: &[u8],
) -> Result<(), CoseCipherError<CoseOpensslCipherError>> {
    let tag_len = algorithm::mac_tag_len(algorithm.to_i64())?;
    // memcmp::eq panics on inputs of different length.
    if tag.len() != tag_len || mac.len() < tag_len {
        return Err(CoseCipherError::VerificationFailure);
    }
    // Use openssl::memcmp::eq to prevent timing attacks.
    if openssl::memcmp::eq(&mac[..tag_len], tag) {
        Ok(())
    } else {
        Err(CoseCipherError::VerificationFailure)
    }
}

impl MacCryptoBackend for OpensslContext {
    fn compute_hmac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        compute_hmac(algorithm, &key, payload)
    }

    fn verify_hmac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        tag: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        let hmac = compute_hmac(algorithm, &key, payload)?;
        verify_truncated(algorithm, &hmac, tag)
    }

    fn compute_cbc_mac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        compute_cbc_mac(algorithm, &key, payload)
    }

    fn verify_cbc_mac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        tag: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        let mac = compute_cbc_mac(algorithm, &key, payload)?;
        verify_truncated(algorithm, &mac, tag)
    }
}
