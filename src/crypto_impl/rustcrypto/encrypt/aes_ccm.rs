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
use aes::cipher::{BlockCipher, BlockEncrypt, BlockSizeUser, KeyInit};
use aes::{Aes128, Aes256};
use alloc::vec::Vec;
use ccm::Ccm;
use coset::iana;
use coset::iana::EnumI64;
use typenum::consts::{U13, U16, U7, U8};

use crate::algorithm::AlgorithmFamily;
use crate::error::CoseCipherError;

use super::aead::{aead_family, run_aead, AeadInput, AeadOp, RustCryptoResult};

/// AES-CCM in direction `op`.
///
/// The block cipher follows from the key length registered for `algorithm`, the CCM
/// instantiation from its registered tag and nonce lengths.
pub(super) fn aes_ccm(
    op: AeadOp,
    algorithm: iana::Algorithm,
    input: &AeadInput<'_>,
) -> RustCryptoResult<Vec<u8>> {
    let AlgorithmFamily::AesCcm {
        key_len,
        nonce_len,
        tag_len,
    } = aead_family(algorithm)?
    else {
        return Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()));
    };
    match key_len {
        16 => ccm_with_cipher::<Aes128>(op, algorithm, tag_len, nonce_len, input),
        32 => ccm_with_cipher::<Aes256>(op, algorithm, tag_len, nonce_len, input),
        _ => Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64())),
    }
}

fn ccm_with_cipher<C>(
    op: AeadOp,
    algorithm: iana::Algorithm,
    tag_len: usize,
    nonce_len: usize,
    input: &AeadInput<'_>,
) -> RustCryptoResult<Vec<u8>>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    // RFC 9053 only registers L = 2 (13 byte nonces) and L = 8 (7 byte nonces).
    match (tag_len, nonce_len) {
        (8, 13) => run_aead::<Ccm<C, U8, U13>>(op, input),
        (8, 7) => run_aead::<Ccm<C, U8, U7>>(op, input),
        (16, 13) => run_aead::<Ccm<C, U16, U13>>(op, input),
        (16, 7) => run_aead::<Ccm<C, U16, U7>>(op, input),
        _ => Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64())),
    }
}
