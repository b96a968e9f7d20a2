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
use aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use alloc::vec::Vec;
use coset::iana;
use coset::iana::EnumI64;
use typenum::consts::U12;

use crate::algorithm::AlgorithmFamily;
use crate::error::CoseCipherError;

use super::aead::{aead_family, run_aead, AeadInput, AeadOp, RustCryptoResult};

/// AES-GCM in direction `op`, the cipher is picked by the key length registered for `algorithm`.
pub(super) fn aes_gcm(
    op: AeadOp,
    algorithm: iana::Algorithm,
    input: &AeadInput<'_>,
) -> RustCryptoResult<Vec<u8>> {
    match aead_family(algorithm)? {
        AlgorithmFamily::AesGcm { key_len: 16 } => run_aead::<Aes128Gcm>(op, input),
        AlgorithmFamily::AesGcm { key_len: 24 } => run_aead::<AesGcm<Aes192, U12>>(op, input),
        AlgorithmFamily::AesGcm { key_len: 32 } => run_aead::<Aes256Gcm>(op, input),
        _ => Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64())),
    }
}
