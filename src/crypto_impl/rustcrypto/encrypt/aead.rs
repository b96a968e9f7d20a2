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
use aead::{Aead, AeadCore, Key, KeyInit, KeySizeUser, Nonce, Payload};
use alloc::format;
use alloc::vec::Vec;
use coset::iana;
use coset::iana::EnumI64;
use typenum::Unsigned;

use crate::algorithm::{self, AlgorithmFamily};
use crate::crypto_impl::rustcrypto::CoseRustCryptoCipherError;
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;

pub(super) type RustCryptoResult<T> = Result<T, CoseCipherError<CoseRustCryptoCipherError>>;

/// Direction of an AEAD operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AeadOp {
    /// Encrypt the input and append the authentication tag.
    Seal,
    /// Check the appended authentication tag and decrypt the input.
    Open,
}

/// Inputs shared by all AEAD operations.
pub(super) struct AeadInput<'a> {
    pub(super) key: &'a CoseSymmetricKey<'a>,
    /// Plaintext when sealing, ciphertext with the tag appended when opening.
    pub(super) data: &'a [u8],
    pub(super) aad: &'a [u8],
    pub(super) iv: &'a [u8],
}

/// Looks up the parameters of `algorithm` in the algorithm registry.
pub(super) fn aead_family(algorithm: iana::Algorithm) -> RustCryptoResult<AlgorithmFamily> {
    let entry = algorithm::resolve::<CoseRustCryptoCipherError>(algorithm.to_i64())?;
    if entry.is_aead() {
        Ok(entry.family)
    } else {
        Err(CoseCipherError::UnsupportedAlgorithm(entry.code()))
    }
}

/// Runs `op` with the AEAD instantiation `AEAD`.
///
/// Key and nonce lengths are checked first, as the `from_slice` constructors would panic
/// otherwise.
pub(super) fn run_aead<AEAD: Aead + AeadCore + KeyInit>(
    op: AeadOp,
    input: &AeadInput<'_>,
) -> RustCryptoResult<Vec<u8>> {
    let key_len = <AEAD as KeySizeUser>::key_size();
    if input.key.k.len() != key_len {
        return Err(CoseCipherError::InvalidKey(format!(
            "key has length {}, expected {key_len}",
            input.key.k.len()
        )));
    }
    let nonce_len = <<AEAD as AeadCore>::NonceSize as Unsigned>::USIZE;
    if input.iv.len() != nonce_len {
        return Err(CoseCipherError::InvalidIvLength {
            expected: nonce_len,
            actual: input.iv.len(),
        });
    }

    let cipher = AEAD::new(Key::<AEAD>::from_slice(input.key.k));
    let nonce = Nonce::<AEAD>::from_slice(input.iv);
    let payload = Payload {
        msg: input.data,
        aad: input.aad,
    };
    match op {
        AeadOp::Seal => cipher.encrypt(nonce, payload),
        AeadOp::Open => cipher.decrypt(nonce, payload),
    }
    .map_err(CoseCipherError::from)
}
