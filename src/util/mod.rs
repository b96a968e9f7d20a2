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

//! Helpers shared by the message subsystems.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::algorithm::AlgorithmEntry;
use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;


/// XORs `a` and `b`, aligning both at their last byte.
///
/// The shorter operand is zero-extended at the front, so the result has the length of the
/// longer one.
#[must_use]
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut out = vec![0u8; len];
    for (o, v) in out.iter_mut().rev().zip(a.iter().rev()) {
        *o = *v;
    }
    for (o, v) in out.iter_mut().rev().zip(b.iter().rev()) {
        *o ^= *v;
    }
    out
}

/// Derives the nonce from a partial IV and a context IV.
///
/// # Errors
///
/// Returns [`CoseCipherError::InvalidIvLength`] if the derived nonce does not have the length
/// required by `alg`.
pub fn derive_nonce<T>(
    alg: &AlgorithmEntry,
    partial_iv: &[u8],
    context_iv: &[u8],
) -> Result<Vec<u8>, CoseCipherError<T>> {
    let nonce = xor(partial_iv, context_iv);
    ensure_nonce_len(alg, &nonce)?;
    log::debug!(
        "derived {} byte nonce from partial IV",
        nonce.len()
    );
    Ok(nonce)
}

/// Checks that `nonce` has the length required by `alg`.
///
/// # Errors
///
/// Returns [`CoseCipherError::InvalidIvLength`] on a length mismatch and
/// [`CoseCipherError::UnsupportedAlgorithm`] if `alg` uses no nonce.
pub fn ensure_nonce_len<T>(alg: &AlgorithmEntry, nonce: &[u8]) -> Result<(), CoseCipherError<T>> {
    let expected = alg
        .nonce_len()
        .ok_or(CoseCipherError::UnsupportedAlgorithm(alg.code()))?;
    if nonce.len() == expected {
        Ok(())
    } else {
        Err(CoseCipherError::InvalidIvLength {
            expected,
            actual: nonce.len(),
        })
    }
}

/// Checks that `key` has the length required by `alg` and wraps it.
///
/// Algorithms without a fixed key size (HMAC) accept any non-empty key.
///
/// # Errors
///
/// Returns [`CoseCipherError::InvalidKey`] if the key length is wrong.
pub fn ensure_valid_symmetric_key<'a, T>(
    alg: &AlgorithmEntry,
    key: &'a [u8],
) -> Result<CoseSymmetricKey<'a>, CoseCipherError<T>> {
    match alg.symmetric_key_len() {
        Some(len) if key.len() != len => Err(CoseCipherError::InvalidKey(format!(
            "{} requires a key of {len} bytes, got {}",
            alg.name(),
            key.len()
        ))),
        None if key.is_empty() => Err(CoseCipherError::InvalidKey(format!(
            "{} requires a non-empty key",
            alg.name()
        ))),
        _ => Ok(CoseSymmetricKey::new(key)),
    }
}

/// Draws `len` random bytes from the `backend`.
pub(crate) fn random_bytes<B: CryptoBackend>(
    backend: &mut B,
    len: usize,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let mut buf = vec![0u8; len];
    backend
        .generate_rand(buf.as_mut_slice())
        .map_err(CoseCipherError::Other)?;
    Ok(buf)
}
