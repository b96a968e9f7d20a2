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

//! Registry of the COSE algorithms supported by this crate.
//!
//! Every supported algorithm has exactly one [`AlgorithmEntry`], which maps the IANA-assigned
//! registry value to its mnemonic names and to the [`AlgorithmFamily`] (and parameters) of the
//! primitive backing it.
//! The table is static and never modified at runtime.

use ciborium::Value;
use coset::iana;
use coset::iana::EnumI64;
use strum_macros::{AsRefStr, Display};

use crate::error::CoseCipherError;

#[cfg(test)]
mod tests;

/// Hash function used by an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum HashFunction {
    /// SHA-256
    #[strum(serialize = "SHA-256")]
    Sha256,
    /// SHA-384
    #[strum(serialize = "SHA-384")]
    Sha384,
    /// SHA-512
    #[strum(serialize = "SHA-512")]
    Sha512,
}

/// The primitive family of an algorithm, together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    /// HMAC using `hash`, truncated to `tag_len` bytes.
    Hmac {
        /// Hash function of the HMAC.
        hash: HashFunction,
        /// Length of the tag that is put into the message.
        tag_len: usize,
    },
    /// AES-CBC-MAC with a key of `key_len` bytes, truncated to `tag_len` bytes.
    CbcMac {
        /// Length of the AES key.
        key_len: usize,
        /// Length of the tag that is put into the message.
        tag_len: usize,
    },
    /// AES-GCM with a key of `key_len` bytes (nonce and tag lengths are fixed).
    AesGcm {
        /// Length of the AES key.
        key_len: usize,
    },
    /// AES-CCM with the given key, nonce and tag lengths.
    AesCcm {
        /// Length of the AES key.
        key_len: usize,
        /// Length of the nonce.
        nonce_len: usize,
        /// Length of the authentication tag.
        tag_len: usize,
    },
    /// ECDSA, where the structure is hashed using `hash` before signing.
    Ecdsa {
        /// Hash function applied to the to-be-signed bytes.
        hash: HashFunction,
    },
    /// RSASSA-PKCS1-v1_5 using `hash`.
    RsaPkcs1 {
        /// Hash function applied to the to-be-signed bytes.
        hash: HashFunction,
    },
    /// RSASSA-PSS using `hash` (salt length equals the hash length).
    RsaPss {
        /// Hash function applied to the to-be-signed bytes and used for MGF1.
        hash: HashFunction,
    },
    /// Direct use of a shared key (recipient algorithm only).
    Direct,
}

/// Nonce length of all AES-GCM variants.
pub const AES_GCM_NONCE_LEN: usize = 12;
/// Tag length of all AES-GCM variants.
pub const AES_GCM_TAG_LEN: usize = 16;

/// A row of the algorithm registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmEntry {
    /// The IANA-assigned algorithm.
    pub alg: iana::Algorithm,
    /// Mnemonic names of the algorithm, the first one is the canonical name.
    pub names: &'static [&'static str],
    /// Primitive family and parameters.
    pub family: AlgorithmFamily,
}

impl AlgorithmEntry {
    /// Registry value of this algorithm.
    #[must_use]
    pub fn code(&self) -> i64 {
        self.alg.to_i64()
    }

    /// Canonical mnemonic of this algorithm.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    /// Length the raw MAC output must be truncated to, if this is a MAC algorithm.
    #[must_use]
    pub fn mac_tag_len(&self) -> Option<usize> {
        match self.family {
            AlgorithmFamily::Hmac { tag_len, .. } | AlgorithmFamily::CbcMac { tag_len, .. } => {
                Some(tag_len)
            }
            _ => None,
        }
    }

    /// Nonce length, if this is an AEAD algorithm.
    #[must_use]
    pub fn nonce_len(&self) -> Option<usize> {
        match self.family {
            AlgorithmFamily::AesGcm { .. } => Some(AES_GCM_NONCE_LEN),
            AlgorithmFamily::AesCcm { nonce_len, .. } => Some(nonce_len),
            _ => None,
        }
    }

    /// Authentication tag length, if this is an AEAD algorithm.
    #[must_use]
    pub fn aead_tag_len(&self) -> Option<usize> {
        match self.family {
            AlgorithmFamily::AesGcm { .. } => Some(AES_GCM_TAG_LEN),
            AlgorithmFamily::AesCcm { tag_len, .. } => Some(tag_len),
            _ => None,
        }
    }

    /// Required length of a symmetric key, if the algorithm mandates one.
    ///
    /// HMAC accepts keys of any length, so `None` is returned for it.
    #[must_use]
    pub fn symmetric_key_len(&self) -> Option<usize> {
        match self.family {
            AlgorithmFamily::CbcMac { key_len, .. }
            | AlgorithmFamily::AesGcm { key_len }
            | AlgorithmFamily::AesCcm { key_len, .. } => Some(key_len),
            _ => None,
        }
    }

    /// Whether this algorithm can be used for COSE_Mac and COSE_Mac0.
    #[must_use]
    pub fn is_mac(&self) -> bool {
        matches!(
            self.family,
            AlgorithmFamily::Hmac { .. } | AlgorithmFamily::CbcMac { .. }
        )
    }

    /// Whether this algorithm can be used for COSE_Sign and COSE_Sign1.
    #[must_use]
    pub fn is_signature(&self) -> bool {
        matches!(
            self.family,
            AlgorithmFamily::Ecdsa { .. }
                | AlgorithmFamily::RsaPkcs1 { .. }
                | AlgorithmFamily::RsaPss { .. }
        )
    }

    /// Whether this algorithm can be used for COSE_Encrypt and COSE_Encrypt0.
    #[must_use]
    pub fn is_aead(&self) -> bool {
        matches!(
            self.family,
            AlgorithmFamily::AesGcm { .. } | AlgorithmFamily::AesCcm { .. }
        )
    }
}

const fn entry(
    alg: iana::Algorithm,
    names: &'static [&'static str],
    family: AlgorithmFamily,
) -> AlgorithmEntry {
    AlgorithmEntry { alg, names, family }
}

const fn ccm(key_len: usize, nonce_len: usize, tag_len: usize) -> AlgorithmFamily {
    AlgorithmFamily::AesCcm {
        key_len,
        nonce_len,
        tag_len,
    }
}

/// All algorithms known to this crate.
pub static ALGORITHMS: &[AlgorithmEntry] = &[
    entry(
        iana::Algorithm::ES256,
        &["ES256"],
        AlgorithmFamily::Ecdsa {
            hash: HashFunction::Sha256,
        },
    ),
    entry(
        iana::Algorithm::ES384,
        &["ES384"],
        AlgorithmFamily::Ecdsa {
            hash: HashFunction::Sha384,
        },
    ),
    entry(
        iana::Algorithm::ES512,
        &["ES512"],
        AlgorithmFamily::Ecdsa {
            hash: HashFunction::Sha512,
        },
    ),
    entry(
        iana::Algorithm::PS256,
        &["PS256"],
        AlgorithmFamily::RsaPss {
            hash: HashFunction::Sha256,
        },
    ),
    entry(
        iana::Algorithm::PS384,
        &["PS384"],
        AlgorithmFamily::RsaPss {
            hash: HashFunction::Sha384,
        },
    ),
    entry(
        iana::Algorithm::PS512,
        &["PS512"],
        AlgorithmFamily::RsaPss {
            hash: HashFunction::Sha512,
        },
    ),
    entry(
        iana::Algorithm::RS256,
        &["RS256"],
        AlgorithmFamily::RsaPkcs1 {
            hash: HashFunction::Sha256,
        },
    ),
    entry(
        iana::Algorithm::RS384,
        &["RS384"],
        AlgorithmFamily::RsaPkcs1 {
            hash: HashFunction::Sha384,
        },
    ),
    entry(
        iana::Algorithm::RS512,
        &["RS512"],
        AlgorithmFamily::RsaPkcs1 {
            hash: HashFunction::Sha512,
        },
    ),
    entry(iana::Algorithm::Direct, &["direct"], AlgorithmFamily::Direct),
    entry(
        iana::Algorithm::A128GCM,
        &["A128GCM"],
        AlgorithmFamily::AesGcm { key_len: 16 },
    ),
    entry(
        iana::Algorithm::A192GCM,
        &["A192GCM"],
        AlgorithmFamily::AesGcm { key_len: 24 },
    ),
    entry(
        iana::Algorithm::A256GCM,
        &["A256GCM"],
        AlgorithmFamily::AesGcm { key_len: 32 },
    ),
    entry(
        iana::Algorithm::HMAC_256_64,
        &["SHA-256_64", "HS256/64"],
        AlgorithmFamily::Hmac {
            hash: HashFunction::Sha256,
            tag_len: 8,
        },
    ),
    entry(
        iana::Algorithm::HMAC_256_256,
        &["SHA-256", "HS256"],
        AlgorithmFamily::Hmac {
            hash: HashFunction::Sha256,
            tag_len: 32,
        },
    ),
    entry(
        iana::Algorithm::HMAC_384_384,
        &["SHA-384", "HS384"],
        AlgorithmFamily::Hmac {
            hash: HashFunction::Sha384,
            tag_len: 48,
        },
    ),
    entry(
        iana::Algorithm::HMAC_512_512,
        &["SHA-512", "HS512"],
        AlgorithmFamily::Hmac {
            hash: HashFunction::Sha512,
            tag_len: 64,
        },
    ),
    entry(
        iana::Algorithm::AES_CCM_16_64_128,
        &["AES-CCM-16-64-128"],
        ccm(16, 13, 8),
    ),
    entry(
        iana::Algorithm::AES_CCM_16_64_256,
        &["AES-CCM-16-64-256"],
        ccm(32, 13, 8),
    ),
    entry(
        iana::Algorithm::AES_CCM_64_64_128,
        &["AES-CCM-64-64-128"],
        ccm(16, 7, 8),
    ),
    entry(
        iana::Algorithm::AES_CCM_64_64_256,
        &["AES-CCM-64-64-256"],
        ccm(32, 7, 8),
    ),
    entry(
        iana::Algorithm::AES_MAC_128_64,
        &["AES-MAC-128/64"],
        AlgorithmFamily::CbcMac {
            key_len: 16,
            tag_len: 8,
        },
    ),
    entry(
        iana::Algorithm::AES_MAC_256_64,
        &["AES-MAC-256/64"],
        AlgorithmFamily::CbcMac {
            key_len: 32,
            tag_len: 8,
        },
    ),
    entry(
        iana::Algorithm::AES_MAC_128_128,
        &["AES-MAC-128/128"],
        AlgorithmFamily::CbcMac {
            key_len: 16,
            tag_len: 16,
        },
    ),
    entry(
        iana::Algorithm::AES_MAC_256_128,
        &["AES-MAC-256/128"],
        AlgorithmFamily::CbcMac {
            key_len: 32,
            tag_len: 16,
        },
    ),
    entry(
        iana::Algorithm::AES_CCM_16_128_128,
        &["AES-CCM-16-128-128"],
        ccm(16, 13, 16),
    ),
    entry(
        iana::Algorithm::AES_CCM_16_128_256,
        &["AES-CCM-16-128-256"],
        ccm(32, 13, 16),
    ),
    entry(
        iana::Algorithm::AES_CCM_64_128_128,
        &["AES-CCM-64-128-128"],
        ccm(16, 7, 16),
    ),
    entry(
        iana::Algorithm::AES_CCM_64_128_256,
        &["AES-CCM-64-128-256"],
        ccm(32, 7, 16),
    ),
];

/// Looks up the registry entry for the algorithm registry value `code`.
///
/// # Errors
///
/// - [`CoseCipherError::UnknownAlgorithm`] if `code` is not an IANA-registered COSE algorithm.
/// - [`CoseCipherError::UnsupportedAlgorithm`] if it is registered, but not supported here.
pub fn resolve<T>(code: i64) -> Result<&'static AlgorithmEntry, CoseCipherError<T>> {
    let Some(alg) = iana::Algorithm::from_i64(code) else {
        return Err(CoseCipherError::UnknownAlgorithm(Value::from(code)));
    };
    let entry = ALGORITHMS
        .iter()
        .find(|e| e.alg == alg)
        .ok_or(CoseCipherError::UnsupportedAlgorithm(code))?;
    log::debug!("resolved algorithm {code} to {}", entry.name());
    Ok(entry)
}

/// Looks up the registry entry for an algorithm header value, as found in a decoded message.
///
/// # Errors
///
/// Same as [`resolve`], values that are not integers are reported as
/// [`CoseCipherError::UnknownAlgorithm`].
pub fn resolve_value<T>(value: &Value) -> Result<&'static AlgorithmEntry, CoseCipherError<T>> {
    value
        .as_integer()
        .and_then(|i| i64::try_from(i).ok())
        .ok_or_else(|| CoseCipherError::UnknownAlgorithm(value.clone()))
        .and_then(resolve)
}

/// Looks up the registry entry for the algorithm mnemonic `name` (e.g. `"ES256"`, `"HS256"`).
///
/// # Errors
///
/// Returns [`CoseCipherError::UnknownAlgorithm`] if no algorithm has this name.
pub fn by_name<T>(name: &str) -> Result<&'static AlgorithmEntry, CoseCipherError<T>> {
    ALGORITHMS
        .iter()
        .find(|e| e.names.contains(&name))
        .ok_or_else(|| CoseCipherError::UnknownAlgorithm(Value::Text(name.into())))
}

/// Returns the length a MAC tag computed with the algorithm `code` must be truncated to.
///
/// # Errors
///
/// Same as [`resolve`], additionally [`CoseCipherError::UnsupportedAlgorithm`] is returned for
/// algorithms that are not MAC algorithms.
pub fn mac_tag_len<T>(code: i64) -> Result<usize, CoseCipherError<T>> {
    resolve(code)?
        .mac_tag_len()
        .ok_or(CoseCipherError::UnsupportedAlgorithm(code))
}
