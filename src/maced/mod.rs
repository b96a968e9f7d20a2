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

//! MACed messages (`COSE_Mac0` and `COSE_Mac`).
//!
//! [`create`] authenticates a payload with a symmetric key and [`read`] checks the tag of a
//! received message and returns its payload.
//!
//! # Example
//! ```
//! # #[cfg(feature = "rustcrypto-hmac")]
//! # {
//! # use rand::rngs::OsRng;
//! use cose_msg::crypto_impl::rustcrypto::RustCryptoContext;
//! use cose_msg::framing::{ReadOptions, Recipients};
//! use cose_msg::header::{CoseHeaders, NamedHeaders};
//! use cose_msg::maced::{self, MacCreateOptions, MacRecipient};
//!
//! let mut backend = RustCryptoContext::new(OsRng);
//! let key = b"a shared secret of sufficient length";
//! let headers = CoseHeaders::new(
//!     NamedHeaders::new().with("alg", "SHA-256"),
//!     NamedHeaders::new().with("kid", "our-secret"),
//! );
//! let message = maced::create(
//!     &mut backend,
//!     &headers,
//!     b"Important message!",
//!     &Recipients::One(MacRecipient::new(key)),
//!     None,
//!     &MacCreateOptions::default(),
//! )?;
//! let payload = maced::read(&mut backend, &message, key, None, &ReadOptions::default())?;
//! assert_eq!(payload, b"Important message!");
//! # }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use alloc::vec;
use alloc::vec::Vec;

use ciborium::Value;
use coset::iana;
use coset::iana::EnumI64;

use crate::algorithm::{AlgorithmEntry, AlgorithmFamily};
use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;
use crate::framing::{self, MessageKind, ReadOptions, Recipients};
use crate::header::{self, CoseHeaders, HeaderMap, NamedHeaders, ProtectedEncoding};
use crate::key::CoseSymmetricKey;
use crate::structure::AuthStructure;
use crate::util;

#[cfg(test)]
mod tests;

/// Trait for cryptographic backends that can perform Message Authentication Code (MAC) computation
/// and verification operations for algorithms used in COSE structures.
///
/// All methods have a default implementation returning
/// [`CoseCipherError::UnsupportedAlgorithm`], so backends only implement what they support.
pub trait MacCryptoBackend: CryptoBackend {
    /// Computes an HMAC for the given `payload` using the given `algorithm` and `key`.
    ///
    /// The MAC should be computed as specified in RFC 2104 (see RFC 9053, Section 3.1).
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The HMAC variant to use (determines the hash function).
    ///                 If unsupported by the backend, a [`CoseCipherError::UnsupportedAlgorithm`]
    ///                 error should be returned.
    /// * `key` - Symmetric key that should be used. Its length has already been checked to be
    ///           non-zero.
    /// * `payload` - Data for which the MAC should be calculated.
    ///
    /// # Returns
    ///
    /// The full, untruncated output of the HMAC function.
    /// Truncation to the tag length of the algorithm is done by the caller.
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    /// For backend-specific errors, [`CoseCipherError::Other`] may be used to convey a
    /// backend-specific error.
    #[allow(unused_variables)]
    fn compute_hmac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Verifies the HMAC provided as `tag` for the given `payload` using the given `algorithm` and
    /// `key`.
    ///
    /// `tag` is the (possibly truncated) tag as found in the message.
    /// Its length must equal the tag length of `algorithm` and it must be compared with the
    /// leftmost bytes of the computed HMAC using a comparison function that is resistant to
    /// timing attacks.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the tag does not match (or has the wrong
    /// length) even though MAC computation was successful, or any other [`CoseCipherError`] in
    /// case of errors.
    #[allow(unused_variables)]
    fn verify_hmac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        tag: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Computes an AES-CBC-MAC (RFC 9053, Section 3.2) for the given `payload` using the given
    /// `algorithm` and `key`.
    ///
    /// The key has already been checked to have the length required by `algorithm`.
    ///
    /// # Returns
    ///
    /// The last cipher block, i.e. the untruncated CBC-MAC.
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    #[allow(unused_variables)]
    fn compute_cbc_mac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Verifies the AES-CBC-MAC provided as `tag` for the given `payload` using the given
    /// `algorithm` and `key`.
    ///
    /// The same rules as for [`MacCryptoBackend::verify_hmac`] apply.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the tag does not match, or any other
    /// [`CoseCipherError`] in case of errors.
    #[allow(unused_variables)]
    fn verify_cbc_mac(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        tag: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }
}

/// The recipient of a MACed message.
#[derive(Debug, Clone, PartialEq)]
pub struct MacRecipient<'a> {
    /// Shared symmetric key.
    pub key: &'a [u8],
    /// Unprotected header of the recipient layer.
    ///
    /// Ignored for `COSE_Mac0`, which has no recipient layer.
    pub unprotected: NamedHeaders,
}

impl<'a> MacRecipient<'a> {
    /// Creates a recipient using the shared `key`, with an empty header.
    #[must_use]
    pub fn new(key: &'a [u8]) -> MacRecipient<'a> {
        MacRecipient {
            key,
            unprotected: NamedHeaders::new(),
        }
    }

    /// Returns this recipient with the given unprotected header.
    #[must_use]
    pub fn with_unprotected(mut self, unprotected: NamedHeaders) -> MacRecipient<'a> {
        self.unprotected = unprotected;
        self
    }
}

/// Options for creating MACed messages.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(no_std, setter(into, strip_option), derive(Debug, PartialEq))]
pub struct MacCreateOptions {
    /// How to put an empty protected header on the wire.
    #[builder(default)]
    pub encode_protected: ProtectedEncoding,
    /// Emit the message without its CBOR tag.
    #[builder(default)]
    pub exclude_tag: bool,
}

impl MacCreateOptions {
    /// Initializes and returns a new [`MacCreateOptionsBuilder`].
    #[must_use]
    pub fn builder() -> MacCreateOptionsBuilder {
        MacCreateOptionsBuilder::default()
    }
}

/// Ensures that `alg` is a MAC algorithm.
fn ensure_mac_algorithm<T>(alg: &AlgorithmEntry) -> Result<(), CoseCipherError<T>> {
    if alg.is_mac() {
        Ok(())
    } else {
        Err(CoseCipherError::UnsupportedAlgorithm(alg.code()))
    }
}

/// Computes the tag of `to_be_maced`, truncated to the tag length of `alg`.
fn compute_tag<B: MacCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: CoseSymmetricKey<'_>,
    to_be_maced: &[u8],
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let mut tag = match alg.family {
        AlgorithmFamily::Hmac { .. } => backend.compute_hmac(alg.alg, key, to_be_maced)?,
        AlgorithmFamily::CbcMac { .. } => backend.compute_cbc_mac(alg.alg, key, to_be_maced)?,
        _ => return Err(CoseCipherError::UnsupportedAlgorithm(alg.code())),
    };
    if let Some(tag_len) = alg.mac_tag_len() {
        tag.truncate(tag_len);
    }
    Ok(tag)
}

/// Verifies `tag` against `to_be_maced`.
fn verify_tag<B: MacCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: CoseSymmetricKey<'_>,
    tag: &[u8],
    to_be_maced: &[u8],
) -> Result<(), CoseCipherError<B::Error>> {
    let result = match alg.family {
        AlgorithmFamily::Hmac { .. } => backend.verify_hmac(alg.alg, key, tag, to_be_maced),
        AlgorithmFamily::CbcMac { .. } => backend.verify_cbc_mac(alg.alg, key, tag, to_be_maced),
        _ => Err(CoseCipherError::UnsupportedAlgorithm(alg.code())),
    };
    result.map_err(|e| e.on_verification_failure(CoseCipherError::TagMismatch))
}

/// Creates a MACed message.
///
/// With [`Recipients::One`], a `COSE_Mac0` message is created, with [`Recipients::Many`] (which
/// has to contain exactly one recipient) a `COSE_Mac` message with a recipient layer referencing
/// the key directly.
///
/// # Errors
///
/// - [`CoseCipherError::UnknownParameter`] or [`CoseCipherError::UnknownAlgorithm`] if a header
///   can not be translated.
/// - [`CoseCipherError::MissingAlg`] if neither header contains an algorithm.
/// - [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm is not a MAC algorithm.
/// - [`CoseCipherError::NoRecipients`] or [`CoseCipherError::TooManyRecipients`] if the
///   recipient list does not contain exactly one entry.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - Errors of the backend.
pub fn create<B: MacCryptoBackend>(
    backend: &mut B,
    headers: &CoseHeaders,
    payload: &[u8],
    recipients: &Recipients<MacRecipient<'_>>,
    external_aad: Option<&[u8]>,
    options: &MacCreateOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let protected = header::translate(&headers.protected)?;
    let unprotected = header::translate(&headers.unprotected)?;
    let alg = header::determine_algorithm(&protected, &unprotected)?;
    ensure_mac_algorithm(alg)?;
    let (kind, recipient) = recipients.select(MessageKind::Mac0, MessageKind::Mac)?;
    let key = util::ensure_valid_symmetric_key(alg, recipient.key)?;

    let to_be_maced = AuthStructure::mac(
        kind.context(),
        &protected.structure_bytes()?,
        external_aad.unwrap_or_default(),
        payload,
    )
    .to_bytes()?;
    log::trace!("MAC structure has {} bytes", to_be_maced.len());
    let tag = compute_tag(backend, alg, key, &to_be_maced)?;

    let mut items = vec![
        Value::Bytes(protected.wire_bytes(options.encode_protected)?),
        unprotected.to_value(),
        Value::Bytes(payload.to_vec()),
        Value::Bytes(tag),
    ];
    if kind == MessageKind::Mac {
        let recipient_unprotected = header::translate(&recipient.unprotected)?;
        items.push(Value::Array(vec![Value::Array(vec![
            Value::Bytes(Vec::new()),
            recipient_unprotected.to_value(),
            Value::Bytes(Vec::new()),
        ])]));
    }
    log::debug!("created {kind} message using {}", alg.name());
    framing::encode(&framing::wrap(kind, items, options.exclude_tag))
}

/// Reads a MACed message, verifies its tag using `key` and returns its payload.
///
/// Tagged messages must be `COSE_Mac0` or `COSE_Mac`, untagged messages are treated as
/// [`ReadOptions::default_kind`] (`COSE_Mac0` if unset).
///
/// # Errors
///
/// - [`CoseCipherError::CborDecode`], [`CoseCipherError::UnexpectedTag`] or
///   [`CoseCipherError::MalformedMessage`] if the message can not be parsed.
/// - [`CoseCipherError::MissingAlg`], [`CoseCipherError::UnknownAlgorithm`] or
///   [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm can not be determined.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - [`CoseCipherError::TagMismatch`] if the tag is not valid.
pub fn read<B: MacCryptoBackend>(
    backend: &mut B,
    data: &[u8],
    key: &[u8],
    external_aad: Option<&[u8]>,
    options: &ReadOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let (kind, mut items) = framing::unwrap(
        framing::decode_first(data)?,
        &[MessageKind::Mac0, MessageKind::Mac],
        options.default_kind.unwrap_or(MessageKind::Mac0),
    )?;
    if kind == MessageKind::Mac {
        // The recipient layer carries no information needed for a direct key.
        let recipients = items.pop().unwrap_or(Value::Null);
        framing::take_single_layer(recipients, "recipients")?;
    }
    let [protected, unprotected, payload, tag] = framing::into_items(kind, items)?;
    let (protected, structure_protected) =
        HeaderMap::read_protected(framing::take_bytes(protected, "protected header")?)?;
    let unprotected = HeaderMap::from_value(unprotected)?;
    let payload = framing::take_payload(payload)?;
    let tag = framing::take_bytes(tag, "tag")?;

    let alg = header::determine_algorithm(&protected, &unprotected)?;
    ensure_mac_algorithm(alg)?;
    let key = util::ensure_valid_symmetric_key(alg, key)?;

    let to_be_maced = AuthStructure::mac(
        kind.context(),
        &structure_protected,
        external_aad.unwrap_or_default(),
        &payload,
    )
    .to_bytes()?;
    if let Err(e) = verify_tag(backend, alg, key, &tag, &to_be_maced) {
        log::warn!("tag of {kind} message could not be verified: {e}");
        return Err(e);
    }
    Ok(payload)
}
