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

//! Encrypted messages (`COSE_Encrypt0` and `COSE_Encrypt`) using a directly shared key.
//!
//! The nonce of a message is either carried in full in the `IV` header, or derived from a
//! short `Partial_IV` header and a context IV both parties agreed upon beforehand (RFC 9052,
//! Section 3.1).
//!
//! # Example
//! ```
//! # #[cfg(feature = "rustcrypto-aes-gcm")]
//! # {
//! # use rand::rngs::OsRng;
//! use cose_msg::crypto_impl::rustcrypto::RustCryptoContext;
//! use cose_msg::encrypted::{self, EncryptOptions, EncryptReadOptions, EncryptRecipient};
//! use cose_msg::framing::Recipients;
//! use cose_msg::header::{CoseHeaders, NamedHeaders};
//!
//! let key = hex::decode("849b57219dae48de646d07dbb533566e")?;
//! let mut backend = RustCryptoContext::new(OsRng);
//! let headers = CoseHeaders::new(NamedHeaders::new().with("alg", "A128GCM"), NamedHeaders::new());
//! let message = encrypted::create(
//!     &mut backend,
//!     &headers,
//!     b"Secret message!",
//!     &Recipients::One(EncryptRecipient::new(&key)),
//!     &EncryptOptions::default(),
//! )?;
//!
//! let plaintext = encrypted::read(&mut backend, &message, &key, &EncryptReadOptions::default())?;
//! assert_eq!(plaintext, b"Secret message!");
//! # }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use ciborium::Value;
use coset::iana;
use coset::iana::EnumI64;

use crate::algorithm::{AlgorithmEntry, AlgorithmFamily};
use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;
use crate::framing::{self, MessageKind, Recipients};
use crate::header::{self, CoseHeaders, HeaderMap, NamedHeaders};
use crate::key::CoseSymmetricKey;
use crate::structure::AuthStructure;
use crate::util;


/// Length of the partial IV drawn for messages using a context IV.
pub const PARTIAL_IV_LEN: usize = 2;

/// Trait for cryptographic backends that can perform encryption and decryption operations for
/// algorithms used for COSE structures.
///
/// All methods have a default implementation returning
/// [`CoseCipherError::UnsupportedAlgorithm`], so backends only implement what they support.
pub trait EncryptCryptoBackend: CryptoBackend {
    /// Encrypts the given `plaintext` and `aad` using the AES-GCM variant provided as
    /// `algorithm` and the given `key`.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The AES-GCM variant to use.
    ///                 If unsupported by the backend, a [`CoseCipherError::UnsupportedAlgorithm`]
    ///                 error should be returned.
    /// * `key` - Symmetric key that should be used. Its length has already been checked to match
    ///           `algorithm`.
    /// * `plaintext` - Data that should be encrypted.
    /// * `aad` - Additional authenticated data, i.e. the encoded `Enc_structure`.
    /// * `iv` - Nonce to use. Its length has already been checked to match `algorithm`.
    ///
    /// # Returns
    ///
    /// The ciphertext with the authentication tag appended.
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    /// For backend-specific errors, [`CoseCipherError::Other`] may be used to convey a
    /// backend-specific error.
    #[allow(unused_variables)]
    fn encrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Decrypts the given `ciphertext_with_tag` (the ciphertext with the authentication tag
    /// appended) using the AES-GCM variant provided as `algorithm`, the given `key`, `aad` and
    /// `iv`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the authentication tag is invalid, in
    /// which case no plaintext may be returned. Any other [`CoseCipherError`] may be returned in
    /// case of other errors.
    #[allow(unused_variables)]
    fn decrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Encrypts the given `plaintext` and `aad` using the AES-CCM variant provided as
    /// `algorithm` and the given `key`.
    ///
    /// The same rules as for [`EncryptCryptoBackend::encrypt_aes_gcm`] apply, the nonce and tag
    /// lengths are given by the variant.
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    #[allow(unused_variables)]
    fn encrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Decrypts the given `ciphertext_with_tag` using the AES-CCM variant provided as
    /// `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the authentication tag is invalid, or
    /// any other [`CoseCipherError`] in case of errors.
    #[allow(unused_variables)]
    fn decrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }
}

/// The recipient of an encrypted message.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptRecipient<'a> {
    /// Shared symmetric key.
    pub key: &'a [u8],
    /// Unprotected header of the recipient layer.
    ///
    /// Ignored for `COSE_Encrypt0`, which has no recipient layer.
    pub unprotected: NamedHeaders,
}

impl<'a> EncryptRecipient<'a> {
    /// Creates a recipient using the shared `key`, with an empty header.
    #[must_use]
    pub fn new(key: &'a [u8]) -> EncryptRecipient<'a> {
        EncryptRecipient {
            key,
            unprotected: NamedHeaders::new(),
        }
    }

    /// Returns this recipient with the given unprotected header.
    #[must_use]
    pub fn with_unprotected(mut self, unprotected: NamedHeaders) -> EncryptRecipient<'a> {
        self.unprotected = unprotected;
        self
    }
}

/// Options for creating encrypted messages.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(no_std, setter(into, strip_option), derive(Debug, PartialEq))]
pub struct EncryptOptions {
    /// Externally supplied data that is authenticated along with the message.
    #[builder(default)]
    pub external_aad: Option<Vec<u8>>,
    /// Context IV shared with the recipient.
    ///
    /// If set, a random partial IV is put into the message instead of the full nonce.
    #[builder(default)]
    pub context_iv: Option<Vec<u8>>,
    /// Emit the message without its CBOR tag.
    #[builder(default)]
    pub exclude_tag: bool,
}

impl EncryptOptions {
    /// Initializes and returns a new [`EncryptOptionsBuilder`].
    #[must_use]
    pub fn builder() -> EncryptOptionsBuilder {
        EncryptOptionsBuilder::default()
    }
}

/// Options for reading encrypted messages.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(no_std, setter(into, strip_option), derive(Debug, PartialEq))]
pub struct EncryptReadOptions {
    /// Externally supplied data that was authenticated along with the message.
    #[builder(default)]
    pub external_aad: Option<Vec<u8>>,
    /// Context IV to derive the nonce from if the message carries a partial IV.
    #[builder(default)]
    pub context_iv: Option<Vec<u8>>,
    /// Kind to assume for messages without CBOR tag (`COSE_Encrypt` if unset).
    #[builder(default)]
    pub default_kind: Option<MessageKind>,
}

impl EncryptReadOptions {
    /// Initializes and returns a new [`EncryptReadOptionsBuilder`].
    #[must_use]
    pub fn builder() -> EncryptReadOptionsBuilder {
        EncryptReadOptionsBuilder::default()
    }
}

fn ensure_aead_algorithm<T>(alg: &AlgorithmEntry) -> Result<(), CoseCipherError<T>> {
    if alg.is_aead() {
        Ok(())
    } else {
        Err(CoseCipherError::UnsupportedAlgorithm(alg.code()))
    }
}

/// Returns the byte string header `label`, if present.
fn iv_header<T>(
    protected: &HeaderMap,
    unprotected: &HeaderMap,
    label: iana::HeaderParameter,
) -> Result<Option<Vec<u8>>, CoseCipherError<T>> {
    match header::find(protected, unprotected, label) {
        None => Ok(None),
        Some(Value::Bytes(b)) => Ok(Some(b.clone())),
        Some(_) => Err(CoseCipherError::malformed(format!(
            "header {label:?} is not a byte string"
        ))),
    }
}

/// Returns the `IV` and `Partial_IV` headers of a layer, which must not both be present.
fn iv_headers<T>(
    protected: &HeaderMap,
    unprotected: &HeaderMap,
) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>), CoseCipherError<T>> {
    match (
        iv_header(protected, unprotected, iana::HeaderParameter::Iv)?,
        iv_header(protected, unprotected, iana::HeaderParameter::PartialIv)?,
    ) {
        (Some(_), Some(_)) => Err(CoseCipherError::IvConflict),
        ivs => Ok(ivs),
    }
}

/// Determines the nonce of a layer from its IV headers and the `context_iv`.
fn resolve_nonce<T>(
    alg: &AlgorithmEntry,
    iv: Option<&[u8]>,
    partial_iv: Option<&[u8]>,
    context_iv: Option<&[u8]>,
) -> Result<Vec<u8>, CoseCipherError<T>> {
    match (iv, partial_iv) {
        (Some(iv), _) => {
            util::ensure_nonce_len(alg, iv)?;
            Ok(iv.to_vec())
        }
        (None, Some(partial_iv)) => {
            let context_iv = context_iv.ok_or(CoseCipherError::MissingContextIv)?;
            util::derive_nonce(alg, partial_iv, context_iv)
        }
        (None, None) => Err(CoseCipherError::MissingIv),
    }
}

fn encrypt_structure<B: EncryptCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: CoseSymmetricKey<'_>,
    plaintext: &[u8],
    aad: &[u8],
    nonce: &[u8],
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    match alg.family {
        AlgorithmFamily::AesGcm { .. } => {
            backend.encrypt_aes_gcm(alg.alg, key, plaintext, aad, nonce)
        }
        AlgorithmFamily::AesCcm { .. } => {
            backend.encrypt_aes_ccm(alg.alg, key, plaintext, aad, nonce)
        }
        _ => Err(CoseCipherError::UnsupportedAlgorithm(alg.code())),
    }
}

fn decrypt_structure<B: EncryptCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: CoseSymmetricKey<'_>,
    ciphertext_with_tag: &[u8],
    aad: &[u8],
    nonce: &[u8],
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    if ciphertext_with_tag.len() < alg.aead_tag_len().unwrap_or_default() {
        return Err(CoseCipherError::VerificationFailure);
    }
    match alg.family {
        AlgorithmFamily::AesGcm { .. } => {
            backend.decrypt_aes_gcm(alg.alg, key, ciphertext_with_tag, aad, nonce)
        }
        AlgorithmFamily::AesCcm { .. } => {
            backend.decrypt_aes_ccm(alg.alg, key, ciphertext_with_tag, aad, nonce)
        }
        _ => Err(CoseCipherError::UnsupportedAlgorithm(alg.code())),
    }
}

/// Creates an encrypted message.
///
/// With [`Recipients::One`], a `COSE_Encrypt0` message is created, with [`Recipients::Many`]
/// (which has to contain exactly one recipient) a `COSE_Encrypt` message with a recipient layer
/// referencing the key directly.
///
/// The nonce is taken from an `IV` header if the caller supplied one, or derived from a
/// `Partial_IV` header and [`EncryptOptions::context_iv`].
/// Otherwise, a fresh one is drawn from the backend: a partial IV of [`PARTIAL_IV_LEN`] bytes if
/// a context IV is set, or a full nonce if not. It is then added to the unprotected header.
///
/// # Errors
///
/// - [`CoseCipherError::UnknownParameter`] or [`CoseCipherError::UnknownAlgorithm`] if a header
///   can not be translated.
/// - [`CoseCipherError::MissingAlg`] if neither header contains an algorithm.
/// - [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm is not an AEAD algorithm.
/// - [`CoseCipherError::NoRecipients`] or [`CoseCipherError::TooManyRecipients`] if the
///   recipient list does not contain exactly one entry.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - [`CoseCipherError::IvConflict`], [`CoseCipherError::MissingContextIv`] or
///   [`CoseCipherError::InvalidIvLength`] if the supplied IV headers can not be used.
/// - Errors of the backend.
pub fn create<B: EncryptCryptoBackend>(
    backend: &mut B,
    headers: &CoseHeaders,
    plaintext: &[u8],
    recipients: &Recipients<EncryptRecipient<'_>>,
    options: &EncryptOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let protected = header::translate(&headers.protected)?;
    let mut unprotected = header::translate(&headers.unprotected)?;
    let alg = header::determine_algorithm(&protected, &unprotected)?;
    ensure_aead_algorithm(alg)?;
    let (kind, recipient) = recipients.select(MessageKind::Encrypt0, MessageKind::Encrypt)?;
    let key = util::ensure_valid_symmetric_key(alg, recipient.key)?;
    let context_iv = options.context_iv.as_deref();

    let nonce = match iv_headers(&protected, &unprotected)? {
        (None, None) => {
            if let Some(context_iv) = context_iv {
                let partial_iv = util::random_bytes(backend, PARTIAL_IV_LEN)?;
                let nonce = util::derive_nonce(alg, &partial_iv, context_iv)?;
                unprotected.insert(iana::HeaderParameter::PartialIv, Value::Bytes(partial_iv));
                nonce
            } else {
                let nonce_len = alg
                    .nonce_len()
                    .ok_or(CoseCipherError::UnsupportedAlgorithm(alg.code()))?;
                let nonce = util::random_bytes(backend, nonce_len)?;
                unprotected.insert(iana::HeaderParameter::Iv, Value::Bytes(nonce.clone()));
                nonce
            }
        }
        (iv, partial_iv) => {
            resolve_nonce(alg, iv.as_deref(), partial_iv.as_deref(), context_iv)?
        }
    };

    let protected_bytes = protected.structure_bytes()?;
    let aad = AuthStructure::encrypt(
        kind.context(),
        &protected_bytes,
        options.external_aad.as_deref().unwrap_or_default(),
    )
    .to_bytes()?;
    log::trace!("Enc_structure has {} bytes", aad.len());
    let ciphertext = encrypt_structure(backend, alg, key, plaintext, &aad, &nonce)?;

    let mut items = vec![
        Value::Bytes(protected_bytes),
        unprotected.to_value(),
        Value::Bytes(ciphertext),
    ];
    if kind == MessageKind::Encrypt {
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

/// Reads an encrypted message, decrypts it using `key` and returns the plaintext.
///
/// Tagged messages must be `COSE_Encrypt0` or `COSE_Encrypt`, untagged messages are treated as
/// [`EncryptReadOptions::default_kind`] (`COSE_Encrypt` if unset).
///
/// # Errors
///
/// - [`CoseCipherError::CborDecode`], [`CoseCipherError::UnexpectedTag`] or
///   [`CoseCipherError::MalformedMessage`] if the message can not be parsed.
/// - [`CoseCipherError::MissingAlg`], [`CoseCipherError::UnknownAlgorithm`] or
///   [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm can not be determined.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - [`CoseCipherError::IvConflict`] if both `IV` and `Partial_IV` are present,
///   [`CoseCipherError::MissingContextIv`] if a partial IV is present but no context IV was
///   given, [`CoseCipherError::MissingIv`] if neither is present and
///   [`CoseCipherError::InvalidIvLength`] if the nonce has the wrong length.
/// - [`CoseCipherError::AuthenticationFailed`] if the ciphertext could not be authenticated.
pub fn read<B: EncryptCryptoBackend>(
    backend: &mut B,
    data: &[u8],
    key: &[u8],
    options: &EncryptReadOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let (kind, mut items) = framing::unwrap(
        framing::decode_first(data)?,
        &[MessageKind::Encrypt0, MessageKind::Encrypt],
        options.default_kind.unwrap_or(MessageKind::Encrypt),
    )?;
    if kind == MessageKind::Encrypt {
        let recipients = items.pop().unwrap_or(Value::Null);
        framing::take_single_layer(recipients, "recipients")?;
    }
    let [protected, unprotected, ciphertext] = framing::into_items(kind, items)?;
    let (protected, protected_bytes) =
        HeaderMap::read_protected(framing::take_bytes(protected, "protected header")?)?;
    let unprotected = HeaderMap::from_value(unprotected)?;
    let ciphertext = framing::take_bytes(ciphertext, "ciphertext")?;

    let alg = header::determine_algorithm(&protected, &unprotected)?;
    ensure_aead_algorithm(alg)?;
    let key = util::ensure_valid_symmetric_key(alg, key)?;
    let (iv, partial_iv) = iv_headers(&protected, &unprotected)?;
    let nonce = resolve_nonce(
        alg,
        iv.as_deref(),
        partial_iv.as_deref(),
        options.context_iv.as_deref(),
    )?;

    let aad = AuthStructure::encrypt(
        kind.context(),
        &protected_bytes,
        options.external_aad.as_deref().unwrap_or_default(),
    )
    .to_bytes()?;
    match decrypt_structure(backend, alg, key, &ciphertext, &aad, &nonce) {
        Ok(plaintext) => Ok(plaintext),
        Err(e) => {
            log::warn!("{kind} message could not be decrypted: {e}");
            Err(e.on_verification_failure(CoseCipherError::AuthenticationFailed))
        }
    }
}
