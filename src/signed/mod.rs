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

//! Signed messages (`COSE_Sign1` and `COSE_Sign`).
//!
//! [`create`] signs a payload with one [`Signer`], [`verify`] checks the signature of a received
//! message using a [`Verifier`] (or anything implementing [`VerifierResolver`]) and returns the
//! payload.
//!
//! # Example
//! ```
//! # #[cfg(feature = "rustcrypto-ecdsa")]
//! # {
//! # use rand::rngs::OsRng;
//! use coset::iana;
//! use cose_msg::crypto_impl::rustcrypto::RustCryptoContext;
//! use cose_msg::framing::{ReadOptions, Recipients};
//! use cose_msg::header::{CoseHeaders, NamedHeaders};
//! use cose_msg::key::CoseEc2Key;
//! use cose_msg::signed::{self, SignCreateOptions, Signer, Verifier};
//!
//! let d = hex::decode("aff907c99f9ad3aae6c4cdf21122bce2bd68b5283e6907154ad911840fa208cf")?;
//! let x = hex::decode("65eda5a12577c2bae829437fe338701a10aaa375e1bb5b5de108de439c08551d")?;
//! let y = hex::decode("1e52ed75701163f7f9e40ddf9f341b3dc9ba860af7e0ca7ca7e9eecd0084d19c")?;
//!
//! let mut backend = RustCryptoContext::new(OsRng);
//! let headers = CoseHeaders::new(
//!     NamedHeaders::new().with("alg", "ES256"),
//!     NamedHeaders::new().with("kid", "11"),
//! );
//! let signer = Signer::new(CoseEc2Key::private(iana::EllipticCurve::P_256, &d));
//! let message = signed::create(
//!     &mut backend,
//!     &headers,
//!     b"Important message!",
//!     &Recipients::One(signer),
//!     &SignCreateOptions::default(),
//! )?;
//!
//! let verifier = Verifier::new(CoseEc2Key::public(iana::EllipticCurve::P_256, &x, &y));
//! let payload = signed::verify(&mut backend, &message, verifier, &ReadOptions::default())?;
//! assert_eq!(payload, b"Important message!");
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
use crate::framing::{self, MessageKind, ReadOptions, Recipients};
use crate::header::{self, CoseHeaders, HeaderMap, NamedHeaders, ProtectedEncoding};
use crate::key::{CoseAsymmetricKey, CoseEc2Key, CoseRsaKey};
use crate::structure::AuthStructure;

#[cfg(test)]
mod tests;

/// Trait for cryptographic backends that can perform signature creation and verification for
/// algorithms used in COSE structures.
///
/// All methods have a default implementation returning
/// [`CoseCipherError::UnsupportedAlgorithm`], so backends only implement what they support.
pub trait SignCryptoBackend: CryptoBackend {
    /// Cryptographically signs the `payload` value with the `key` provided and returns the
    /// signature value.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The ECDSA variant to use (determines the hash function).
    ///                 If unsupported by the backend, a [`CoseCipherError::UnsupportedAlgorithm`]
    ///                 error should be returned.
    /// * `key` - Elliptic curve key that should be used. Only `d` is guaranteed to be set.
    ///           If the curve is not supported, [`CoseCipherError::UnsupportedCurve`] should be
    ///           returned.
    /// * `payload` - Data to be signed. The hash function is applied by the backend.
    ///
    /// # Returns
    ///
    /// The signature in its fixed-size `r || s` form, where both components are padded to the
    /// field size of the curve (e.g. 66 bytes each for P-521).
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    /// For backend-specific errors, [`CoseCipherError::Other`] may be used to convey a
    /// backend-specific error.
    #[allow(unused_variables)]
    fn sign_ecdsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Verifies the `signature` of the `payload` using the ECDSA variant `algorithm` and the
    /// public `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the signature is invalid (including a
    /// signature of the wrong length), or any other [`CoseCipherError`] in case of errors.
    #[allow(unused_variables)]
    fn verify_ecdsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        signature: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Signs the `payload` using RSASSA-PKCS1-v1_5 or RSASSA-PSS (as given by `algorithm`) and
    /// the private `key`.
    ///
    /// For RSASSA-PSS, the salt length equals the output length of the hash function
    /// (RFC 8230, Section 2).
    ///
    /// # Errors
    ///
    /// In case of errors, the implementation may return any valid [`CoseCipherError`].
    #[allow(unused_variables)]
    fn sign_rsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }

    /// Verifies the RSA `signature` of the `payload` using the public `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::VerificationFailure`] if the signature is invalid, or any other
    /// [`CoseCipherError`] in case of errors.
    #[allow(unused_variables)]
    fn verify_rsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        signature: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
    }
}

/// The signer of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Signer<'a> {
    /// Private key used for signing.
    pub key: CoseAsymmetricKey<'a>,
    /// Protected header of the signer layer (`COSE_Sign` only).
    pub protected: NamedHeaders,
    /// Unprotected header of the signer layer (`COSE_Sign` only).
    pub unprotected: NamedHeaders,
    /// Externally supplied data that is covered by the signature.
    pub external_aad: Option<&'a [u8]>,
}

impl<'a> Signer<'a> {
    /// Creates a signer using the private `key`, with empty headers.
    #[must_use]
    pub fn new<K: Into<CoseAsymmetricKey<'a>>>(key: K) -> Signer<'a> {
        Signer {
            key: key.into(),
            protected: NamedHeaders::new(),
            unprotected: NamedHeaders::new(),
            external_aad: None,
        }
    }

    /// Returns this signer with the given signer-layer headers.
    #[must_use]
    pub fn with_headers(mut self, protected: NamedHeaders, unprotected: NamedHeaders) -> Self {
        self.protected = protected;
        self.unprotected = unprotected;
        self
    }

    /// Returns this signer with the given external additional authenticated data.
    #[must_use]
    pub fn with_external_aad(mut self, external_aad: &'a [u8]) -> Self {
        self.external_aad = Some(external_aad);
        self
    }
}

/// Public key material used to verify a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verifier<'a> {
    /// Public key used for verification.
    pub key: CoseAsymmetricKey<'a>,
    /// Key ID this verifier is responsible for.
    ///
    /// A verifier without key ID is used for any signer.
    pub kid: Option<&'a [u8]>,
    /// Externally supplied data that is covered by the signature.
    pub external_aad: Option<&'a [u8]>,
}

impl<'a> Verifier<'a> {
    /// Creates a verifier using the public `key`, matching any key ID.
    #[must_use]
    pub fn new<K: Into<CoseAsymmetricKey<'a>>>(key: K) -> Verifier<'a> {
        Verifier {
            key: key.into(),
            kid: None,
            external_aad: None,
        }
    }

    /// Returns this verifier restricted to signers with the given key ID.
    #[must_use]
    pub fn with_kid(mut self, kid: &'a [u8]) -> Self {
        self.kid = Some(kid);
        self
    }

    /// Returns this verifier with the given external additional authenticated data.
    #[must_use]
    pub fn with_external_aad(mut self, external_aad: &'a [u8]) -> Self {
        self.external_aad = Some(external_aad);
        self
    }
}

/// Resolves the [`Verifier`] to use for a signer, given the signer's key ID.
///
/// Implemented for [`Verifier`] itself (matching by key ID) and for closures of the form
/// `FnMut(Option<&[u8]>) -> Option<Verifier>`.
pub trait VerifierResolver<'a> {
    /// Returns the verifier for a signer with key ID `kid`, or `None` if there is none.
    fn resolve(&mut self, kid: Option<&[u8]>) -> Option<Verifier<'a>>;
}

impl<'a> VerifierResolver<'a> for Verifier<'a> {
    fn resolve(&mut self, kid: Option<&[u8]>) -> Option<Verifier<'a>> {
        match (self.kid, kid) {
            (None, _) => Some(*self),
            (Some(own), Some(kid)) if own == kid => Some(*self),
            _ => None,
        }
    }
}

impl<'a, F> VerifierResolver<'a> for F
where
    F: FnMut(Option<&[u8]>) -> Option<Verifier<'a>>,
{
    fn resolve(&mut self, kid: Option<&[u8]>) -> Option<Verifier<'a>> {
        self(kid)
    }
}

/// Options for creating signed messages.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(no_std, setter(into, strip_option), derive(Debug, PartialEq))]
pub struct SignCreateOptions {
    /// How to put an empty body protected header on the wire.
    #[builder(default)]
    pub encode_protected: ProtectedEncoding,
    /// Emit the message without its CBOR tag.
    #[builder(default)]
    pub exclude_tag: bool,
}

impl SignCreateOptions {
    /// Initializes and returns a new [`SignCreateOptionsBuilder`].
    #[must_use]
    pub fn builder() -> SignCreateOptionsBuilder {
        SignCreateOptionsBuilder::default()
    }
}

fn ensure_signature_algorithm<T>(alg: &AlgorithmEntry) -> Result<(), CoseCipherError<T>> {
    if alg.is_signature() {
        Ok(())
    } else {
        Err(CoseCipherError::UnsupportedAlgorithm(alg.code()))
    }
}

fn key_mismatch<T>(alg: &AlgorithmEntry) -> CoseCipherError<T> {
    CoseCipherError::InvalidKey(format!("key type does not match algorithm {}", alg.name()))
}

fn sign_structure<B: SignCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: &CoseAsymmetricKey<'_>,
    to_be_signed: &[u8],
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    match (alg.family, key) {
        (AlgorithmFamily::Ecdsa { .. }, CoseAsymmetricKey::Ec2(key)) => {
            backend.sign_ecdsa(alg.alg, key, to_be_signed)
        }
        (
            AlgorithmFamily::RsaPkcs1 { .. } | AlgorithmFamily::RsaPss { .. },
            CoseAsymmetricKey::Rsa(key),
        ) => backend.sign_rsa(alg.alg, key, to_be_signed),
        _ => Err(key_mismatch(alg)),
    }
}

fn verify_structure<B: SignCryptoBackend>(
    backend: &mut B,
    alg: &AlgorithmEntry,
    key: &CoseAsymmetricKey<'_>,
    signature: &[u8],
    to_be_signed: &[u8],
) -> Result<(), CoseCipherError<B::Error>> {
    match (alg.family, key) {
        (AlgorithmFamily::Ecdsa { .. }, CoseAsymmetricKey::Ec2(key)) => {
            backend.verify_ecdsa(alg.alg, key, signature, to_be_signed)
        }
        (
            AlgorithmFamily::RsaPkcs1 { .. } | AlgorithmFamily::RsaPss { .. },
            CoseAsymmetricKey::Rsa(key),
        ) => backend.verify_rsa(alg.alg, key, signature, to_be_signed),
        _ => Err(key_mismatch(alg)),
    }
}

/// Creates a signed message.
///
/// With [`Recipients::One`], a `COSE_Sign1` message is created. Its algorithm is taken from the
/// body `headers` and the headers of the [`Signer`] are ignored. The message is encoded as
/// canonical CBOR.
///
/// With [`Recipients::Many`] (which has to contain exactly one signer) a `COSE_Sign` message is
/// created, whose algorithm is taken from the signer's headers.
///
/// # Errors
///
/// - [`CoseCipherError::UnknownParameter`] or [`CoseCipherError::UnknownAlgorithm`] if a header
///   can not be translated.
/// - [`CoseCipherError::MissingAlg`] if no algorithm is given.
/// - [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm is not a signature algorithm.
/// - [`CoseCipherError::NoRecipients`] or [`CoseCipherError::TooManyRecipients`] if the signer
///   list does not contain exactly one entry.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - Errors of the backend.
pub fn create<B: SignCryptoBackend>(
    backend: &mut B,
    headers: &CoseHeaders,
    payload: &[u8],
    signers: &Recipients<Signer<'_>>,
    options: &SignCreateOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let protected = header::translate(&headers.protected)?;
    let unprotected = header::translate(&headers.unprotected)?;
    let (kind, signer) = signers.select(MessageKind::Sign1, MessageKind::Sign)?;
    let protected_bytes = protected.structure_bytes()?;
    let external_aad = signer.external_aad.unwrap_or_default();

    let mut items = vec![
        Value::Bytes(protected.wire_bytes(options.encode_protected)?),
        unprotected.to_value(),
        Value::Bytes(payload.to_vec()),
    ];
    let message = if kind == MessageKind::Sign1 {
        let alg = header::determine_algorithm(&protected, &unprotected)?;
        ensure_signature_algorithm(alg)?;
        let to_be_signed =
            AuthStructure::signature1(&protected_bytes, external_aad, payload).to_bytes()?;
        log::trace!("Sig_structure has {} bytes", to_be_signed.len());
        let signature = sign_structure(backend, alg, &signer.key, &to_be_signed)?;
        items.push(Value::Bytes(signature));
        log::debug!("created {kind} message using {}", alg.name());
        framing::encode_canonical(&framing::wrap(kind, items, options.exclude_tag))?
    } else {
        let signer_protected = header::translate(&signer.protected)?;
        let signer_unprotected = header::translate(&signer.unprotected)?;
        let alg = header::determine_algorithm(&signer_protected, &signer_unprotected)?;
        ensure_signature_algorithm(alg)?;
        let signer_protected_bytes = signer_protected.structure_bytes()?;
        let to_be_signed = AuthStructure::signature(
            &protected_bytes,
            &signer_protected_bytes,
            external_aad,
            payload,
        )
        .to_bytes()?;
        log::trace!("Sig_structure has {} bytes", to_be_signed.len());
        let signature = sign_structure(backend, alg, &signer.key, &to_be_signed)?;
        items.push(Value::Array(vec![Value::Array(vec![
            Value::Bytes(signer_protected_bytes),
            signer_unprotected.to_value(),
            Value::Bytes(signature),
        ])]));
        log::debug!("created {kind} message using {}", alg.name());
        framing::encode(&framing::wrap(kind, items, options.exclude_tag))?
    };
    Ok(message)
}

fn kid_of<'h>(protected: &'h HeaderMap, unprotected: &'h HeaderMap) -> Option<&'h [u8]> {
    header::find(protected, unprotected, iana::HeaderParameter::Kid)
        .and_then(Value::as_bytes)
        .map(Vec::as_slice)
}

/// A signer layer of a received `COSE_Sign` message.
struct ReceivedSigner {
    protected: HeaderMap,
    protected_bytes: Vec<u8>,
    unprotected: HeaderMap,
    signature: Vec<u8>,
}

impl ReceivedSigner {
    fn parse<T>(value: Value) -> Result<ReceivedSigner, CoseCipherError<T>> {
        let items = framing::take_array(value, "signer")?;
        let [protected, unprotected, signature] = <[Value; 3]>::try_from(items).map_err(|e| {
            CoseCipherError::malformed(format!("signer has {} elements instead of 3", e.len()))
        })?;
        let (protected, protected_bytes) =
            HeaderMap::read_protected(framing::take_bytes(protected, "signer protected header")?)?;
        Ok(ReceivedSigner {
            protected,
            protected_bytes,
            unprotected: HeaderMap::from_value(unprotected)?,
            signature: framing::take_bytes(signature, "signature")?,
        })
    }
}

/// Verifies a signed message and returns its payload.
///
/// Tagged messages must be `COSE_Sign1` or `COSE_Sign`, untagged messages are treated as
/// [`ReadOptions::default_kind`] (`COSE_Sign` if unset).
///
/// The `resolver` is asked for a verifier using the key ID of the message (`COSE_Sign1`) or of
/// each signer in order (`COSE_Sign`), the first signer it returns a verifier for is checked.
///
/// # Errors
///
/// - [`CoseCipherError::CborDecode`], [`CoseCipherError::UnexpectedTag`] or
///   [`CoseCipherError::MalformedMessage`] if the message can not be parsed.
/// - [`CoseCipherError::SignerNotFound`] if no verifier could be resolved for any signer.
/// - [`CoseCipherError::MissingAlg`], [`CoseCipherError::UnknownAlgorithm`] or
///   [`CoseCipherError::UnsupportedAlgorithm`] if the algorithm can not be determined.
/// - [`CoseCipherError::InvalidKey`] if the key does not fit the algorithm.
/// - [`CoseCipherError::SignatureMismatch`] if the signature is not valid. The error carries the
///   (unauthenticated) payload.
pub fn verify<'a, B: SignCryptoBackend, R: VerifierResolver<'a>>(
    backend: &mut B,
    data: &[u8],
    mut resolver: R,
    options: &ReadOptions,
) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
    let (kind, items) = framing::unwrap(
        framing::decode_first(data)?,
        &[MessageKind::Sign1, MessageKind::Sign],
        options.default_kind.unwrap_or(MessageKind::Sign),
    )?;
    let [protected, unprotected, payload, last] = framing::into_items(kind, items)?;
    let (protected, protected_bytes) =
        HeaderMap::read_protected(framing::take_bytes(protected, "protected header")?)?;
    let unprotected = HeaderMap::from_value(unprotected)?;
    let payload = framing::take_payload(payload)?;

    let (alg, verifier, signature, to_be_signed) = if kind == MessageKind::Sign1 {
        let signature = framing::take_bytes(last, "signature")?;
        let kid = kid_of(&protected, &unprotected);
        let verifier = resolver
            .resolve(kid)
            .ok_or_else(|| CoseCipherError::SignerNotFound(kid.map(<[u8]>::to_vec)))?;
        let alg = header::determine_algorithm(&protected, &unprotected)?;
        ensure_signature_algorithm(alg)?;
        let to_be_signed = AuthStructure::signature1(
            &protected_bytes,
            verifier.external_aad.unwrap_or_default(),
            &payload,
        )
        .to_bytes()?;
        (alg, verifier, signature, to_be_signed)
    } else {
        let mut last_kid = None;
        let mut selected = None;
        for (index, entry) in framing::take_array(last, "signers")?
            .into_iter()
            .enumerate()
        {
            let signer = ReceivedSigner::parse(entry)?;
            let kid = kid_of(&signer.protected, &signer.unprotected);
            if let Some(verifier) = resolver.resolve(kid) {
                log::debug!("using signer {index} of {kind} message");
                selected = Some((signer, verifier));
                break;
            }
            last_kid = kid.map(<[u8]>::to_vec);
        }
        let (signer, verifier) = selected.ok_or(CoseCipherError::SignerNotFound(last_kid))?;
        let alg = header::determine_algorithm(&signer.protected, &signer.unprotected)?;
        ensure_signature_algorithm(alg)?;
        let to_be_signed = AuthStructure::signature(
            &protected_bytes,
            &signer.protected_bytes,
            verifier.external_aad.unwrap_or_default(),
            &payload,
        )
        .to_bytes()?;
        (alg, verifier, signer.signature, to_be_signed)
    };

    match verify_structure(backend, alg, &verifier.key, &signature, &to_be_signed) {
        Ok(()) => Ok(payload),
        Err(e) => {
            log::warn!("signature of {kind} message could not be verified: {e}");
            Err(e.on_verification_failure(CoseCipherError::SignatureMismatch(payload)))
        }
    }
}
