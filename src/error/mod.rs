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

//! This module contains the error type used across this crate.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};

use ciborium::Value;

/// Error type returned by all COSE operations of this crate.
///
/// `T` is the error type of the cryptographic backend in use, errors of the backend itself are
/// wrapped in [`CoseCipherError::Other`].
///
/// None of these errors are transient: retrying the same operation with the same inputs will
/// produce the same error.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CoseCipherError<T> {
    /// A header name that is not part of the header registry was supplied.
    UnknownParameter(String),
    /// The algorithm (given as mnemonic or registry value) is not a registered COSE algorithm.
    UnknownAlgorithm(Value),
    /// The algorithm is registered, but not supported for the requested operation.
    UnsupportedAlgorithm(i64),
    /// The elliptic curve of a key is not supported by the backend.
    UnsupportedCurve(i64),
    /// Neither the protected nor the unprotected header contain an algorithm.
    MissingAlg,
    /// The message carries a CBOR tag that does not belong to the expected message kinds.
    UnexpectedTag(u64),
    /// The message has the wrong structure (array arity or element type).
    MalformedMessage(String),
    /// A plural message kind was requested with an empty recipient or signer list.
    NoRecipients,
    /// More than one recipient or signer was provided, which is not implemented.
    TooManyRecipients(usize),
    /// Both an IV and a partial IV header are present.
    IvConflict,
    /// The message contains a partial IV, but no context IV was provided.
    MissingContextIv,
    /// The message contains neither an IV nor a partial IV.
    MissingIv,
    /// The (derived) IV does not have the length required by the algorithm.
    InvalidIvLength {
        /// Length required by the algorithm.
        expected: usize,
        /// Length of the IV that was found.
        actual: usize,
    },
    /// The MAC tag of a message does not match the recomputed one.
    TagMismatch,
    /// The signature of a message is not valid.
    ///
    /// Contains the payload that was decoded from the message. It has not been authenticated
    /// and must be treated as untrusted.
    SignatureMismatch(Vec<u8>),
    /// Authenticated decryption failed (forged or corrupted ciphertext, wrong key or AAD).
    AuthenticationFailed,
    /// No verifier could be resolved for any signer of the message.
    ///
    /// Contains the key ID that was tried last (if the signer had one).
    SignerNotFound(Option<Vec<u8>>),
    /// The provided key material can not be used for the requested algorithm.
    InvalidKey(String),
    /// A value could not be serialized to CBOR.
    CborEncode(String),
    /// The input could not be deserialized from CBOR.
    CborDecode(String),
    /// The backend could not verify a MAC, signature or ciphertext.
    ///
    /// Backends return this variant, the message level operations translate it into
    /// [`TagMismatch`](CoseCipherError::TagMismatch),
    /// [`SignatureMismatch`](CoseCipherError::SignatureMismatch) or
    /// [`AuthenticationFailed`](CoseCipherError::AuthenticationFailed).
    VerificationFailure,
    /// Backend-specific error.
    Other(T),
}

impl<T> CoseCipherError<T> {
    /// Replaces a [`VerificationFailure`](CoseCipherError::VerificationFailure) with the given
    /// message-level error, leaving all other errors untouched.
    pub(crate) fn on_verification_failure(self, replacement: CoseCipherError<T>) -> Self {
        match self {
            CoseCipherError::VerificationFailure => replacement,
            e => e,
        }
    }

    pub(crate) fn malformed<S: Into<String>>(message: S) -> Self {
        CoseCipherError::MalformedMessage(message.into())
    }
}

impl<T: Display> Display for CoseCipherError<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            CoseCipherError::UnknownParameter(name) => write!(f, "unknown parameter '{name}'"),
            CoseCipherError::UnknownAlgorithm(alg) => write!(f, "unknown algorithm {alg:?}"),
            CoseCipherError::UnsupportedAlgorithm(alg) => {
                write!(f, "unsupported algorithm {alg}")
            }
            CoseCipherError::UnsupportedCurve(crv) => write!(f, "unsupported curve {crv}"),
            CoseCipherError::MissingAlg => write!(f, "missing mandatory parameter 'alg'"),
            CoseCipherError::UnexpectedTag(tag) => write!(f, "unexpected CBOR tag {tag}"),
            CoseCipherError::MalformedMessage(m) => write!(f, "malformed message: {m}"),
            CoseCipherError::NoRecipients => {
                write!(f, "there has to be at least one recipient")
            }
            CoseCipherError::TooManyRecipients(n) => write!(
                f,
                "{n} recipients were given, but only a single one is implemented"
            ),
            CoseCipherError::IvConflict => write!(
                f,
                "IV and Partial IV parameters must not both be present in the same security layer"
            ),
            CoseCipherError::MissingContextIv => {
                write!(f, "context IV must be provided when Partial IV is used")
            }
            CoseCipherError::MissingIv => write!(f, "message contains neither IV nor Partial IV"),
            CoseCipherError::InvalidIvLength { expected, actual } => {
                write!(f, "IV has length {actual}, expected {expected}")
            }
            CoseCipherError::TagMismatch => write!(f, "tag mismatch"),
            CoseCipherError::SignatureMismatch(_) => write!(f, "signature mismatch"),
            CoseCipherError::AuthenticationFailed => write!(f, "authentication failed"),
            CoseCipherError::SignerNotFound(Some(kid)) => {
                write!(f, "no verifier found for key ID {kid:02x?}")
            }
            CoseCipherError::SignerNotFound(None) => write!(f, "no verifier found"),
            CoseCipherError::InvalidKey(m) => write!(f, "invalid key: {m}"),
            CoseCipherError::CborEncode(m) => write!(f, "unable to encode CBOR: {m}"),
            CoseCipherError::CborDecode(m) => write!(f, "unable to decode CBOR: {m}"),
            CoseCipherError::VerificationFailure => write!(f, "verification failed"),
            CoseCipherError::Other(e) => write!(f, "backend error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
mod std_error {
    use core::fmt::Debug;
    use std::error::Error;

    use super::*;

    impl<T: Debug + Display> Error for CoseCipherError<T> {}
}

#[cfg(test)]
mod tests;
