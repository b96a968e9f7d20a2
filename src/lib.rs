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

//! Creation and verification of COSE messages as specified in
//! [RFC 9052](https://datatracker.ietf.org/doc/html/rfc9052) and
//! [RFC 9053](https://datatracker.ietf.org/doc/html/rfc9053).
//!
//! This crate covers all six COSE message kinds that protect a payload directly:
//! - `COSE_Mac0` and `COSE_Mac` in the [`maced`] module,
//! - `COSE_Sign1` and `COSE_Sign` in the [`signed`] module,
//! - `COSE_Encrypt0` and `COSE_Encrypt` in the [`encrypted`] module.
//!
//! Headers are given by name (e.g. `"alg"`, `"kid"`, `"Partial_IV"`) in a [`NamedHeaders`] map
//! and translated to their registered labels; algorithms may be given by their mnemonic
//! (e.g. `"ES256"`, `"A128GCM"`, `"SHA-256_64"`).
//! The crate takes care of building the exact byte strings that are MACed, signed or encrypted
//! (see [`structure`]), of message framing (see [`framing`]) and of nonce derivation from
//! partial IVs.
//!
//! Recipients always use the shared key directly (`direct` key management), and at most one
//! recipient or signer per message is supported.
//!
//! # Usage
//! ```toml
//! [dependencies]
//! cose-msg = { version = "^0.1.0" }
//! ```
//! Or, if you plan to use this crate in a `no_std` environment:
//! ```toml
//! [dependencies]
//! cose-msg = { version = "^0.1.0", default-features = false, features = ["rustcrypto"] }
//! ```
//!
//! # Example
//! Creating a `COSE_Mac0` message and reading it again:
//! ```
//! # #[cfg(feature = "rustcrypto-hmac")]
//! # {
//! # use rand::rngs::OsRng;
//! use cose_msg::crypto_impl::rustcrypto::RustCryptoContext;
//! use cose_msg::{maced, CoseHeaders, MacCreateOptions, MacRecipient, NamedHeaders, ReadOptions, Recipients};
//!
//! let key = hex::decode("231f4c4d4d3051fdc2ec0a3851d5b383")?;
//! let mut backend = RustCryptoContext::new(OsRng);
//! let headers = CoseHeaders::new(
//!     NamedHeaders::new().with("alg", "SHA-256_64"),
//!     NamedHeaders::new().with("kid", "our-secret"),
//! );
//! let message = maced::create(
//!     &mut backend,
//!     &headers,
//!     b"Important message!",
//!     &Recipients::One(MacRecipient::new(&key)),
//!     None,
//!     &MacCreateOptions::default(),
//! )?;
//!
//! let payload = maced::read(&mut backend, &message, &key, None, &ReadOptions::default())?;
//! assert_eq!(payload, b"Important message!");
//! # }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Cryptographic Backends
//! All cryptographic operations are delegated to a backend implementing
//! [`CryptoBackend`] and the sub-traits [`MacCryptoBackend`], [`SignCryptoBackend`] and
//! [`EncryptCryptoBackend`]. Two backends are included:
//! - [`RustCryptoContext`](crypto_impl::rustcrypto::RustCryptoContext), based on the RustCrypto
//!   crates (feature `rustcrypto`, enabled by default; can be narrowed down using the
//!   `rustcrypto-*` features),
//! - [`OpensslContext`](crypto_impl::openssl::OpensslContext), based on OpenSSL
//!   (feature `openssl`).
//!
//! Custom backends only need to implement the operations they support, all other operations
//! return [`CoseCipherError::UnsupportedAlgorithm`] by default.
//!
//! # Errors
//! All operations return a [`CoseCipherError`], which is generic over the error type of the
//! backend. Failed verification is reported as
//! [`TagMismatch`](CoseCipherError::TagMismatch),
//! [`SignatureMismatch`](CoseCipherError::SignatureMismatch) or
//! [`AuthenticationFailed`](CoseCipherError::AuthenticationFailed), depending on the message kind.
//!
//! # Logging
//! The crate logs through the [`log`] facade, but never logs key material, nonces or payloads.

#![deny(rustdoc::broken_intra_doc_links, clippy::pedantic)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]
// These ones are a little too eager
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::wildcard_imports
)]
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;
extern crate core;
#[macro_use]
extern crate derive_builder;

#[doc(inline)]
pub use crypto_impl::CryptoBackend;
#[doc(inline)]
pub use encrypted::{EncryptCryptoBackend, EncryptOptions, EncryptReadOptions, EncryptRecipient};
#[doc(inline)]
pub use error::CoseCipherError;
#[doc(inline)]
pub use framing::{MessageKind, ReadOptions, Recipients};
#[doc(inline)]
pub use header::{CoseHeaders, NamedHeaders, ProtectedEncoding};
#[doc(inline)]
pub use key::{CoseAsymmetricKey, CoseEc2Key, CoseRsaKey, CoseSymmetricKey};
#[doc(inline)]
pub use maced::{MacCreateOptions, MacCryptoBackend, MacRecipient};
#[doc(inline)]
pub use signed::{SignCreateOptions, SignCryptoBackend, Signer, Verifier, VerifierResolver};

pub mod algorithm;
pub mod crypto_impl;
pub mod encrypted;
pub mod error;
pub mod framing;
pub mod header;
pub mod key;
pub mod maced;
pub mod signed;
pub mod structure;
pub mod util;

#[cfg(test)]
mod test_helper;
