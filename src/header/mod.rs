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

//! Header registry: translation of human-readable header maps into their wire representation.
//!
//! Callers describe headers using parameter names (`"alg"`, `"kid"`, ...) and convenient values
//! (`"ES256"`, a text key ID, ...) in a [`NamedHeaders`] map.
//! [`translate`] converts such a map into a [`HeaderMap`], which is keyed by the
//! IANA-registered integer labels and contains the values as they appear in a message.
//!
//! # Example
//! ```
//! # use cose_msg::header::{translate, NamedHeaders};
//! # use coset::iana;
//! # use ciborium::Value;
//! # use core::convert::Infallible;
//! let named = NamedHeaders::new().with("alg", "SHA-256").with("kid", "our-secret");
//! let headers = translate::<Infallible>(&named)?;
//! assert_eq!(headers.get(iana::HeaderParameter::Alg), Some(&Value::from(5)));
//! assert_eq!(
//!     headers.get(iana::HeaderParameter::Kid),
//!     Some(&Value::Bytes(b"our-secret".to_vec()))
//! );
//! # Ok::<(), cose_msg::error::CoseCipherError<Infallible>>(())
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str::FromStr;

use ciborium::Value;
use coset::iana;
use coset::iana::EnumI64;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::algorithm;
use crate::error::CoseCipherError;
use crate::framing;


/// Header parameters that can be set by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
pub enum HeaderName {
    /// Algorithm, given as mnemonic (e.g. `"ES256"`) or as registry value.
    #[strum(serialize = "alg")]
    Alg,
    /// Critical headers.
    #[strum(serialize = "crit")]
    Crit,
    /// Content type of the payload.
    #[strum(to_string = "content_type", serialize = "ctyp")]
    ContentType,
    /// Key identifier, text is converted to its UTF-8 bytes.
    #[strum(serialize = "kid")]
    Kid,
    /// Full initialization vector.
    #[strum(serialize = "IV")]
    Iv,
    /// Partial initialization vector.
    #[strum(serialize = "Partial_IV")]
    PartialIv,
    /// Counter signature.
    #[strum(serialize = "counter_signature")]
    CounterSignature,
}

impl HeaderName {
    /// Registered label of this header parameter.
    #[must_use]
    pub fn label(self) -> iana::HeaderParameter {
        match self {
            HeaderName::Alg => iana::HeaderParameter::Alg,
            HeaderName::Crit => iana::HeaderParameter::Crit,
            HeaderName::ContentType => iana::HeaderParameter::ContentType,
            HeaderName::Kid => iana::HeaderParameter::Kid,
            HeaderName::Iv => iana::HeaderParameter::Iv,
            HeaderName::PartialIv => iana::HeaderParameter::PartialIv,
            HeaderName::CounterSignature => iana::HeaderParameter::CounterSignature,
        }
    }

    /// Converts a user-supplied `value` for this parameter into its wire representation.
    fn translate_value<T>(self, value: &Value) -> Result<Value, CoseCipherError<T>> {
        match (self, value) {
            (HeaderName::Alg, Value::Text(name)) => {
                algorithm::by_name(name).map(|e| Value::from(e.code()))
            }
            (HeaderName::Alg, v) => algorithm::resolve_value(v).map(|e| Value::from(e.code())),
            (HeaderName::Kid, Value::Text(kid)) => Ok(Value::Bytes(kid.as_bytes().to_vec())),
            (_, v) => Ok(v.clone()),
        }
    }
}

/// How an empty protected header is put on the wire.
///
/// Only the message element is affected. The to-be-authenticated structures always carry an
/// empty protected header as a zero-length byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtectedEncoding {
    /// Encode the empty map, i.e. `h'A0'`.
    #[default]
    Map,
    /// Use a zero-length byte string, i.e. `h''`.
    Empty,
}

/// Ordered map of header parameters keyed by their names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedHeaders(Vec<(String, Value)>);

impl NamedHeaders {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> NamedHeaders {
        NamedHeaders::default()
    }

    /// Returns this map with the parameter `name` set to `value`.
    #[must_use]
    pub fn with<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> NamedHeaders {
        self.insert(name, value);
        self
    }

    /// Sets the parameter `name` to `value`, replacing a previous value.
    pub fn insert<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Whether no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for NamedHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = NamedHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Protected and unprotected headers of a message body, given by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseHeaders {
    /// Integrity-protected headers.
    pub protected: NamedHeaders,
    /// Unprotected headers.
    pub unprotected: NamedHeaders,
}

impl CoseHeaders {
    /// Creates a new header pair.
    #[must_use]
    pub fn new(protected: NamedHeaders, unprotected: NamedHeaders) -> CoseHeaders {
        CoseHeaders {
            protected,
            unprotected,
        }
    }
}

/// Ordered map from integer header label to value, as it appears in a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap(Vec<(i64, Value)>);

impl HeaderMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> HeaderMap {
        HeaderMap::default()
    }

    /// Returns the value of the registered parameter `label`.
    #[must_use]
    pub fn get(&self, label: iana::HeaderParameter) -> Option<&Value> {
        self.get_label(label.to_i64())
    }

    /// Returns the value stored under the integer `label`.
    #[must_use]
    pub fn get_label(&self, label: i64) -> Option<&Value> {
        self.0.iter().find(|(l, _)| *l == label).map(|(_, v)| v)
    }

    /// Returns the value of `label` as a byte string, if present and of that type.
    #[must_use]
    pub fn get_bytes(&self, label: iana::HeaderParameter) -> Option<&[u8]> {
        self.get(label).and_then(Value::as_bytes).map(Vec::as_slice)
    }

    /// Sets the registered parameter `label` to `value`, replacing a previous value.
    pub fn insert(&mut self, label: iana::HeaderParameter, value: Value) {
        self.insert_label(label.to_i64(), value);
    }

    /// Sets the integer `label` to `value`, replacing a previous value.
    pub fn insert_label(&mut self, label: i64, value: Value) {
        match self.0.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.0.push((label, value)),
        }
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> {
        self.0.iter().map(|(l, v)| (*l, v))
    }

    /// Converts this map into a CBOR map value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(l, v)| (Value::from(*l), v.clone()))
                .collect(),
        )
    }

    /// Parses a CBOR map value taken from a message.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::MalformedMessage`] if `value` is not a map, contains labels
    /// that are not integers or contains a label twice.
    pub fn from_value<T>(value: Value) -> Result<HeaderMap, CoseCipherError<T>> {
        let Value::Map(entries) = value else {
            return Err(CoseCipherError::malformed("header is not a map"));
        };
        let mut map = HeaderMap::new();
        for (label, value) in entries {
            let label = label
                .as_integer()
                .and_then(|i| i64::try_from(i).ok())
                .ok_or_else(|| CoseCipherError::malformed("header label is not an integer"))?;
            if map.get_label(label).is_some() {
                return Err(CoseCipherError::malformed("duplicate header label"));
            }
            map.0.push((label, value));
        }
        Ok(map)
    }

    /// Parses the serialized protected header of a message.
    ///
    /// A zero-length byte string yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::CborDecode`] if `bytes` are not valid CBOR and the errors of
    /// [`HeaderMap::from_value`] otherwise.
    pub fn decode_protected<T>(bytes: &[u8]) -> Result<HeaderMap, CoseCipherError<T>> {
        if bytes.is_empty() {
            return Ok(HeaderMap::new());
        }
        HeaderMap::from_value(framing::decode_first(bytes)?)
    }

    /// Parses the serialized protected header of a received message and returns it together with
    /// the bytes to use in the to-be-authenticated structure.
    ///
    /// A non-empty header is authenticated as received. An empty one is authenticated as `h''`,
    /// no matter if it was sent as `h''` or as `h'A0'`.
    ///
    /// # Errors
    ///
    /// Same as [`HeaderMap::decode_protected`].
    pub fn read_protected<T>(bytes: Vec<u8>) -> Result<(HeaderMap, Vec<u8>), CoseCipherError<T>> {
        let map = HeaderMap::decode_protected(&bytes)?;
        if map.is_empty() {
            return Ok((map, Vec::new()));
        }
        Ok((map, bytes))
    }

    /// Serializes this map as protected header bytes for use in a to-be-authenticated
    /// structure, where an empty map is always a zero-length byte string.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::CborEncode`] if serialization fails.
    pub fn structure_bytes<T>(&self) -> Result<Vec<u8>, CoseCipherError<T>> {
        self.wire_bytes(ProtectedEncoding::Empty)
    }

    /// Serializes this map as the protected header element of a message.
    ///
    /// An empty map becomes a zero-length byte string if `encoding` is
    /// [`ProtectedEncoding::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::CborEncode`] if serialization fails.
    pub fn wire_bytes<T>(&self, encoding: ProtectedEncoding) -> Result<Vec<u8>, CoseCipherError<T>> {
        if self.is_empty() && encoding == ProtectedEncoding::Empty {
            Ok(Vec::new())
        } else {
            framing::encode(&self.to_value())
        }
    }
}

/// Translates a header map keyed by parameter names into its wire representation.
///
/// `kid` values given as text are converted to their UTF-8 bytes, `alg` values given as
/// mnemonic are converted to their registry value.
/// All other values are taken over unchanged.
///
/// # Errors
///
/// - [`CoseCipherError::UnknownParameter`] if a name is not a known header parameter.
/// - [`CoseCipherError::UnknownAlgorithm`] if the `alg` mnemonic is unknown.
pub fn translate<T>(named: &NamedHeaders) -> Result<HeaderMap, CoseCipherError<T>> {
    let mut map = HeaderMap::new();
    for (name, value) in named.iter() {
        let param = HeaderName::from_str(name)
            .map_err(|_| CoseCipherError::UnknownParameter(name.to_string()))?;
        map.insert(param.label(), param.translate_value(value)?);
    }
    Ok(map)
}

/// Looks up `label` in the `protected` header first and in the `unprotected` header second.
#[must_use]
pub fn find<'a>(
    protected: &'a HeaderMap,
    unprotected: &'a HeaderMap,
    label: iana::HeaderParameter,
) -> Option<&'a Value> {
    protected.get(label).or_else(|| unprotected.get(label))
}

/// Determines the algorithm of a layer from its `protected` and `unprotected` headers.
///
/// # Errors
///
/// - [`CoseCipherError::MissingAlg`] if neither header contains an algorithm.
/// - The errors of [`algorithm::resolve_value`] if the algorithm is unknown or unsupported.
pub fn determine_algorithm<T>(
    protected: &HeaderMap,
    unprotected: &HeaderMap,
) -> Result<&'static algorithm::AlgorithmEntry, CoseCipherError<T>> {
    find(protected, unprotected, iana::HeaderParameter::Alg)
        .ok_or(CoseCipherError::MissingAlg)
        .and_then(algorithm::resolve_value)
}
