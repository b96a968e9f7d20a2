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

//! Message framing: CBOR tags, array shapes and the CBOR encoding helpers shared by all
//! message kinds.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::fmt::Debug;

use ciborium::Value;
use ciborium_io::Write;
use coset::iana;
use strum_macros::Display;

use crate::error::CoseCipherError;
use crate::structure::StructureContext;


/// The six COSE message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MessageKind {
    /// `COSE_Encrypt0`, encrypted message with implicit recipient.
    Encrypt0,
    /// `COSE_Mac0`, MACed message with implicit recipient.
    Mac0,
    /// `COSE_Sign1`, message with a single signature.
    Sign1,
    /// `COSE_Encrypt`, encrypted message with recipients.
    Encrypt,
    /// `COSE_Mac`, MACed message with recipients.
    Mac,
    /// `COSE_Sign`, message with signers.
    Sign,
}

impl MessageKind {
    /// The CBOR tag identifying this message kind.
    #[must_use]
    pub fn tag(self) -> u64 {
        let tag = match self {
            MessageKind::Encrypt0 => iana::CborTag::CoseEncrypt0,
            MessageKind::Mac0 => iana::CborTag::CoseMac0,
            MessageKind::Sign1 => iana::CborTag::CoseSign1,
            MessageKind::Encrypt => iana::CborTag::CoseEncrypt,
            MessageKind::Mac => iana::CborTag::CoseMac,
            MessageKind::Sign => iana::CborTag::CoseSign,
        };
        tag as u64
    }

    /// Determines the message kind from its CBOR `tag`.
    #[must_use]
    pub fn from_tag(tag: u64) -> Option<MessageKind> {
        [
            MessageKind::Encrypt0,
            MessageKind::Mac0,
            MessageKind::Sign1,
            MessageKind::Encrypt,
            MessageKind::Mac,
            MessageKind::Sign,
        ]
        .into_iter()
        .find(|k| k.tag() == tag)
    }

    /// Number of elements in the top-level array of this message kind.
    #[must_use]
    pub fn array_len(self) -> usize {
        match self {
            MessageKind::Encrypt0 => 3,
            MessageKind::Mac0 | MessageKind::Sign1 | MessageKind::Encrypt | MessageKind::Sign => 4,
            MessageKind::Mac => 5,
        }
    }

    /// Context string used in the to-be-authenticated structure of this message kind.
    #[must_use]
    pub fn context(self) -> StructureContext {
        match self {
            MessageKind::Encrypt0 => StructureContext::Encrypt0,
            MessageKind::Mac0 => StructureContext::Mac0,
            MessageKind::Sign1 => StructureContext::Signature1,
            MessageKind::Encrypt => StructureContext::Encrypt,
            MessageKind::Mac => StructureContext::Mac,
            MessageKind::Sign => StructureContext::Signature,
        }
    }
}

/// Either a single recipient (or signer), which selects the message kind without recipient
/// layer, or a list of them, which selects the kind with one.
///
/// Lists currently have to contain exactly one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipients<R> {
    /// Implicit recipient, e.g. `COSE_Mac0`.
    One(R),
    /// Explicit recipient list, e.g. `COSE_Mac`.
    Many(Vec<R>),
}

impl<R> Recipients<R> {
    /// Determines the message kind (`single` or `plural`) and the recipient to use.
    pub(crate) fn select<T>(
        &self,
        single: MessageKind,
        plural: MessageKind,
    ) -> Result<(MessageKind, &R), CoseCipherError<T>> {
        match self {
            Recipients::One(r) => Ok((single, r)),
            Recipients::Many(list) => match list.as_slice() {
                [] => Err(CoseCipherError::NoRecipients),
                [r] => Ok((plural, r)),
                _ => Err(CoseCipherError::TooManyRecipients(list.len())),
            },
        }
    }
}

/// Options for reading MACed and signed messages.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(no_std, setter(into, strip_option), derive(Debug, PartialEq))]
pub struct ReadOptions {
    /// Kind to assume for messages without CBOR tag.
    ///
    /// Defaults to `COSE_Mac0` when reading MACed and to `COSE_Sign` when reading signed messages.
    #[builder(default)]
    pub default_kind: Option<MessageKind>,
}

impl ReadOptions {
    /// Initializes and returns a new [`ReadOptionsBuilder`].
    #[must_use]
    pub fn builder() -> ReadOptionsBuilder {
        ReadOptionsBuilder::default()
    }
}

/// Builds the message value of the given `kind` from its array `items`, wrapped in the kind's
/// CBOR tag unless `exclude_tag` is set.
#[must_use]
pub fn wrap(kind: MessageKind, items: Vec<Value>, exclude_tag: bool) -> Value {
    debug_assert_eq!(items.len(), kind.array_len());
    let array = Value::Array(items);
    if exclude_tag {
        array
    } else {
        Value::Tag(kind.tag(), Box::new(array))
    }
}

/// Determines the kind of a decoded message and returns its array items.
///
/// A tagged message must carry the tag of one of the `accepted` kinds.
/// An untagged message is treated as `default_kind`.
///
/// # Errors
///
/// - [`CoseCipherError::UnexpectedTag`] if the tag (or `default_kind`) is not accepted.
/// - [`CoseCipherError::MalformedMessage`] if the message is not an array of the length
///   required by its kind.
pub fn unwrap<T>(
    value: Value,
    accepted: &[MessageKind],
    default_kind: MessageKind,
) -> Result<(MessageKind, Vec<Value>), CoseCipherError<T>> {
    let (kind, inner) = match value {
        Value::Tag(tag, inner) => {
            let kind = MessageKind::from_tag(tag)
                .filter(|k| accepted.contains(k))
                .ok_or(CoseCipherError::UnexpectedTag(tag))?;
            (kind, *inner)
        }
        v if accepted.contains(&default_kind) => (default_kind, v),
        _ => return Err(CoseCipherError::UnexpectedTag(default_kind.tag())),
    };
    let Value::Array(items) = inner else {
        return Err(CoseCipherError::malformed(format!(
            "{kind} message is not an array"
        )));
    };
    if items.len() != kind.array_len() {
        return Err(CoseCipherError::malformed(format!(
            "expected array of length {} for {kind} message, got {}",
            kind.array_len(),
            items.len()
        )));
    }
    log::debug!("decoded {kind} message");
    Ok((kind, items))
}

/// Serializes `value` to CBOR.
///
/// # Errors
///
/// Returns [`CoseCipherError::CborEncode`] if serialization fails.
pub fn encode<T>(value: &Value) -> Result<Vec<u8>, CoseCipherError<T>> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf)?;
    Ok(buf)
}

/// Serializes `value` to CBOR into the given `writer`.
///
/// # Errors
///
/// Returns [`CoseCipherError::CborEncode`] if serialization or writing fails.
pub fn encode_into<T, W: Write>(value: &Value, writer: W) -> Result<(), CoseCipherError<T>>
where
    W::Error: Debug,
{
    ciborium::ser::into_writer(value, writer)
        .map_err(|e| CoseCipherError::CborEncode(format!("{e:?}")))
}

/// Serializes `value` to canonical CBOR, i.e. with the keys of all maps sorted by the length
/// and then the bytes of their encoding.
///
/// # Errors
///
/// Returns [`CoseCipherError::CborEncode`] if serialization fails.
pub fn encode_canonical<T>(value: &Value) -> Result<Vec<u8>, CoseCipherError<T>> {
    encode(&canonicalize(value)?)
}

fn canonicalize<T>(value: &Value) -> Result<Value, CoseCipherError<T>> {
    Ok(match value {
        Value::Map(entries) => {
            let mut keyed = entries
                .iter()
                .map(|(k, v)| Ok((encode::<T>(k)?, canonicalize(k)?, canonicalize(v)?)))
                .collect::<Result<Vec<_>, CoseCipherError<T>>>()?;
            keyed.sort_by(|(a, _, _), (b, _, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            Value::Map(keyed.into_iter().map(|(_, k, v)| (k, v)).collect())
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(canonicalize)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Tag(tag, inner) => Value::Tag(*tag, Box::new(canonicalize(inner)?)),
        v => v.clone(),
    })
}

/// Decodes the first CBOR value contained in `bytes`, trailing data is ignored.
///
/// # Errors
///
/// Returns [`CoseCipherError::CborDecode`] if `bytes` do not start with a valid CBOR value.
pub fn decode_first<T>(bytes: &[u8]) -> Result<Value, CoseCipherError<T>> {
    ciborium::de::from_reader::<Value, _>(bytes)
        .map_err(|e| CoseCipherError::CborDecode(format!("{e:?}")))
}

/// Extracts a byte string from a message element described by `what`.
pub(crate) fn take_bytes<T>(value: Value, what: &str) -> Result<Vec<u8>, CoseCipherError<T>> {
    match value {
        Value::Bytes(b) => Ok(b),
        _ => Err(CoseCipherError::malformed(format!(
            "{what} is not a byte string"
        ))),
    }
}

/// Extracts an array from a message element described by `what`.
pub(crate) fn take_array<T>(value: Value, what: &str) -> Result<Vec<Value>, CoseCipherError<T>> {
    match value {
        Value::Array(a) => Ok(a),
        _ => Err(CoseCipherError::malformed(format!("{what} is not an array"))),
    }
}

/// Extracts the single entry of a recipient or signer list.
///
/// # Errors
///
/// - [`CoseCipherError::NoRecipients`] if the list is empty.
/// - [`CoseCipherError::TooManyRecipients`] if there is more than one entry.
/// - [`CoseCipherError::MalformedMessage`] if the entry is not an array of three elements.
pub(crate) fn take_single_layer<T>(
    value: Value,
    what: &str,
) -> Result<[Value; 3], CoseCipherError<T>> {
    let mut entries = take_array(value, what)?;
    match entries.len() {
        0 => return Err(CoseCipherError::NoRecipients),
        1 => {}
        n => return Err(CoseCipherError::TooManyRecipients(n)),
    }
    let entry = take_array(entries.remove(0), what)?;
    <[Value; 3]>::try_from(entry).map_err(|e| {
        CoseCipherError::malformed(format!(
            "{what} entry has {} elements instead of 3",
            e.len()
        ))
    })
}

/// Converts the validated array `items` of a `kind` message into a fixed-size array.
pub(crate) fn into_items<const N: usize, T>(
    kind: MessageKind,
    items: Vec<Value>,
) -> Result<[Value; N], CoseCipherError<T>> {
    <[Value; N]>::try_from(items).map_err(|e| {
        CoseCipherError::malformed(format!(
            "expected {N} elements for {kind} message, got {}",
            e.len()
        ))
    })
}

/// Extracts the payload of a message, detached payloads are not supported.
pub(crate) fn take_payload<T>(value: Value) -> Result<Vec<u8>, CoseCipherError<T>> {
    match value {
        Value::Bytes(b) => Ok(b),
        Value::Null => Err(CoseCipherError::malformed(
            "detached payloads are not supported",
        )),
        _ => Err(CoseCipherError::malformed("payload is not a byte string")),
    }
}
