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

//! To-be-authenticated structures (`MAC_structure`, `Sig_structure`, `Enc_structure`).
//!
//! These are the byte strings that are actually fed into the MAC, signature or AEAD primitive.
//! They are never transmitted, both sides rebuild them from the message.

use alloc::vec;
use alloc::vec::Vec;

use ciborium::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::CoseCipherError;
use crate::framing;

#[cfg(test)]
mod tests;

/// Context string placed at the start of a to-be-authenticated structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
pub enum StructureContext {
    /// `"MAC0"`
    #[strum(serialize = "MAC0")]
    Mac0,
    /// `"MAC"`
    #[strum(serialize = "MAC")]
    Mac,
    /// `"Signature1"`
    Signature1,
    /// `"Signature"`
    Signature,
    /// `"Encrypt0"`
    Encrypt0,
    /// `"Encrypt"`
    Encrypt,
}

/// A to-be-authenticated structure.
///
/// The protected headers are given as returned by
/// [`HeaderMap::structure_bytes`](crate::header::HeaderMap::structure_bytes) or
/// [`HeaderMap::read_protected`](crate::header::HeaderMap::read_protected), so an empty header
/// is always a zero-length byte string.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStructure<'a> {
    context: StructureContext,
    body_protected: &'a [u8],
    signer_protected: Option<&'a [u8]>,
    external_aad: &'a [u8],
    payload: Option<&'a [u8]>,
}

impl<'a> AuthStructure<'a> {
    /// `MAC_structure = [context, protected, external_aad, payload]`
    #[must_use]
    pub fn mac(
        context: StructureContext,
        protected: &'a [u8],
        external_aad: &'a [u8],
        payload: &'a [u8],
    ) -> AuthStructure<'a> {
        AuthStructure {
            context,
            body_protected: protected,
            signer_protected: None,
            external_aad,
            payload: Some(payload),
        }
    }

    /// `Sig_structure = ["Signature1", protected, external_aad, payload]`
    #[must_use]
    pub fn signature1(
        protected: &'a [u8],
        external_aad: &'a [u8],
        payload: &'a [u8],
    ) -> AuthStructure<'a> {
        AuthStructure {
            context: StructureContext::Signature1,
            body_protected: protected,
            signer_protected: None,
            external_aad,
            payload: Some(payload),
        }
    }

    /// `Sig_structure = ["Signature", body_protected, sign_protected, external_aad, payload]`
    #[must_use]
    pub fn signature(
        body_protected: &'a [u8],
        signer_protected: &'a [u8],
        external_aad: &'a [u8],
        payload: &'a [u8],
    ) -> AuthStructure<'a> {
        AuthStructure {
            context: StructureContext::Signature,
            body_protected,
            signer_protected: Some(signer_protected),
            external_aad,
            payload: Some(payload),
        }
    }

    /// `Enc_structure = [context, protected, external_aad]`
    #[must_use]
    pub fn encrypt(
        context: StructureContext,
        protected: &'a [u8],
        external_aad: &'a [u8],
    ) -> AuthStructure<'a> {
        AuthStructure {
            context,
            body_protected: protected,
            signer_protected: None,
            external_aad,
            payload: None,
        }
    }

    /// The context of this structure.
    #[must_use]
    pub fn context(&self) -> StructureContext {
        self.context
    }

    /// Builds the CBOR array of this structure.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut items = vec![
            Value::Text(self.context.as_ref().into()),
            Value::Bytes(self.body_protected.to_vec()),
        ];
        if let Some(signer_protected) = self.signer_protected {
            items.push(Value::Bytes(signer_protected.to_vec()));
        }
        items.push(Value::Bytes(self.external_aad.to_vec()));
        if let Some(payload) = self.payload {
            items.push(Value::Bytes(payload.to_vec()));
        }
        Value::Array(items)
    }

    /// Serializes this structure, yielding the bytes to authenticate.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::CborEncode`] if serialization fails.
    pub fn to_bytes<T>(&self) -> Result<Vec<u8>, CoseCipherError<T>> {
        framing::encode(&self.to_value())
    }
}
