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

//! Cryptographic backends.
//!
//! All cryptographic operations are performed by a type implementing [`CryptoBackend`] and the
//! sub-traits for the respective message kinds
//! ([`MacCryptoBackend`](crate::maced::MacCryptoBackend),
//! [`SignCryptoBackend`](crate::signed::SignCryptoBackend) and
//! [`EncryptCryptoBackend`](crate::encrypted::EncryptCryptoBackend)).
//!
//! Two implementations are provided: [`rustcrypto::RustCryptoContext`] (feature `rustcrypto`,
//! enabled by default) and [`openssl::OpensslContext`] (feature `openssl`).

use core::fmt::{Debug, Display};

#[cfg(feature = "openssl")]
pub mod openssl;
#[cfg(rustcrypto_base)]
pub mod rustcrypto;


/// Base trait of all cryptographic backends.
///
/// Backends are handed to every message operation as `&mut`, so they may keep internal state
/// (like a random number generator), but no state is carried from one operation to the next.
pub trait CryptoBackend {
    /// Backend-specific error type.
    type Error: Display + Debug;

    /// Fills `buf` with cryptographically secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns a backend-specific error if no random bytes could be generated.
    fn generate_rand(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}
