/*
 * Copyright (c) 2024-2025 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use alloc::vec::Vec;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use coset::iana;
#[cfg(rustcrypto_base)]
use rand::rngs::ThreadRng;
use rand::{CryptoRng, RngCore};
use rstest::fixture;

#[cfg(feature = "openssl")]
use crate::crypto_impl::openssl::OpensslContext;
#[cfg(rustcrypto_base)]
use crate::crypto_impl::rustcrypto::RustCryptoContext;
#[cfg(feature = "rustcrypto-rsa")]
use crate::key::CoseRsaKey;
use crate::key::CoseEc2Key;

/// Private scalar of the P-256 key `meriadoc.brandybuck@buckland.example` (RFC 8152, C.7.1).
pub(crate) const P256_D: &str = "aff907c99f9ad3aae6c4cdf21122bce2bd68b5283e6907154ad911840fa208cf";
pub(crate) const P256_X: &str = "65eda5a12577c2bae829437fe338701a10aaa375e1bb5b5de108de439c08551d";
pub(crate) const P256_Y: &str = "1e52ed75701163f7f9e40ddf9f341b3dc9ba860af7e0ca7ca7e9eecd0084d19c";

/// Public key `11` (RFC 8152, C.7.1), unrelated to the key above.
pub(crate) const OTHER_P256_X: &str =
    "bac5b11cad8f99f9c72b05cf4b9e26d244dc189f745228255a219a86d6a09eff";
pub(crate) const OTHER_P256_Y: &str =
    "20138bf82dc1b6d562be0fa54ab7804a3a64b6d72ccfed6b6fb6ed28bbfc117e";

/// Private scalar of the P-521 key `bilbo.baggins@hobbiton.example` (RFC 8152, C.7.1).
pub(crate) const P521_D: &str = "00085138ddabf5ca975f5860f91a08e91d6d5f9a76ad4018766a476680b55cd339e8ab6c72b5facdb2a2a50ac25bd086647dd3e2e6e99e84ca2c3609fdf177feb26d";
pub(crate) const P521_X: &str = "0072992cb3ac08ecf3e5c63dedec0d51a8c1f79ef2f82f94f3c737bf5de7986671eac625fe8257bbd0394644caaa3aaf8f27a4585fbbcad0f2457620085e5c8f42ad";
pub(crate) const P521_Y: &str = "01dca6947bce88bc5790485ac97427342bc35f887d86d65a089377e247e60baa55e4e8501e2ada5724ac51d6909008033ebc10ac999b9d7f5cc2519f3fe1ea1d9475";

pub(crate) fn b64(value: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD
        .decode(value)
        .expect("invalid base64 in test data")
}

pub(crate) fn unhex(value: &str) -> Vec<u8> {
    hex::decode(value).expect("invalid hex in test data")
}

/// Key material of a test EC key, owned so that borrowed [`CoseEc2Key`]s can be handed out.
pub(crate) struct Ec2KeyMaterial {
    pub crv: iana::EllipticCurve,
    pub d: Option<Vec<u8>>,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl Ec2KeyMaterial {
    pub(crate) fn new(crv: iana::EllipticCurve, d: Option<&str>, x: &str, y: &str) -> Self {
        Ec2KeyMaterial {
            crv,
            d: d.map(unhex),
            x: unhex(x),
            y: unhex(y),
        }
    }

    pub(crate) fn full(&self) -> CoseEc2Key<'_> {
        CoseEc2Key {
            crv: self.crv,
            d: self.d.as_deref(),
            x: Some(&self.x),
            y: Some(&self.y),
        }
    }

    pub(crate) fn public(&self) -> CoseEc2Key<'_> {
        CoseEc2Key::public(self.crv, &self.x, &self.y)
    }
}

#[fixture]
pub(crate) fn p256_key() -> Ec2KeyMaterial {
    Ec2KeyMaterial::new(iana::EllipticCurve::P_256, Some(P256_D), P256_X, P256_Y)
}

#[fixture]
pub(crate) fn other_p256_key() -> Ec2KeyMaterial {
    Ec2KeyMaterial::new(iana::EllipticCurve::P_256, None, OTHER_P256_X, OTHER_P256_Y)
}

#[fixture]
pub(crate) fn p521_key() -> Ec2KeyMaterial {
    Ec2KeyMaterial::new(iana::EllipticCurve::P_521, Some(P521_D), P521_X, P521_Y)
}

/// Components of a freshly generated RSA key.
#[cfg(feature = "rustcrypto-rsa")]
pub(crate) struct RsaKeyMaterial {
    n: Vec<u8>,
    e: Vec<u8>,
    d: Vec<u8>,
    p: Vec<u8>,
    q: Vec<u8>,
}

#[cfg(feature = "rustcrypto-rsa")]
impl RsaKeyMaterial {
    pub(crate) fn full(&self) -> CoseRsaKey<'_> {
        CoseRsaKey::private(&self.n, &self.e, &self.d, &self.p, &self.q)
    }

    pub(crate) fn public(&self) -> CoseRsaKey<'_> {
        CoseRsaKey::public(&self.n, &self.e)
    }
}

/// Generates a 2048-bit RSA key. Slow, so tests should generate it once.
#[cfg(feature = "rustcrypto-rsa")]
#[fixture]
pub(crate) fn rsa_key() -> RsaKeyMaterial {
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};

    let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
        .expect("unable to generate RSA key");
    RsaKeyMaterial {
        n: key.n().to_bytes_be(),
        e: key.e().to_bytes_be(),
        d: key.d().to_bytes_be(),
        p: key.primes()[0].to_bytes_be(),
        q: key.primes()[1].to_bytes_be(),
    }
}

/// Random number generator that always produces the same byte sequence, for reproducible
/// messages.
#[derive(Debug, Clone)]
pub(crate) struct FixedRng {
    next: u8,
}

impl FixedRng {
    pub(crate) fn new(start: u8) -> FixedRng {
        FixedRng { next: start }
    }
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_be_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_be_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for b in dest {
            *b = self.next;
            self.next = self.next.wrapping_add(1);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

// Only ever used to produce reproducible nonces in tests.
impl CryptoRng for FixedRng {}

#[cfg(feature = "openssl")]
#[fixture]
pub(crate) fn openssl_ctx() -> OpensslContext {
    OpensslContext::new()
}

#[cfg(rustcrypto_base)]
#[fixture]
pub(crate) fn rustcrypto_ctx() -> RustCryptoContext<ThreadRng> {
    RustCryptoContext::new(rand::thread_rng())
}

#[cfg(rustcrypto_base)]
#[fixture]
pub(crate) fn fixed_rng_ctx() -> RustCryptoContext<FixedRng> {
    RustCryptoContext::new(FixedRng::new(0))
}
