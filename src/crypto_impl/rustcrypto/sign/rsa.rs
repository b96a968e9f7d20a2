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
use alloc::vec;
use alloc::vec::Vec;

use coset::iana;
use coset::iana::EnumI64;
use digest::const_oid::AssociatedOid;
use digest::{Digest, FixedOutputReset};
use rand::{CryptoRng, RngCore};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{pkcs1v15, pss, BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};

use crate::crypto_impl::rustcrypto::{CoseRustCryptoCipherError, RustCryptoContext};
use crate::error::CoseCipherError;
use crate::key::CoseRsaKey;

type RustCryptoResult<T> = Result<T, CoseCipherError<CoseRustCryptoCipherError>>;

fn signature_error(e: rsa::signature::Error) -> CoseCipherError<CoseRustCryptoCipherError> {
    CoseCipherError::Other(CoseRustCryptoCipherError::RsaSignatureError(e))
}

/// Convert a COSE RSA key to its RustCrypto public key representation.
fn cose_rsa_to_public_key(key: &CoseRsaKey<'_>) -> RustCryptoResult<RsaPublicKey> {
    RsaPublicKey::new(
        BigUint::from_bytes_be(key.n),
        BigUint::from_bytes_be(key.e),
    )
    .map_err(CoseCipherError::from)
}

/// Convert a COSE RSA key to its RustCrypto private key representation.
fn cose_rsa_to_private_key(key: &CoseRsaKey<'_>) -> RustCryptoResult<RsaPrivateKey> {
    let (d, p, q) = key.private_components()?;
    let private_key = RsaPrivateKey::from_components(
        BigUint::from_bytes_be(key.n),
        BigUint::from_bytes_be(key.e),
        BigUint::from_bytes_be(d),
        vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
    )?;
    private_key.validate()?;
    Ok(private_key)
}

impl<RNG: RngCore + CryptoRng> RustCryptoContext<RNG> {
    /// Create an RSASSA-PKCS1-v1_5 or RSASSA-PSS signature over `payload` with the variant
    /// given in `algorithm` using the provided private `key`.
    pub(super) fn sign_rsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        payload: &[u8],
    ) -> RustCryptoResult<Vec<u8>> {
        let private_key = cose_rsa_to_private_key(key)?;
        match algorithm {
            iana::Algorithm::RS256 => self.sign_pkcs1v15::<Sha256>(private_key, payload),
            iana::Algorithm::RS384 => self.sign_pkcs1v15::<Sha384>(private_key, payload),
            iana::Algorithm::RS512 => self.sign_pkcs1v15::<Sha512>(private_key, payload),
            iana::Algorithm::PS256 => self.sign_pss::<Sha256>(private_key, payload),
            iana::Algorithm::PS384 => self.sign_pss::<Sha384>(private_key, payload),
            iana::Algorithm::PS512 => self.sign_pss::<Sha512>(private_key, payload),
            a => Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        }
    }

    /// Verify the RSASSA-PKCS1-v1_5 or RSASSA-PSS signature `sig` over `payload` with the variant
    /// given in `algorithm` using the provided `key`.
    pub(super) fn verify_rsa(
        algorithm: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        sig: &[u8],
        payload: &[u8],
    ) -> RustCryptoResult<()> {
        let public_key = cose_rsa_to_public_key(key)?;
        match algorithm {
            iana::Algorithm::RS256 => Self::verify_pkcs1v15::<Sha256>(public_key, sig, payload),
            iana::Algorithm::RS384 => Self::verify_pkcs1v15::<Sha384>(public_key, sig, payload),
            iana::Algorithm::RS512 => Self::verify_pkcs1v15::<Sha512>(public_key, sig, payload),
            iana::Algorithm::PS256 => Self::verify_pss::<Sha256>(public_key, sig, payload),
            iana::Algorithm::PS384 => Self::verify_pss::<Sha384>(public_key, sig, payload),
            iana::Algorithm::PS512 => Self::verify_pss::<Sha512>(public_key, sig, payload),
            a => Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        }
    }

    fn sign_pkcs1v15<D: Digest + AssociatedOid>(
        &mut self,
        key: RsaPrivateKey,
        payload: &[u8],
    ) -> RustCryptoResult<Vec<u8>> {
        let signing_key = pkcs1v15::SigningKey::<D>::new(key);
        signing_key
            .try_sign_with_rng(&mut self.rng, payload)
            .map(|s| s.to_vec())
            .map_err(signature_error)
    }

    /// PSS signatures use a salt as long as the digest output.
    fn sign_pss<D: Digest + FixedOutputReset>(
        &mut self,
        key: RsaPrivateKey,
        payload: &[u8],
    ) -> RustCryptoResult<Vec<u8>> {
        let signing_key = pss::BlindedSigningKey::<D>::new(key);
        signing_key
            .try_sign_with_rng(&mut self.rng, payload)
            .map(|s| s.to_vec())
            .map_err(signature_error)
    }

    fn verify_pkcs1v15<D: Digest + AssociatedOid>(
        key: RsaPublicKey,
        sig: &[u8],
        payload: &[u8],
    ) -> RustCryptoResult<()> {
        let verifying_key = pkcs1v15::VerifyingKey::<D>::new(key);
        let signature = pkcs1v15::Signature::try_from(sig)
            .map_err(|_| CoseCipherError::VerificationFailure)?;
        verifying_key
            .verify(payload, &signature)
            .map_err(|_| CoseCipherError::VerificationFailure)
    }

    fn verify_pss<D: Digest + FixedOutputReset>(
        key: RsaPublicKey,
        sig: &[u8],
        payload: &[u8],
    ) -> RustCryptoResult<()> {
        let verifying_key = pss::VerifyingKey::<D>::new(key);
        let signature =
            pss::Signature::try_from(sig).map_err(|_| CoseCipherError::VerificationFailure)?;
        verifying_key
            .verify(payload, &signature)
            .map_err(|_| CoseCipherError::VerificationFailure)
    }
}
