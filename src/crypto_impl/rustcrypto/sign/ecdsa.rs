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
use core::ops::Add;

use coset::iana;
use coset::iana::EnumI64;
use digest::const_oid::ObjectIdentifier;
use digest::{Digest, FixedOutput};
use ecdsa::elliptic_curve::generic_array::ArrayLength;
use ecdsa::hazmat::{DigestPrimitive, SignPrimitive, VerifyPrimitive};
use ecdsa::signature::{DigestSigner, RandomizedSigner, Verifier};
use ecdsa::{
    PrimeCurve, RecoveryId, Signature, SignatureWithOid, SigningKey, VerifyingKey,
    ECDSA_SHA256_OID, ECDSA_SHA384_OID, ECDSA_SHA512_OID,
};
use elliptic_curve::{
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    CurveArithmetic, SecretKey,
};
use p256::NistP256;
use p384::NistP384;
use rand::{CryptoRng, RngCore};
use sha2::{Sha256, Sha384, Sha512};

use crate::crypto_impl::rustcrypto::CoseRustCryptoCipherError;
use crate::crypto_impl::rustcrypto::RustCryptoContext;
use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;
use crate::key::CoseEc2Key;

/// Builds the SEC1 encoding of an uncompressed public key.
fn uncompressed_point(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut point = vec![0x04];
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    point
}

impl<RNG: RngCore + CryptoRng> RustCryptoContext<RNG> {
    /// Perform an ECDSA signature operation with the ECDSA variant given in `algorithm` for the
    /// given `payload` using the provided `key`.
    ///
    /// The signature is returned in its fixed-size `r || s` form.
    pub(super) fn sign_ecdsa(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>> {
        if key.crv == iana::EllipticCurve::P_521 {
            return self.sign_ecdsa_p521(algorithm, key, payload);
        }
        match algorithm {
            iana::Algorithm::ES256 => Self::sign_ecdsa_with_digest::<Sha256>(key, payload),
            iana::Algorithm::ES384 => Self::sign_ecdsa_with_digest::<Sha384>(key, payload),
            iana::Algorithm::ES512 => Self::sign_ecdsa_with_digest::<Sha512>(key, payload),
            a => Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        }
    }

    /// Perform an ECDSA verification operation with the ECDSA variant given in `algorithm` for the
    /// given `payload` and `sig`nature using the provided `key`.
    pub(super) fn verify_ecdsa(
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        sig: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<<Self as CryptoBackend>::Error>> {
        let oid = match algorithm {
            iana::Algorithm::ES256 => ECDSA_SHA256_OID,
            iana::Algorithm::ES384 => ECDSA_SHA384_OID,
            iana::Algorithm::ES512 => ECDSA_SHA512_OID,
            a => return Err(CoseCipherError::UnsupportedAlgorithm(a.to_i64())),
        };

        match key.crv {
            iana::EllipticCurve::P_256 => {
                Self::verify_ecdsa_with_curve::<NistP256>(key, oid, sig, payload)
            }
            iana::EllipticCurve::P_384 => {
                Self::verify_ecdsa_with_curve::<NistP384>(key, oid, sig, payload)
            }
            iana::EllipticCurve::P_521 => Self::verify_ecdsa_p521(algorithm, key, sig, payload),
            v => Err(CoseCipherError::UnsupportedCurve(v.to_i64())),
        }
    }

    /// Perform an ECDSA signature operation with the ECDSA hash function `D` for the
    /// given `payload` using the provided `key`.
    fn sign_ecdsa_with_digest<D: Digest + FixedOutput>(
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>> {
        match key.crv {
            iana::EllipticCurve::P_256 => {
                Self::sign_ecdsa_with_digest_and_curve::<D, NistP256>(key, payload)
            }
            iana::EllipticCurve::P_384 => {
                Self::sign_ecdsa_with_digest_and_curve::<D, NistP384>(key, payload)
            }
            v => Err(CoseCipherError::UnsupportedCurve(v.to_i64())),
        }
    }

    /// Perform an ECDSA signature operation with the ECDSA hash function `D` and curve `CRV` for
    /// the given `payload` using the provided `key`.
    fn sign_ecdsa_with_digest_and_curve<
        D: Digest + FixedOutput,
        CRV: PrimeCurve + CurveArithmetic + DigestPrimitive,
    >(
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>>
    where
        <CRV as CurveArithmetic>::Scalar: SignPrimitive<CRV>,
        <<CRV as ecdsa::elliptic_curve::Curve>::FieldBytesSize as Add>::Output: ArrayLength<u8>,
    {
        let digest = Digest::new_with_prefix(payload);
        let sign_key = Self::cose_ec2_to_ec_private_key::<CRV>(key)?;
        let (signature, _recid) = <SigningKey<CRV> as DigestSigner<
            D,
            (Signature<CRV>, RecoveryId),
        >>::try_sign_digest(&sign_key, digest)?;
        Ok(signature.to_vec())
    }

    /// Perform an ECDSA verification operation with the ECDSA hash function given in `oid` for the
    /// given `payload` and `sig`nature using the provided `key`.
    fn verify_ecdsa_with_curve<CRV: PrimeCurve + CurveArithmetic + DigestPrimitive>(
        key: &CoseEc2Key<'_>,
        oid: ObjectIdentifier,
        sig: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<<Self as CryptoBackend>::Error>>
    where
        <CRV as CurveArithmetic>::AffinePoint: VerifyPrimitive<CRV>,
        <<CRV as ecdsa::elliptic_curve::Curve>::FieldBytesSize as Add>::Output: ArrayLength<u8>,
        <CRV as ecdsa::elliptic_curve::Curve>::FieldBytesSize: ModulusSize,
        <CRV as CurveArithmetic>::AffinePoint: FromEncodedPoint<CRV>,
        <CRV as CurveArithmetic>::AffinePoint: ToEncodedPoint<CRV>,
    {
        let verify_key = Self::cose_ec2_to_ec_public_key::<CRV>(key)?;
        // A signature that can not even be parsed is just as invalid as one that does not match.
        let signature = Signature::<CRV>::from_slice(sig)
            .and_then(|s| SignatureWithOid::new(s, oid))
            .map_err(|_| CoseCipherError::VerificationFailure)?;
        <VerifyingKey<CRV> as Verifier<SignatureWithOid<CRV>>>::verify(
            &verify_key,
            payload,
            &signature,
        )
        .map_err(|_| CoseCipherError::VerificationFailure)
    }

    /// Convert a public or private COSE EC2 key to its public key RustCrypto representation.
    fn cose_ec2_to_ec_public_key<CRV: PrimeCurve + CurveArithmetic>(
        key: &CoseEc2Key<'_>,
    ) -> Result<VerifyingKey<CRV>, CoseCipherError<<Self as CryptoBackend>::Error>>
    where
        <CRV as ecdsa::elliptic_curve::Curve>::FieldBytesSize: ModulusSize,
        <CRV as CurveArithmetic>::AffinePoint: FromEncodedPoint<CRV>,
        <CRV as CurveArithmetic>::AffinePoint: ToEncodedPoint<CRV>,
    {
        if key.x.is_none() && key.d.is_some() {
            // Only the private key is known, reconstruct the public key from it.
            return SecretKey::<CRV>::from_slice(key.private_scalar()?)
                .map(|sc| VerifyingKey::from(sc.public_key()))
                .map_err(CoseCipherError::from);
        }
        let (x, y) = key.public_coordinates()?;
        VerifyingKey::<CRV>::from_sec1_bytes(&uncompressed_point(x, y))
            .map_err(|_| CoseCipherError::Other(CoseRustCryptoCipherError::InvalidPoint))
    }

    /// Convert a private COSE EC2 key to its RustCrypto representation.
    fn cose_ec2_to_ec_private_key<CRV: PrimeCurve + CurveArithmetic>(
        key: &CoseEc2Key<'_>,
    ) -> Result<SigningKey<CRV>, CoseCipherError<<Self as CryptoBackend>::Error>>
    where
        <CRV as CurveArithmetic>::Scalar: SignPrimitive<CRV>,
        <<CRV as ecdsa::elliptic_curve::Curve>::FieldBytesSize as Add>::Output: ArrayLength<u8>,
    {
        SecretKey::<CRV>::from_slice(key.private_scalar()?)
            .map(SigningKey::<CRV>::from)
            .map_err(CoseCipherError::from)
    }

    /// ES512 signing on P-521, which only offers SHA-512 through its own key wrappers.
    ///
    /// The nonce is drawn from the context's RNG, so this also works on targets without an
    /// operating system entropy source.
    fn sign_ecdsa_p521(
        &mut self,
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<<Self as CryptoBackend>::Error>> {
        if algorithm != iana::Algorithm::ES512 {
            return Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()));
        }
        let sign_key = p521::ecdsa::SigningKey::from_slice(key.private_scalar()?)?;
        let signature: p521::ecdsa::Signature =
            RandomizedSigner::try_sign_with_rng(&sign_key, &mut self.rng, payload)?;
        Ok(signature.to_vec())
    }

    /// ES512 verification on P-521.
    fn verify_ecdsa_p521(
        algorithm: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        sig: &[u8],
        payload: &[u8],
    ) -> Result<(), CoseCipherError<<Self as CryptoBackend>::Error>> {
        if algorithm != iana::Algorithm::ES512 {
            return Err(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()));
        }
        let verify_key = if key.x.is_none() && key.d.is_some() {
            p521::ecdsa::VerifyingKey::from(&p521::ecdsa::SigningKey::from_slice(
                key.private_scalar()?,
            )?)
        } else {
            let (x, y) = key.public_coordinates()?;
            p521::ecdsa::VerifyingKey::from_sec1_bytes(&uncompressed_point(x, y))
                .map_err(|_| CoseCipherError::Other(CoseRustCryptoCipherError::InvalidPoint))?
        };
        let signature = p521::ecdsa::Signature::from_slice(sig)
            .map_err(|_| CoseCipherError::VerificationFailure)?;
        verify_key
            .verify(payload, &signature)
            .map_err(|_| CoseCipherError::VerificationFailure)
    }
}
