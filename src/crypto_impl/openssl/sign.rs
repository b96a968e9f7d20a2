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

use alloc::vec::Vec;

use coset::iana;
use coset::iana::EnumI64;
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::{Padding, Rsa, RsaPrivateKeyBuilder};
use openssl::sign::{RsaPssSaltlen, Signer, Verifier};

use crate::crypto_impl::openssl::{CoseOpensslCipherError, OpensslContext};
use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseRsaKey};
use crate::signed::SignCryptoBackend;

type OpensslResult<T> = Result<T, CoseCipherError<CoseOpensslCipherError>>;

impl SignCryptoBackend for OpensslContext {
    fn sign_ecdsa(
        &mut self,
        alg: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        target: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let (pad_size, group) = get_ecdsa_group_params(key)?;
        let hash = super::get_algorithm_hash_function(alg)?;

        // Possible truncation is fine, the key size will never exceed the size of an i32.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        sign_ecdsa(&group, pad_size as i32, hash, key, target)
    }

    fn verify_ecdsa(
        &mut self,
        alg: iana::Algorithm,
        key: &CoseEc2Key<'_>,
        signature: &[u8],
        target: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        let (pad_size, group) = get_ecdsa_group_params(key)?;
        let hash = super::get_algorithm_hash_function(alg)?;

        verify_ecdsa(&group, pad_size, hash, key, signature, target)
    }

    fn sign_rsa(
        &mut self,
        alg: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        target: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let hash = super::get_algorithm_hash_function(alg)?;
        let padding = get_rsa_padding(alg)?;
        let pkey = PKey::from_rsa(cose_rsa_to_private_key(key)?)?;

        let mut signer = Signer::new(hash, &pkey)?;
        signer.set_rsa_padding(padding)?;
        if padding == Padding::PKCS1_PSS {
            signer.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
            signer.set_rsa_mgf1_md(hash)?;
        }
        signer
            .sign_oneshot_to_vec(target)
            .map_err(CoseCipherError::from)
    }

    fn verify_rsa(
        &mut self,
        alg: iana::Algorithm,
        key: &CoseRsaKey<'_>,
        signature: &[u8],
        target: &[u8],
    ) -> Result<(), CoseCipherError<Self::Error>> {
        let hash = super::get_algorithm_hash_function(alg)?;
        let padding = get_rsa_padding(alg)?;
        let pkey = PKey::from_rsa(cose_rsa_to_public_key(key)?)?;

        let mut verifier = Verifier::new(hash, &pkey)?;
        verifier.set_rsa_padding(padding)?;
        if padding == Padding::PKCS1_PSS {
            verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
            verifier.set_rsa_mgf1_md(hash)?;
        }
        // OpenSSL reports malformed signatures as errors instead of a negative result.
        verifier
            .verify_oneshot(signature, target)
            .unwrap_or(false)
            .then_some(())
            .ok_or(CoseCipherError::VerificationFailure)
    }
}

/// Determine the RSA padding scheme of the given signature algorithm.
fn get_rsa_padding(alg: iana::Algorithm) -> OpensslResult<Padding> {
    match alg {
        iana::Algorithm::RS256 | iana::Algorithm::RS384 | iana::Algorithm::RS512 => {
            Ok(Padding::PKCS1)
        }
        iana::Algorithm::PS256 | iana::Algorithm::PS384 | iana::Algorithm::PS512 => {
            Ok(Padding::PKCS1_PSS)
        }
        v => Err(CoseCipherError::UnsupportedAlgorithm(v.to_i64())),
    }
}

/// Determine the openssl [`EcGroup`] instance and coordinate size that should be used for the given
/// ECDSA key (based on its curve).
fn get_ecdsa_group_params(key: &CoseEc2Key<'_>) -> OpensslResult<(usize, EcGroup)> {
    let nid = match key.crv {
        iana::EllipticCurve::P_256 => Nid::X9_62_PRIME256V1,
        iana::EllipticCurve::P_384 => Nid::SECP384R1,
        iana::EllipticCurve::P_521 => Nid::SECP521R1,
        v => return Err(CoseCipherError::UnsupportedCurve(v.to_i64())),
    };
    // P-521 coordinates are padded to 528 bits (521 bits rounded up to full bytes).
    Ok((key.field_len()?, EcGroup::from_curve_name(nid)?))
}

/// Perform an ECDSA signature operation with the given parameters.
fn sign_ecdsa(
    group: &EcGroup,
    pad_size: i32,
    hash: MessageDigest,
    key: &CoseEc2Key<'_>,
    target: &[u8],
) -> OpensslResult<Vec<u8>> {
    let private_key = cose_ec2_to_ec_private_key(key, group)?;

    let mut signer = Signer::new(hash, &*PKey::from_ec_key(private_key)?)?;

    // generated signature is of DER format, need to convert it to COSE key format
    let der_signature = signer.sign_oneshot_to_vec(target)?;
    let ecdsa_sig = EcdsaSig::from_der(der_signature.as_slice())?;

    // See RFC 9053, section 2.1
    let mut sig = ecdsa_sig.r().to_vec_padded(pad_size)?;
    let mut s_vec = ecdsa_sig.s().to_vec_padded(pad_size)?;
    sig.append(&mut s_vec);

    Ok(sig)
}

/// Perform an ECDSA verification operation with the given parameters.
fn verify_ecdsa(
    group: &EcGroup,
    pad_size: usize,
    hash: MessageDigest,
    key: &CoseEc2Key<'_>,
    signature: &[u8],
    signed_data: &[u8],
) -> OpensslResult<()> {
    if signature.len() != 2 * pad_size {
        return Err(CoseCipherError::VerificationFailure);
    }
    let public_key = cose_ec2_to_ec_public_key(key, group)?;
    let pkey = PKey::from_ec_key(public_key)?;

    let mut verifier = Verifier::new(hash, &pkey)?;

    // signature is in COSE format, need to convert to DER format.
    let r = BigNum::from_slice(&signature[..pad_size])?;
    let s = BigNum::from_slice(&signature[pad_size..])?;
    let signature = EcdsaSig::from_private_components(r, s)?;
    // Note: EcdsaSig has its own "verify" method, but it is deprecated since OpenSSL
    // 3.0, which is why it's not used here.
    let der_signature = signature.to_der()?;

    verifier
        .verify_oneshot(der_signature.as_slice(), signed_data)
        .unwrap_or(false)
        .then_some(())
        .ok_or(CoseCipherError::VerificationFailure)
}

/// Computes the public point `d * G`.
fn derive_public_point(group: &EcGroup, d: &BigNum) -> OpensslResult<EcPoint> {
    let ctx = BigNumContext::new()?;
    let mut point = EcPoint::new(group)?;
    point.mul_generator(group, d, &ctx)?;
    Ok(point)
}

/// Converts a private [`CoseEc2Key`] instance to its corresponding representation as an [`EcKey`]
/// in `openssl`.
fn cose_ec2_to_ec_private_key(
    key: &CoseEc2Key<'_>,
    group: &EcGroup,
) -> OpensslResult<EcKey<Private>> {
    let d = BigNum::from_slice(key.private_scalar()?)?;
    let public_point = if key.x.is_some() {
        cose_ec2_to_ec_public_key(key, group)?
            .public_key()
            .to_owned(group)?
    } else {
        derive_public_point(group, &d)?
    };
    let private_key = EcKey::<Private>::from_private_components(group, &d, &public_point)?;
    private_key.check_key()?;
    Ok(private_key)
}

/// Converts a public [`CoseEc2Key`] instance to its corresponding representation as an [`EcKey`]
/// in `openssl`.
fn cose_ec2_to_ec_public_key(key: &CoseEc2Key<'_>, group: &EcGroup) -> OpensslResult<EcKey<Public>> {
    if key.x.is_none() && key.d.is_some() {
        let point = derive_public_point(group, &BigNum::from_slice(key.private_scalar()?)?)?;
        return EcKey::<Public>::from_public_key(group, &point).map_err(CoseCipherError::from);
    }
    let (x, y) = key.public_coordinates()?;
    EcKey::<Public>::from_public_key_affine_coordinates(
        group,
        &*BigNum::from_slice(x)?,
        &*BigNum::from_slice(y)?,
    )
    .map_err(CoseCipherError::from)
}

/// Converts a [`CoseRsaKey`] to an OpenSSL public key.
fn cose_rsa_to_public_key(key: &CoseRsaKey<'_>) -> OpensslResult<Rsa<Public>> {
    Rsa::from_public_components(BigNum::from_slice(key.n)?, BigNum::from_slice(key.e)?)
        .map_err(CoseCipherError::from)
}

/// Converts a [`CoseRsaKey`] to an OpenSSL private key, checking its consistency.
fn cose_rsa_to_private_key(key: &CoseRsaKey<'_>) -> OpensslResult<Rsa<Private>> {
    let (d, p, q) = key.private_components()?;
    let private_key = RsaPrivateKeyBuilder::new(
        BigNum::from_slice(key.n)?,
        BigNum::from_slice(key.e)?,
        BigNum::from_slice(d)?,
    )?
    .set_factors(BigNum::from_slice(p)?, BigNum::from_slice(q)?)?
    .build();
    if private_key.check_key()? {
        Ok(private_key)
    } else {
        Err(CoseCipherError::InvalidKey(
            "inconsistent RSA private key".into(),
        ))
    }
}
