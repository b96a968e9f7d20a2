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

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use coset::iana;
use coset::iana::EnumI64;
use openssl::cipher::CipherRef;
use openssl::cipher_ctx::CipherCtx;

use crate::algorithm;
use crate::crypto_impl::openssl::{CoseOpensslCipherError, OpensslContext};
use crate::encrypted::EncryptCryptoBackend;
use crate::error::CoseCipherError;
use crate::key::CoseSymmetricKey;

type OpensslResult<T> = Result<T, CoseCipherError<CoseOpensslCipherError>>;

/// Looks up the cipher for `algorithm` and checks that `key` fits it.
///
/// `CipherCtx` panics on keys that are too short, so this has to happen first.
fn cipher_for_key(
    algorithm: iana::Algorithm,
    key: &CoseSymmetricKey<'_>,
) -> OpensslResult<&'static CipherRef> {
    let cipher = super::algorithm_to_cipher(algorithm)?;
    if key.k.len() == cipher.key_length() {
        Ok(cipher)
    } else {
        Err(CoseCipherError::InvalidKey(format!(
            "key has length {}, expected {}",
            key.k.len(),
            cipher.key_length()
        )))
    }
}

/// Authentication tag length of the AEAD `algorithm`.
fn aead_tag_len(algorithm: iana::Algorithm) -> OpensslResult<usize> {
    algorithm::resolve(algorithm.to_i64())?
        .aead_tag_len()
        .ok_or(CoseCipherError::UnsupportedAlgorithm(algorithm.to_i64()))
}

/// Splits `ciphertext_with_tag` into ciphertext and authentication tag.
fn split_tag(ciphertext_with_tag: &[u8], tag_len: usize) -> OpensslResult<(&[u8], &[u8])> {
    if ciphertext_with_tag.len() < tag_len {
        return Err(CoseCipherError::VerificationFailure);
    }
    Ok(ciphertext_with_tag.split_at(ciphertext_with_tag.len() - tag_len))
}

impl EncryptCryptoBackend for OpensslContext {
    fn encrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let cipher = cipher_for_key(algorithm, &key)?;
        let tag_len = aead_tag_len(algorithm)?;
        let mut ctx = CipherCtx::new()?;
        // OpenSSL requires a very specific order of operations, which differs slightly between
        // AES-GCM and AES-CCM, see
        // https://wiki.openssl.org/index.php/EVP_Authenticated_Encryption_and_Decryption#Authenticated_Encryption_using_GCM_mode
        // 1. Set the cipher.
        ctx.encrypt_init(Some(cipher), None, None)?;
        // 2. For GCM, the IV length is set _before_ key and IV. The tag length is fixed.
        ctx.set_iv_length(iv.len())?;
        // 3. Set key and IV.
        ctx.encrypt_init(None, Some(key.k), Some(iv))?;
        let mut ciphertext = vec![];
        // Unlike for CCM, the data length must not be set here, otherwise encryption fails.
        // 4. The AAD has to be set _before_ the plaintext.
        ctx.cipher_update(aad, None)?;
        // 5. All plaintext is provided in a single call.
        ctx.cipher_update_vec(plaintext, &mut ciphertext)?;
        // 6. Finish the operation and append the tag.
        ctx.cipher_final_vec(&mut ciphertext)?;
        let ciphertext_len = ciphertext.len();
        ciphertext.resize(ciphertext_len + tag_len, 0u8);
        ctx.tag(&mut ciphertext[ciphertext_len..])?;
        Ok(ciphertext)
    }

    fn decrypt_aes_gcm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let cipher = cipher_for_key(algorithm, &key)?;
        let (ciphertext, auth_tag) = split_tag(ciphertext_with_tag, aead_tag_len(algorithm)?)?;

        let mut ctx = CipherCtx::new()?;
        // See https://wiki.openssl.org/index.php/EVP_Authenticated_Encryption_and_Decryption#Authenticated_Decryption_using_GCM_mode
        // 1. Set the cipher.
        ctx.decrypt_init(Some(cipher), None, None)?;
        // 2. For GCM, the IV length is set _before_ key and IV.
        ctx.set_iv_length(iv.len())?;
        // 3. Set key and IV.
        ctx.decrypt_init(None, Some(key.k), Some(iv))?;
        // 4. The AAD has to be set _before_ the ciphertext.
        ctx.cipher_update(aad, None)?;
        // 5. All ciphertext is provided in a single call.
        let mut plaintext = vec![0; ciphertext.len()];
        let mut plaintext_size = ctx.cipher_update(ciphertext, Some(&mut plaintext))?;
        // 6. For GCM, the tag is set right before finalization.
        ctx.set_tag(auth_tag)?;
        // 7. Finalization checks the tag.
        plaintext_size += ctx
            .cipher_final(&mut plaintext[plaintext_size..])
            .map_err(|_| CoseCipherError::VerificationFailure)?;

        plaintext.truncate(plaintext_size);

        Ok(plaintext)
    }

    fn encrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let cipher = cipher_for_key(algorithm, &key)?;
        let tag_len = aead_tag_len(algorithm)?;
        let mut ctx = CipherCtx::new()?;
        // See https://wiki.openssl.org/index.php/EVP_Authenticated_Encryption_and_Decryption#Authenticated_Encryption_using_CCM_mode
        // 1. Set the cipher.
        ctx.encrypt_init(Some(cipher), None, None)?;
        // 2. For CCM, tag and IV length _must_ be set before key and IV.
        //    (https://github.com/sfackler/rust-openssl/pull/1594#issue-1105067105)
        ctx.set_iv_length(iv.len())?;
        ctx.set_tag_length(tag_len)?;
        // 3. Set key and IV.
        ctx.encrypt_init(None, Some(key.k), Some(iv))?;
        let mut ciphertext = vec![];
        // 4. For CCM, the plaintext length has to be known _before_ the AAD is set.
        ctx.set_data_len(plaintext.len())?;
        // 5. The AAD has to be set _before_ the plaintext.
        ctx.cipher_update(aad, None)?;
        // 6. All plaintext is provided in a single call.
        ctx.cipher_update_vec(plaintext, &mut ciphertext)?;
        // 7. Finish the operation and append the tag.
        ctx.cipher_final_vec(&mut ciphertext)?;
        let ciphertext_len = ciphertext.len();
        ciphertext.resize(ciphertext_len + tag_len, 0u8);
        ctx.tag(&mut ciphertext[ciphertext_len..])?;
        Ok(ciphertext)
    }

    fn decrypt_aes_ccm(
        &mut self,
        algorithm: iana::Algorithm,
        key: CoseSymmetricKey<'_>,
        ciphertext_with_tag: &[u8],
        aad: &[u8],
        iv: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let cipher = cipher_for_key(algorithm, &key)?;
        let (ciphertext, auth_tag) = split_tag(ciphertext_with_tag, aead_tag_len(algorithm)?)?;

        let mut ctx = CipherCtx::new()?;
        // See https://wiki.openssl.org/index.php/EVP_Authenticated_Encryption_and_Decryption#Authenticated_Decryption_using_CCM_mode
        // 1. Set the cipher.
        ctx.decrypt_init(Some(cipher), None, None)?;
        // 2. For CCM, tag and IV length _must_ be set before key and IV.
        ctx.set_iv_length(iv.len())?;
        ctx.set_tag(auth_tag)?;
        // 3. Set key and IV.
        ctx.decrypt_init(None, Some(key.k), Some(iv))?;
        // 4. The ciphertext length has to be known _before_ the AAD is set.
        ctx.set_data_len(ciphertext.len())?;
        // 5. The AAD has to be set _before_ the ciphertext.
        ctx.cipher_update(aad, None)?;
        // 6. All ciphertext is provided in a single call, which also checks the tag.
        //    CCM decryption is not finalized.
        let mut plaintext = vec![0; ciphertext.len()];
        let plaintext_len = ctx
            .cipher_update(ciphertext, Some(&mut plaintext))
            .map_err(|_| CoseCipherError::VerificationFailure)?;
        plaintext.truncate(plaintext_len);

        Ok(plaintext)
    }
}
