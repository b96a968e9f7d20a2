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

#![recursion_limit = "512"]

use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        rustcrypto_encrypt_base: {
            any(
                feature = "rustcrypto-aes-gcm",
                feature = "rustcrypto-aes-ccm"
            )
        },
        rustcrypto_sign_base: {
            any(
                feature = "rustcrypto-ecdsa",
                feature = "rustcrypto-rsa"
            )
        },
        rustcrypto_mac_base: {
            any(
                feature = "rustcrypto-hmac",
                feature = "rustcrypto-aes-cbc-mac"
            )
        },
        rustcrypto_base: {
            any(
                rustcrypto_encrypt_base,
                rustcrypto_sign_base,
                rustcrypto_mac_base
            )
        },
    }
}
