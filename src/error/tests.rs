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

use core::convert::Infallible;

use super::CoseCipherError;

#[test]
fn verification_failure_is_replaced() {
    let err: CoseCipherError<Infallible> = CoseCipherError::VerificationFailure;
    assert_eq!(
        err.on_verification_failure(CoseCipherError::TagMismatch),
        CoseCipherError::TagMismatch
    );
}

#[test]
fn other_errors_are_kept() {
    let err: CoseCipherError<Infallible> = CoseCipherError::MissingAlg;
    assert_eq!(
        err.on_verification_failure(CoseCipherError::AuthenticationFailed),
        CoseCipherError::MissingAlg
    );
}

#[test]
fn display_does_not_leak_payload() {
    let err: CoseCipherError<&str> = CoseCipherError::SignatureMismatch(b"secret".to_vec());
    assert_eq!(err.to_string(), "signature mismatch");
    let err: CoseCipherError<&str> = CoseCipherError::Other("boom");
    assert_eq!(err.to_string(), "backend error: boom");
}
