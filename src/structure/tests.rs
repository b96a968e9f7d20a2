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
use core::str::FromStr;

use hex::FromHex;
use rstest::rstest;

use super::*;

#[rstest]
#[case(StructureContext::Mac0, "MAC0")]
#[case(StructureContext::Mac, "MAC")]
#[case(StructureContext::Signature1, "Signature1")]
#[case(StructureContext::Signature, "Signature")]
#[case(StructureContext::Encrypt0, "Encrypt0")]
#[case(StructureContext::Encrypt, "Encrypt")]
fn context_strings(#[case] context: StructureContext, #[case] text: &str) {
    assert_eq!(context.as_ref(), text);
    assert_eq!(StructureContext::from_str(text), Ok(context));
}

#[test]
fn mac0_structure() {
    let structure =
        AuthStructure::mac(StructureContext::Mac0, &[], &[], b"This is the content.");
    assert_eq!(
        structure.to_bytes::<Infallible>().unwrap(),
        Vec::from_hex("84644D414330404054546869732069732074686520636F6E74656E742E").unwrap()
    );
}

#[test]
fn encrypt0_structure() {
    let structure = AuthStructure::encrypt(StructureContext::Encrypt0, &[], &[]);
    assert_eq!(
        structure.to_bytes::<Infallible>().unwrap(),
        Vec::from_hex("8368456E6372797074304040").unwrap()
    );
}

#[test]
fn signature_structure_contains_signer_header() {
    let body_protected = Vec::from_hex("a10126").unwrap();
    let structure = AuthStructure::signature(&body_protected, &[], &[], &[]);
    assert_eq!(structure.context(), StructureContext::Signature);
    assert_eq!(
        structure.to_bytes::<Infallible>().unwrap(),
        Vec::from_hex("85695369676E617475726543a10126404040").unwrap()
    );
}

#[test]
fn signature1_structure_with_external_aad() {
    let structure = AuthStructure::signature1(&[], &[0x11, 0xaa], b"");
    assert_eq!(
        structure.to_bytes::<Infallible>().unwrap(),
        Vec::from_hex("846A5369676E617475726531404211aa40").unwrap()
    );
}
