// Copyright (C) Microsoft Corporation. All rights reserved.

//! Stateless helpers: encodings and constant-time comparison.

use std::ffi::c_char;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::negotiate::fill_exact;
use crate::safeapi::negotiate::negotiate;
use crate::safeapi::negotiate::negotiate_string;

const HEX_FLAG_UPPERCASE: u32 = 0;
const HEX_FLAG_LOWERCASE: u32 = 1;

pub fn hex_encode(data: &[u8], uppercase: bool) -> BotanResult<String> {
    let encode = ffi::library()?.botan_hex_encode()?;
    let flags = if uppercase {
        HEX_FLAG_UPPERCASE
    } else {
        HEX_FLAG_LOWERCASE
    };

    // The native side writes exactly two characters per byte, unterminated.
    let encoded = fill_exact(data.len() * 2, |out, _| {
        // SAFETY: `out` holds `2 * data.len()` bytes.
        unsafe { encode(data.as_ptr(), data.len(), out.cast::<c_char>(), flags) }
    })?;
    Ok(String::from_utf8_lossy(&encoded).into_owned())
}

pub fn hex_decode(hex: &str) -> BotanResult<Vec<u8>> {
    let decode = ffi::library()?.botan_hex_decode()?;
    negotiate(|out, out_len| {
        // SAFETY: `hex` is read for its length only; `out` holds `*out_len` bytes.
        unsafe { decode(hex.as_ptr().cast(), hex.len(), out, out_len) }
    })
}

pub fn base64_encode(data: &[u8]) -> BotanResult<String> {
    let encode = ffi::library()?.botan_base64_encode()?;
    negotiate_string(|out, out_len| {
        // SAFETY: `data` is readable; `out` holds `*out_len` bytes.
        unsafe { encode(data.as_ptr(), data.len(), out, out_len) }
    })
}

pub fn base64_decode(encoded: &str) -> BotanResult<Vec<u8>> {
    let decode = ffi::library()?.botan_base64_decode()?;
    negotiate(|out, out_len| {
        // SAFETY: `encoded` is read for its length only; `out` holds `*out_len` bytes.
        unsafe { decode(encoded.as_ptr().cast(), encoded.len(), out, out_len) }
    })
}

/// Compares two byte strings in time independent of their contents.
/// Inputs of different length compare unequal without a native call.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> BotanResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    let compare = ffi::library()?.botan_constant_time_compare()?;
    // SAFETY: both inputs are readable for `a.len()` bytes.
    let rc = unsafe { compare(a.as_ptr(), b.as_ptr(), a.len()) };
    Predicate::BYTES_EQUAL.eval(rc)
}

/// Overwrites `buf` with zeros in a way the optimizer will not elide.
pub fn scrub(buf: &mut [u8]) -> BotanResult<()> {
    let scrub_mem = ffi::library()?.botan_scrub_mem()?;
    // SAFETY: `buf` is writable for its full length.
    check(unsafe { scrub_mem(buf.as_mut_ptr().cast(), buf.len()) })
}
