// Copyright (C) Microsoft Corporation. All rights reserved.

//! NIST SP 800-38F key wrapping (KW and KWP).

use std::ffi::c_int;
use std::ffi::CString;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::negotiate::negotiate;

/// Wraps `key` under `kek` with a 128-bit block cipher such as `AES-256`.
/// Without padding (KW) the key length must be a multiple of 8.
pub fn nist_key_wrap(cipher: &str, padded: bool, key: &[u8], kek: &[u8]) -> BotanResult<Vec<u8>> {
    let cipher = CString::new(cipher)?;
    let wrap = ffi::library()?.botan_nist_kw_enc()?;
    negotiate(|out, out_len| {
        // SAFETY: inputs are readable; `out` holds `*out_len` bytes.
        unsafe {
            wrap(
                cipher.as_ptr(),
                c_int::from(padded),
                key.as_ptr(),
                key.len(),
                kek.as_ptr(),
                kek.len(),
                out,
                out_len,
            )
        }
    })
}

/// Inverse of [`nist_key_wrap`]. An integrity failure is reported as
/// `BadMac`.
pub fn nist_key_unwrap(cipher: &str, padded: bool, wrapped: &[u8], kek: &[u8]) -> BotanResult<Vec<u8>> {
    let cipher = CString::new(cipher)?;
    let unwrap = ffi::library()?.botan_nist_kw_dec()?;
    negotiate(|out, out_len| {
        // SAFETY: inputs are readable; `out` holds `*out_len` bytes.
        unsafe {
            unwrap(
                cipher.as_ptr(),
                c_int::from(padded),
                wrapped.as_ptr(),
                wrapped.len(),
                kek.as_ptr(),
                kek.len(),
                out,
                out_len,
            )
        }
    })
}
