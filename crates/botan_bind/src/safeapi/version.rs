// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CStr;

use crate::ffi;
use crate::safeapi::error::*;

/// FFI API version implemented by the loaded library, e.g. `20250506`.
pub fn ffi_api_version() -> BotanResult<u32> {
    let version = ffi::library()?.botan_ffi_api_version()?;
    // SAFETY: no arguments.
    Ok(unsafe { version() })
}

/// Whether the loaded library implements FFI API `version`.
pub fn supports_api(version: u32) -> BotanResult<bool> {
    let supports = ffi::library()?.botan_ffi_supports_api()?;
    // SAFETY: plain value argument.
    let rc = unsafe { supports(version) };
    predicate(rc, 0, &[ErrorKind::InvalidInput.code()])
}

/// Free-form version banner of the loaded library.
pub fn version_string() -> BotanResult<String> {
    let banner = ffi::library()?.botan_version_string()?;
    // SAFETY: returns a pointer to a static NUL-terminated string.
    let ptr = unsafe { banner() };
    if ptr.is_null() {
        Err(BotanError::Ffi(ErrorKind::NullPointer))?;
    }
    // SAFETY: checked non-null above; the string is static.
    let text = unsafe { CStr::from_ptr(ptr) };
    Ok(text.to_str()?.to_owned())
}

pub fn version_major() -> BotanResult<u32> {
    let major = ffi::library()?.botan_version_major()?;
    // SAFETY: no arguments.
    Ok(unsafe { major() })
}

pub fn version_minor() -> BotanResult<u32> {
    let minor = ffi::library()?.botan_version_minor()?;
    // SAFETY: no arguments.
    Ok(unsafe { minor() })
}

pub fn version_patch() -> BotanResult<u32> {
    let patch = ffi::library()?.botan_version_patch()?;
    // SAFETY: no arguments.
    Ok(unsafe { patch() })
}

/// Release date as `YYYYMMDD`, or 0 for unreleased builds.
pub fn version_datestamp() -> BotanResult<u32> {
    let datestamp = ffi::library()?.botan_version_datestamp()?;
    // SAFETY: no arguments.
    Ok(unsafe { datestamp() })
}
