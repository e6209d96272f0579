// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::negotiate::fill_exact;
use crate::safeapi::negotiate::negotiate_string;

/// Acceptable key lengths of a keyed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub minimum: usize,
    pub maximum: usize,
    pub modulo: usize,
}

impl KeySpec {
    pub fn is_valid_length(&self, len: usize) -> bool {
        len >= self.minimum && len <= self.maximum && (self.modulo == 0 || len % self.modulo == 0)
    }
}

/// Message authentication code.
///
/// Holds incremental state between `set_key`, `update` and `finish`; one
/// logical computation at a time.
#[derive(Debug)]
pub struct Mac {
    handle: ManagedHandle,
}

impl AsHandle for Mac {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Mac {
    /// Creates a MAC by algorithm name, e.g. `HMAC(SHA-256)` or `CMAC(AES-128)`.
    pub fn new(name: &str) -> BotanResult<Self> {
        let name = CString::new(name)?;
        let lib = ffi::library()?;
        let init = lib.botan_mac_init()?;

        let handle = ManagedHandle::construct("mac", lib.botan_mac_destroy()?, |out| {
            // SAFETY: `name` is NUL-terminated; flags must be zero.
            unsafe { init(out, name.as_ptr(), 0) }
        })?;
        Ok(Self { handle })
    }

    pub fn set_key(&mut self, key: &[u8]) -> BotanResult<()> {
        let set_key = ffi::library()?.botan_mac_set_key()?;
        // SAFETY: `key` is readable for its full length.
        check(unsafe { set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) })
    }

    /// Only meaningful for nonce-based MACs such as GMAC.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> BotanResult<()> {
        let set_nonce = ffi::library()?.botan_mac_set_nonce()?;
        // SAFETY: `nonce` is readable for its full length.
        check(unsafe { set_nonce(self.handle.as_ptr(), nonce.as_ptr(), nonce.len()) })
    }

    pub fn update(&mut self, data: &[u8]) -> BotanResult<()> {
        let update = ffi::library()?.botan_mac_update()?;
        // SAFETY: `data` is readable for its full length.
        check(unsafe { update(self.handle.as_ptr(), data.as_ptr(), data.len()) })
    }

    pub fn finish(&mut self) -> BotanResult<Vec<u8>> {
        let finish = ffi::library()?.botan_mac_final()?;
        fill_exact(self.output_length()?, |out, _| {
            // SAFETY: `out` holds `output_length` bytes.
            unsafe { finish(self.handle.as_ptr(), out) }
        })
    }

    pub fn clear(&mut self) -> BotanResult<()> {
        let clear = ffi::library()?.botan_mac_clear()?;
        // SAFETY: live handle.
        check(unsafe { clear(self.handle.as_ptr()) })
    }

    pub fn name(&self) -> BotanResult<String> {
        let name = ffi::library()?.botan_mac_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { name(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn output_length(&self) -> BotanResult<usize> {
        let output_length = ffi::library()?.botan_mac_output_length()?;
        let mut len = 0usize;
        // SAFETY: `len` is a valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), &mut len) })?;
        Ok(len)
    }

    pub fn key_spec(&self) -> BotanResult<KeySpec> {
        let get_keyspec = ffi::library()?.botan_mac_get_keyspec()?;
        let mut spec = KeySpec {
            minimum: 0,
            maximum: 0,
            modulo: 0,
        };
        // SAFETY: all three out-parameters are valid.
        check(unsafe {
            get_keyspec(
                self.handle.as_ptr(),
                &mut spec.minimum,
                &mut spec.maximum,
                &mut spec.modulo,
            )
        })?;
        Ok(spec)
    }
}

fn mac_set_key(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(mac.set_key(get_bytes(args, 0)?)?.into())
}

fn mac_set_nonce(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(mac.set_nonce(get_bytes(args, 0)?)?.into())
}

fn mac_update(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(mac.update(get_bytes(args, 0)?)?.into())
}

fn mac_final(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(mac.finish()?.into())
}

fn mac_clear(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(mac.clear()?.into())
}

fn mac_name(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(mac.name()?.into())
}

fn mac_output_length(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(mac.output_length()?.into())
}

fn mac_keyspec(mac: &mut Mac, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    let spec = mac.key_spec()?;
    Ok(Value::Tuple(vec![
        spec.minimum.into(),
        spec.maximum.into(),
        spec.modulo.into(),
    ]))
}

impl Dispatch for Mac {
    const KIND: &'static str = "mac";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Mac>)] = &[
            ("set-key", mac_set_key),
            ("set-nonce", mac_set_nonce),
            ("update", mac_update),
            ("final", mac_final),
            ("clear", mac_clear),
            ("name", mac_name),
            ("output-length", mac_output_length),
            ("keyspec", mac_keyspec),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspec_validity() {
        let hmac = KeySpec {
            minimum: 0,
            maximum: 4096,
            modulo: 1,
        };
        assert!(hmac.is_valid_length(0));
        assert!(hmac.is_valid_length(33));
        assert!(!hmac.is_valid_length(4097));

        let aes = KeySpec {
            minimum: 16,
            maximum: 32,
            modulo: 8,
        };
        assert!(aes.is_valid_length(24));
        assert!(!aes.is_valid_length(20));
        assert!(!aes.is_valid_length(8));
    }

    #[test]
    fn test_method_names_use_hyphens() {
        assert!(Mac::lookup("set-key").is_some());
        assert!(Mac::lookup("set_key").is_none());
    }
}
