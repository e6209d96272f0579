// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;
use std::ptr::null;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mpi::Mpi;
use crate::safeapi::negotiate::negotiate;
use crate::safeapi::negotiate::negotiate_string;
use crate::safeapi::negotiate::view_bytes;
use crate::safeapi::negotiate::view_string;
use crate::safeapi::pubkey::check_key_flags;
use crate::safeapi::pubkey::Encoding;
use crate::safeapi::pubkey::PublicKey;
use crate::safeapi::rng::Rng;

/// An asymmetric private key.
///
/// Key material stays inside the native object; only explicit export
/// copies it out.
#[derive(Debug)]
pub struct PrivateKey {
    handle: ManagedHandle,
}

impl AsHandle for PrivateKey {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl PrivateKey {
    /// Generates a key, e.g. `("RSA", "2048")`, `("ECDSA", "secp256r1")` or
    /// `("Ed25519", "")`.
    pub fn create(algo: &str, params: &str, rng: &Rng) -> BotanResult<Self> {
        let algo = CString::new(algo)?;
        let params = CString::new(params)?;
        let lib = ffi::library()?;
        let create = lib.botan_privkey_create()?;

        let handle = ManagedHandle::construct("privkey", lib.botan_privkey_destroy()?, |out| {
            // SAFETY: both strings are NUL-terminated; `rng` is live.
            unsafe { create(out, algo.as_ptr(), params.as_ptr(), rng.as_ptr()) }
        })?;
        tracing::debug!(algo = ?algo, "generated private key");
        Ok(Self { handle })
    }

    /// Loads PKCS#8, DER or PEM, decrypting with `password` when given.
    pub fn load(bits: &[u8], password: Option<&str>) -> BotanResult<Self> {
        let password = password.map(CString::new).transpose()?;
        let lib = ffi::library()?;
        let load = lib.botan_privkey_load()?;
        let password_ptr = password.as_ref().map_or(null(), |p| p.as_ptr());

        let handle = ManagedHandle::construct("privkey", lib.botan_privkey_destroy()?, |out| {
            // SAFETY: `bits` is readable for its full length; the password is
            // NUL-terminated or null. The rng argument is unused and may be null.
            unsafe { load(out, std::ptr::null_mut(), bits.as_ptr(), bits.len(), password_ptr) }
        })?;
        Ok(Self { handle })
    }

    /// Unencrypted PKCS#8.
    pub fn export(&self, encoding: Encoding) -> BotanResult<Vec<u8>> {
        let export = ffi::library()?.botan_privkey_export()?;
        negotiate(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { export(self.handle.as_ptr(), out, out_len, encoding.export_flags()) }
        })
    }

    pub fn to_der(&self) -> BotanResult<Vec<u8>> {
        let view = ffi::library()?.botan_privkey_view_der()?;
        view_bytes(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_bytes`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn to_pem(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_privkey_view_pem()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn algo_name(&self) -> BotanResult<String> {
        let algo_name = ffi::library()?.botan_privkey_algo_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { algo_name(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn check_key(&self, rng: &Rng, strong: bool) -> BotanResult<bool> {
        let check_key = ffi::library()?.botan_privkey_check_key()?;
        // SAFETY: both handles are live.
        Predicate::KEY_VALID.eval(unsafe { check_key(self.handle.as_ptr(), rng.as_ptr(), check_key_flags(strong)) })
    }

    pub fn public_key(&self) -> BotanResult<PublicKey> {
        let export_pubkey = ffi::library()?.botan_privkey_export_pubkey()?;
        PublicKey::construct(|out| {
            // SAFETY: valid out-parameter; live key.
            unsafe { export_pubkey(out, self.handle.as_ptr()) }
        })
    }

    pub fn get_field(&self, field: &str) -> BotanResult<Mpi> {
        let field = CString::new(field)?;
        let get_field = ffi::library()?.botan_privkey_get_field()?;
        let value = Mpi::new()?;
        // SAFETY: both handles are live; `field` is NUL-terminated.
        check(unsafe { get_field(value.as_ptr(), self.handle.as_ptr(), field.as_ptr()) })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_with_nul_is_rejected() {
        let err = PrivateKey::load(b"", Some("pass\0word")).err().expect("nul");
        assert_eq!(err.kind(), ErrorKind::StringConversionError);
    }
}
