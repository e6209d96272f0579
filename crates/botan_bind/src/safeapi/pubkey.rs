// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::c_int;
use std::ffi::CString;

use crate::ffi;
use crate::ffi::RawObject;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mpi::Mpi;
use crate::safeapi::negotiate::negotiate;
use crate::safeapi::negotiate::negotiate_string;
use crate::safeapi::negotiate::view_bytes;
use crate::safeapi::negotiate::view_string;
use crate::safeapi::oid::Oid;
use crate::safeapi::rng::Rng;

/// Key serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Der,
    Pem,
}

impl Encoding {
    pub(crate) fn export_flags(self) -> u32 {
        match self {
            Encoding::Der => 0,
            Encoding::Pem => 1,
        }
    }
}

/// Runs the expensive checks too (e.g. primality of RSA factors).
pub(crate) const CHECK_KEY_EXPENSIVE_TESTS: u32 = 1;

pub(crate) fn check_key_flags(strong: bool) -> u32 {
    if strong {
        CHECK_KEY_EXPENSIVE_TESTS
    } else {
        0
    }
}

#[derive(Debug)]
pub struct PublicKey {
    handle: ManagedHandle,
}

impl AsHandle for PublicKey {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl PublicKey {
    /// Loads a DER or PEM encoded `SubjectPublicKeyInfo`.
    pub fn load(bits: &[u8]) -> BotanResult<Self> {
        let load = ffi::library()?.botan_pubkey_load()?;
        Self::construct(|out| {
            // SAFETY: `bits` is readable for its full length.
            unsafe { load(out, bits.as_ptr(), bits.len()) }
        })
    }

    /// Wraps a public key produced by another native object, such as a
    /// certificate or a private key.
    pub(crate) fn construct(ctor: impl FnOnce(*mut RawObject) -> c_int) -> BotanResult<Self> {
        let handle = ManagedHandle::construct("pubkey", ffi::library()?.botan_pubkey_destroy()?, ctor)?;
        Ok(Self { handle })
    }

    pub fn export(&self, encoding: Encoding) -> BotanResult<Vec<u8>> {
        let export = ffi::library()?.botan_pubkey_export()?;
        negotiate(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { export(self.handle.as_ptr(), out, out_len, encoding.export_flags()) }
        })
    }

    pub fn to_der(&self) -> BotanResult<Vec<u8>> {
        let view = ffi::library()?.botan_pubkey_view_der()?;
        view_bytes(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_bytes`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn to_pem(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_pubkey_view_pem()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn algo_name(&self) -> BotanResult<String> {
        let algo_name = ffi::library()?.botan_pubkey_algo_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { algo_name(self.handle.as_ptr(), out, out_len) }
        })
    }

    /// `Ok(false)` when the key fails its consistency checks.
    pub fn check_key(&self, rng: &Rng, strong: bool) -> BotanResult<bool> {
        let check_key = ffi::library()?.botan_pubkey_check_key()?;
        // SAFETY: both handles are live.
        Predicate::KEY_VALID.eval(unsafe { check_key(self.handle.as_ptr(), rng.as_ptr(), check_key_flags(strong)) })
    }

    /// Approximate security level in bits.
    pub fn estimated_strength(&self) -> BotanResult<usize> {
        let strength = ffi::library()?.botan_pubkey_estimated_strength()?;
        let mut estimate = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { strength(self.handle.as_ptr(), &mut estimate) })?;
        Ok(estimate)
    }

    /// Digest of the encoded key under `hash`.
    pub fn fingerprint(&self, hash: &str) -> BotanResult<Vec<u8>> {
        let hash = CString::new(hash)?;
        let fingerprint = ffi::library()?.botan_pubkey_fingerprint()?;
        negotiate(|out, out_len| {
            // SAFETY: `hash` is NUL-terminated; `out` holds `*out_len` bytes.
            unsafe { fingerprint(self.handle.as_ptr(), hash.as_ptr(), out, out_len) }
        })
    }

    /// Algorithm specific component, e.g. `n` or `e` of an RSA key.
    pub fn get_field(&self, field: &str) -> BotanResult<Mpi> {
        let field = CString::new(field)?;
        let get_field = ffi::library()?.botan_pubkey_get_field()?;
        let value = Mpi::new()?;
        // SAFETY: both handles are live; `field` is NUL-terminated.
        check(unsafe { get_field(value.as_ptr(), self.handle.as_ptr(), field.as_ptr()) })?;
        Ok(value)
    }

    pub fn oid(&self) -> BotanResult<Oid> {
        let pubkey_oid = ffi::library()?.botan_pubkey_oid()?;
        Oid::construct(|out| {
            // SAFETY: valid out-parameter; live key.
            unsafe { pubkey_oid(out, self.handle.as_ptr()) }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_flags() {
        assert_eq!(Encoding::default(), Encoding::Der);
        assert_eq!(Encoding::Der.export_flags(), 0);
        assert_eq!(Encoding::Pem.export_flags(), 1);
        assert_eq!(check_key_flags(true), 1);
        assert_eq!(check_key_flags(false), 0);
    }
}
