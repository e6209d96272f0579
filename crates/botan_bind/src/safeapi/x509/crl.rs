// Copyright (C) Microsoft Corporation. All rights reserved.

use std::path::Path;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::x509::cert::path_to_cstring;
use crate::safeapi::x509::cert::X509Cert;

/// A parsed certificate revocation list.
#[derive(Debug)]
pub struct X509Crl {
    pub(super) handle: ManagedHandle,
}

impl AsHandle for X509Crl {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl X509Crl {
    /// Parses DER or PEM.
    pub fn load(bits: &[u8]) -> BotanResult<Self> {
        let lib = ffi::library()?;
        let load = lib.botan_x509_crl_load()?;

        let handle = ManagedHandle::construct("x509_crl", lib.botan_x509_crl_destroy()?, |out| {
            // SAFETY: `bits` is readable for its full length.
            unsafe { load(out, bits.as_ptr(), bits.len()) }
        })?;
        Ok(Self { handle })
    }

    pub fn load_file(path: impl AsRef<Path>) -> BotanResult<Self> {
        let path = path_to_cstring(path.as_ref())?;
        let lib = ffi::library()?;
        let load_file = lib.botan_x509_crl_load_file()?;

        let handle = ManagedHandle::construct("x509_crl", lib.botan_x509_crl_destroy()?, |out| {
            // SAFETY: `path` is NUL-terminated.
            unsafe { load_file(out, path.as_ptr()) }
        })?;
        Ok(Self { handle })
    }

    /// Whether this list revokes `cert`. Only the serial number and issuer
    /// are compared; the list's own signature is not checked here.
    pub fn is_revoked(&self, cert: &X509Cert) -> BotanResult<bool> {
        let is_revoked = ffi::library()?.botan_x509_is_revoked()?;
        // SAFETY: both handles are live.
        Predicate::IS_REVOKED.eval(unsafe { is_revoked(self.handle.as_ptr(), cert.as_ptr()) })
    }
}

fn crl_is_revoked(crl: &mut X509Crl, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(crl.is_revoked(get_cert(args, 0)?)?.into())
}

impl Dispatch for X509Crl {
    const KIND: &'static str = "x509_crl";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<X509Crl>)] = &[("is-revoked", crl_is_revoked)];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_revoked_requires_a_certificate() {
        assert_eq!(X509Crl::method_names(), vec!["is-revoked"]);
        let err = get_cert(&[Arg::Str("leaf.pem")], 0).err().expect("type error");
        assert_eq!(err.kind(), ErrorKind::BadParameter);
    }
}
