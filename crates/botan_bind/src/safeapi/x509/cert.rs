// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::c_uint;
use std::ffi::CString;
use std::ops::BitOr;
use std::path::Path;
use std::str::FromStr;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::impl_native_display;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::handle::NativeDisplay;
use crate::safeapi::negotiate::negotiate;
use crate::safeapi::negotiate::negotiate_string;
use crate::safeapi::negotiate::view_bytes;
use crate::safeapi::negotiate::view_string;
use crate::safeapi::pubkey::PublicKey;
use crate::safeapi::x509::verify::VerifyOptions;

const DEFAULT_FINGERPRINT_HASH: &str = "SHA-256";

/// Key usage bits of the X.509 `KeyUsage` extension, as the native library
/// numbers them. Values combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyUsage(pub c_uint);

impl KeyUsage {
    pub const NO_CONSTRAINTS: KeyUsage = KeyUsage(0);
    pub const DIGITAL_SIGNATURE: KeyUsage = KeyUsage(32768);
    pub const NON_REPUDIATION: KeyUsage = KeyUsage(16384);
    pub const KEY_ENCIPHERMENT: KeyUsage = KeyUsage(8192);
    pub const DATA_ENCIPHERMENT: KeyUsage = KeyUsage(4096);
    pub const KEY_AGREEMENT: KeyUsage = KeyUsage(2048);
    pub const KEY_CERT_SIGN: KeyUsage = KeyUsage(1024);
    pub const CRL_SIGN: KeyUsage = KeyUsage(512);
    pub const ENCIPHER_ONLY: KeyUsage = KeyUsage(256);
    pub const DECIPHER_ONLY: KeyUsage = KeyUsage(128);

    const NAMED: [(&'static str, KeyUsage); 10] = [
        ("NO-CONSTRAINTS", KeyUsage::NO_CONSTRAINTS),
        ("DIGITAL-SIGNATURE", KeyUsage::DIGITAL_SIGNATURE),
        ("NON-REPUDIATION", KeyUsage::NON_REPUDIATION),
        ("KEY-ENCIPHERMENT", KeyUsage::KEY_ENCIPHERMENT),
        ("DATA-ENCIPHERMENT", KeyUsage::DATA_ENCIPHERMENT),
        ("KEY-AGREEMENT", KeyUsage::KEY_AGREEMENT),
        ("KEY-CERT-SIGN", KeyUsage::KEY_CERT_SIGN),
        ("CRL-SIGN", KeyUsage::CRL_SIGN),
        ("ENCIPHER-ONLY", KeyUsage::ENCIPHER_ONLY),
        ("DECIPHER-ONLY", KeyUsage::DECIPHER_ONLY),
    ];

    pub fn bits(self) -> c_uint {
        self.0
    }

    /// Looks up a usage by name, e.g. `DIGITAL-SIGNATURE` or `key_cert_sign`.
    /// Case and the `-`/`_` separator are ignored.
    pub fn from_name(name: &str) -> Option<KeyUsage> {
        let name = name.trim().to_ascii_uppercase().replace('_', "-");
        KeyUsage::NAMED
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, usage)| *usage)
    }
}

impl FromStr for KeyUsage {
    type Err = BotanError;

    /// One name, or several joined with `|`.
    fn from_str(text: &str) -> BotanResult<Self> {
        text.split('|').try_fold(KeyUsage::NO_CONSTRAINTS, |acc, name| {
            KeyUsage::from_name(name)
                .map(|usage| acc | usage)
                .ok_or_else(|| BotanError::InvalidArgument(format!("unknown key usage {:?}", name.trim())))
        })
    }
}

impl BitOr for KeyUsage {
    type Output = KeyUsage;

    fn bitor(self, rhs: KeyUsage) -> KeyUsage {
        KeyUsage(self.0 | rhs.0)
    }
}

pub(crate) fn path_to_cstring(path: &Path) -> BotanResult<CString> {
    let text = path
        .to_str()
        .ok_or_else(|| BotanError::InvalidArgument(format!("path {} is not valid UTF-8", path.display())))?;
    Ok(CString::new(text)?)
}

/// A parsed X.509 certificate.
///
/// Certificates are immutable once loaded, but the handle is still `!Sync`
/// like every other handle kind.
pub struct X509Cert {
    pub(super) handle: ManagedHandle,
}

impl AsHandle for X509Cert {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl X509Cert {
    fn construct(ctor: impl FnOnce(*mut ffi::RawObject) -> std::ffi::c_int) -> BotanResult<Self> {
        let handle = ManagedHandle::construct("x509_cert", ffi::library()?.botan_x509_cert_destroy()?, ctor)?;
        Ok(Self { handle })
    }

    /// Parses DER or PEM.
    pub fn load(bits: &[u8]) -> BotanResult<Self> {
        let load = ffi::library()?.botan_x509_cert_load()?;
        Self::construct(|out| {
            // SAFETY: `bits` is readable for its full length.
            unsafe { load(out, bits.as_ptr(), bits.len()) }
        })
    }

    pub fn load_file(path: impl AsRef<Path>) -> BotanResult<Self> {
        let path = path_to_cstring(path.as_ref())?;
        let load_file = ffi::library()?.botan_x509_cert_load_file()?;
        Self::construct(|out| {
            // SAFETY: `path` is NUL-terminated.
            unsafe { load_file(out, path.as_ptr()) }
        })
    }

    /// A second handle to an equal certificate.
    pub fn duplicate(&self) -> BotanResult<Self> {
        let dup = ffi::library()?.botan_x509_cert_dup()?;
        Self::construct(|out| {
            // SAFETY: valid out-parameter; live certificate.
            unsafe { dup(out, self.handle.as_ptr()) }
        })
    }

    /// Start of the validity period, seconds since the epoch.
    pub fn not_before(&self) -> BotanResult<u64> {
        let not_before = ffi::library()?.botan_x509_cert_not_before()?;
        let mut time = 0u64;
        // SAFETY: valid out-parameter.
        check(unsafe { not_before(self.handle.as_ptr(), &mut time) })?;
        Ok(time)
    }

    /// End of the validity period, seconds since the epoch.
    pub fn not_after(&self) -> BotanResult<u64> {
        let not_after = ffi::library()?.botan_x509_cert_not_after()?;
        let mut time = 0u64;
        // SAFETY: valid out-parameter.
        check(unsafe { not_after(self.handle.as_ptr(), &mut time) })?;
        Ok(time)
    }

    /// `notBefore` as `YYYYMMDDHHMMSSZ`.
    pub fn time_starts(&self) -> BotanResult<String> {
        let time_starts = ffi::library()?.botan_x509_cert_get_time_starts()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { time_starts(self.handle.as_ptr(), out, out_len) }
        })
    }

    /// `notAfter` as `YYYYMMDDHHMMSSZ`.
    pub fn time_expires(&self) -> BotanResult<String> {
        let time_expires = ffi::library()?.botan_x509_cert_get_time_expires()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { time_expires(self.handle.as_ptr(), out, out_len) }
        })
    }

    /// Colon separated uppercase hex digest of the encoded certificate.
    pub fn fingerprint(&self, hash: Option<&str>) -> BotanResult<String> {
        let hash = CString::new(hash.unwrap_or(DEFAULT_FINGERPRINT_HASH))?;
        let fingerprint = ffi::library()?.botan_x509_cert_get_fingerprint()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `hash` is NUL-terminated; `out` holds `*out_len` bytes.
            unsafe { fingerprint(self.handle.as_ptr(), hash.as_ptr(), out.cast(), out_len) }
        })
    }

    pub fn serial_number(&self) -> BotanResult<Vec<u8>> {
        let serial = ffi::library()?.botan_x509_cert_get_serial_number()?;
        negotiate(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { serial(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn authority_key_id(&self) -> BotanResult<Vec<u8>> {
        let akid = ffi::library()?.botan_x509_cert_get_authority_key_id()?;
        negotiate(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { akid(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn subject_key_id(&self) -> BotanResult<Vec<u8>> {
        let skid = ffi::library()?.botan_x509_cert_get_subject_key_id()?;
        negotiate(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { skid(self.handle.as_ptr(), out, out_len) }
        })
    }

    /// DER encoded `SubjectPublicKeyInfo`.
    pub fn public_key_bits(&self) -> BotanResult<Vec<u8>> {
        let view = ffi::library()?.botan_x509_cert_view_public_key_bits()?;
        view_bytes(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_bytes`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    pub fn public_key(&self) -> BotanResult<PublicKey> {
        let get_public_key = ffi::library()?.botan_x509_cert_get_public_key()?;
        PublicKey::construct(|out| {
            // SAFETY: valid out-parameter; live certificate.
            unsafe { get_public_key(self.handle.as_ptr(), out) }
        })
    }

    /// The `index`-th value of attribute `key` (e.g. `Name`, `Organization`)
    /// in the subject name.
    pub fn subject_dn(&self, key: &str, index: usize) -> BotanResult<String> {
        let key = CString::new(key)?;
        let subject_dn = ffi::library()?.botan_x509_cert_get_subject_dn()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `key` is NUL-terminated; `out` holds `*out_len` bytes.
            unsafe { subject_dn(self.handle.as_ptr(), key.as_ptr(), index, out.cast(), out_len) }
        })
    }

    /// As [`X509Cert::subject_dn`], for the issuer name.
    pub fn issuer_dn(&self, key: &str, index: usize) -> BotanResult<String> {
        let key = CString::new(key)?;
        let issuer_dn = ffi::library()?.botan_x509_cert_get_issuer_dn()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `key` is NUL-terminated; `out` holds `*out_len` bytes.
            unsafe { issuer_dn(self.handle.as_ptr(), key.as_ptr(), index, out.cast(), out_len) }
        })
    }

    pub fn hostname_match(&self, hostname: &str) -> BotanResult<bool> {
        let hostname = CString::new(hostname)?;
        let hostname_match = ffi::library()?.botan_x509_cert_hostname_match()?;
        // SAFETY: `hostname` is NUL-terminated.
        Predicate::HOSTNAME_MATCH.eval(unsafe { hostname_match(self.handle.as_ptr(), hostname.as_ptr()) })
    }

    /// Whether the certificate permits every bit of `usage`.
    pub fn allowed_usage(&self, usage: KeyUsage) -> BotanResult<bool> {
        let allowed_usage = ffi::library()?.botan_x509_cert_allowed_usage()?;
        // SAFETY: live certificate.
        Predicate::ALLOWED_USAGE.eval(unsafe { allowed_usage(self.handle.as_ptr(), usage.bits()) })
    }
}

impl NativeDisplay for X509Cert {
    fn render(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_x509_cert_view_as_string()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }
}

impl_native_display!(X509Cert);

fn cert_dup(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(Value::Cert(cert.duplicate()?))
}

fn cert_not_before(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.not_before()?.into())
}

fn cert_not_after(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.not_after()?.into())
}

fn cert_time_starts(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.time_starts()?.into())
}

fn cert_time_expires(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.time_expires()?.into())
}

fn cert_to_string(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.render()?.into())
}

fn cert_fingerprint(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 0, 1)?;
    Ok(cert.fingerprint(opt_str(args, 0)?)?.into())
}

fn cert_serial_number(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.serial_number()?.into())
}

fn cert_authority_key_id(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.authority_key_id()?.into())
}

fn cert_subject_key_id(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.subject_key_id()?.into())
}

fn cert_public_key_bits(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(cert.public_key_bits()?.into())
}

fn cert_public_key(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(Value::PublicKey(cert.public_key()?))
}

fn cert_subject_dn(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 1, 2)?;
    Ok(cert.subject_dn(get_str(args, 0)?, opt_size(args, 1, 0)?)?.into())
}

fn cert_issuer_dn(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 1, 2)?;
    Ok(cert.issuer_dn(get_str(args, 0)?, opt_size(args, 1, 0)?)?.into())
}

fn cert_hostname_match(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(cert.hostname_match(get_str(args, 0)?)?.into())
}

/// Usage names (`:key-cert-sign`, `"DIGITAL-SIGNATURE|CRL-SIGN"`) or the raw
/// bit value.
fn key_usage_arg(args: &[Arg<'_>], index: usize) -> BotanResult<KeyUsage> {
    match args.get(index) {
        Some(Arg::Str(text)) | Some(Arg::Keyword(text)) => text.parse(),
        _ => Ok(KeyUsage(get_u32(args, index)?)),
    }
}

fn cert_allowed_usage(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(cert.allowed_usage(key_usage_arg(args, 0)?)?.into())
}

fn cert_verify(cert: &mut X509Cert, args: &[Arg<'_>]) -> BotanResult<Value> {
    let options = VerifyOptions::from_keywords(args)?;
    Ok(Value::Status(cert.verify(&options)?))
}

impl Dispatch for X509Cert {
    const KIND: &'static str = "x509_cert";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<X509Cert>)] = &[
            ("dup", cert_dup),
            ("not-before", cert_not_before),
            ("not-after", cert_not_after),
            ("time-starts", cert_time_starts),
            ("time-expires", cert_time_expires),
            ("to-string", cert_to_string),
            ("fingerprint", cert_fingerprint),
            ("serial-number", cert_serial_number),
            ("authority-key-id", cert_authority_key_id),
            ("subject-key-id", cert_subject_key_id),
            ("public-key-bits", cert_public_key_bits),
            ("public-key", cert_public_key),
            ("subject-dn", cert_subject_dn),
            ("issuer-dn", cert_issuer_dn),
            ("hostname-match", cert_hostname_match),
            ("allowed-usage", cert_allowed_usage),
            ("verify", cert_verify),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_usage_bits_combine() {
        let usage = KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN;
        assert_eq!(usage.bits(), 1536);
        assert_eq!(KeyUsage::default(), KeyUsage::NO_CONSTRAINTS);
        assert_eq!((KeyUsage::DIGITAL_SIGNATURE | KeyUsage::NO_CONSTRAINTS).bits(), 32768);
    }

    #[test]
    fn test_key_usage_from_names() {
        assert_eq!(KeyUsage::from_name("DIGITAL-SIGNATURE"), Some(KeyUsage::DIGITAL_SIGNATURE));
        assert_eq!(KeyUsage::from_name("key_cert_sign"), Some(KeyUsage::KEY_CERT_SIGN));
        assert_eq!(KeyUsage::from_name("Crl-Sign"), Some(KeyUsage::CRL_SIGN));
        assert_eq!(KeyUsage::from_name("signing"), None);
        assert_eq!(
            "KEY-CERT-SIGN | CRL-SIGN".parse::<KeyUsage>(),
            Ok(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN)
        );
        assert!(matches!("DIGITAL-SIGNATURE|bogus".parse::<KeyUsage>(), Err(BotanError::InvalidArgument(_))));
    }

    #[test]
    fn test_usage_argument_accepts_names_and_bits() {
        assert_eq!(key_usage_arg(&[Arg::Keyword("key-cert-sign")], 0), Ok(KeyUsage::KEY_CERT_SIGN));
        assert_eq!(key_usage_arg(&[Arg::Str("DIGITAL-SIGNATURE")], 0), Ok(KeyUsage::DIGITAL_SIGNATURE));
        assert_eq!(key_usage_arg(&[Arg::Uint(1024)], 0), Ok(KeyUsage::KEY_CERT_SIGN));
        assert_eq!(key_usage_arg(&[Arg::Int(32768)], 0), Ok(KeyUsage::DIGITAL_SIGNATURE));
        assert_eq!(
            key_usage_arg(&[Arg::Keyword("sign-everything")], 0).err().map(|e| e.kind()),
            Some(ErrorKind::BadParameter)
        );
        assert!(key_usage_arg(&[Arg::Bytes(b"\x04")], 0).is_err());
    }

    #[test]
    fn test_dispatch_covers_both_dn_queries() {
        assert!(X509Cert::lookup("subject-dn").is_some());
        assert!(X509Cert::lookup("issuer-dn").is_some());
        assert!(X509Cert::lookup("verify").is_some());
        assert!(X509Cert::lookup("issuer_dn").is_none());
    }

    #[test]
    fn test_load_file_rejects_nul_in_path() {
        let err = X509Cert::load_file("root\0.pem").err().expect("nul");
        assert_eq!(err.kind(), ErrorKind::StringConversionError);
    }
}
