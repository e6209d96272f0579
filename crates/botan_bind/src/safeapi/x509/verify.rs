// Copyright (C) Microsoft Corporation. All rights reserved.

//! Certificate path validation.
//!
//! A failed validation is an ordinary answer, not an error: [`X509Cert::verify`]
//! returns `Ok` with a nonzero [`ValidationStatus`] when no acceptable path
//! exists, and `Err` only when the native call itself fails.

use std::ffi::c_int;
use std::ffi::CStr;
use std::ffi::CString;
use std::fmt;
use std::path::PathBuf;
use std::ptr::null;

use crate::ffi;
use crate::ffi::BotanFfi;
use crate::ffi::RawObject;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::x509::cert::path_to_cstring;
use crate::safeapi::x509::cert::X509Cert;
use crate::safeapi::x509::crl::X509Crl;

/// Inputs of one path validation.
///
/// `Default` is: no intermediates, no trust anchors, no CRLs, no anchor
/// directory, library default strength, no hostname check, current time.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions<'a> {
    intermediates: Vec<&'a X509Cert>,
    trusted: Vec<&'a X509Cert>,
    crls: Vec<&'a X509Crl>,
    trusted_path: Option<PathBuf>,
    required_strength: usize,
    hostname: Option<String>,
    reference_time: u64,
}

impl<'a> VerifyOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Untrusted certificates that may complete the path.
    pub fn intermediates(mut self, certs: impl IntoIterator<Item = &'a X509Cert>) -> Self {
        self.intermediates.extend(certs);
        self
    }

    /// Trust anchors.
    pub fn trusted(mut self, certs: impl IntoIterator<Item = &'a X509Cert>) -> Self {
        self.trusted.extend(certs);
        self
    }

    pub fn crls(mut self, crls: impl IntoIterator<Item = &'a X509Crl>) -> Self {
        self.crls.extend(crls);
        self
    }

    /// Directory of additional trust anchors.
    pub fn trusted_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trusted_path = Some(path.into());
        self
    }

    /// Minimum key and signature strength in bits; 0 keeps the library
    /// default.
    pub fn required_strength(mut self, bits: usize) -> Self {
        self.required_strength = bits;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Seconds since the epoch; 0 means now.
    pub fn reference_time(mut self, seconds: u64) -> Self {
        self.reference_time = seconds;
        self
    }

    /// Reads `:name value` pairs. Names may use `-` or `_` as separator.
    /// A `nil` value leaves the default in place.
    pub fn from_keywords(args: &[Arg<'a>]) -> BotanResult<Self> {
        let mut options = Self::default();
        let mut seen: Vec<String> = Vec::with_capacity(args.len() / 2);

        let mut index = 0;
        while index < args.len() {
            let name = get_keyword(args, index)?.replace('_', "-");
            let value_index = index + 1;
            let value = *args
                .get(value_index)
                .ok_or_else(|| BotanError::InvalidArgument(format!("missing value for :{name}")))?;

            if seen.contains(&name) {
                Err(BotanError::InvalidArgument(format!("duplicate option :{name}")))?;
            }

            match name.as_str() {
                "intermediates" => options.intermediates = cert_list(value, &name)?,
                "trusted" => options.trusted = cert_list(value, &name)?,
                "crls" => options.crls = crl_list(value, &name)?,
                "trusted-path" => options.trusted_path = opt_str(args, value_index)?.map(PathBuf::from),
                "required-strength" => options.required_strength = opt_size(args, value_index, 0)?,
                "hostname" => options.hostname = opt_str(args, value_index)?.map(str::to_owned),
                "reference-time" => options.reference_time = opt_u64(args, value_index, 0)?,
                _ => Err(BotanError::InvalidArgument(format!("unknown option :{name}")))?,
            }

            seen.push(name);
            index += 2;
        }

        Ok(options)
    }
}

fn cert_list<'a>(value: Arg<'a>, name: &str) -> BotanResult<Vec<&'a X509Cert>> {
    match value {
        Arg::Nil => Ok(Vec::new()),
        Arg::Cert(cert) => Ok(vec![cert]),
        Arg::Certs(certs) => Ok(certs.to_vec()),
        other => Err(BotanError::InvalidArgument(format!(
            ":{name} expects certificates, got {}",
            other.type_name()
        ))),
    }
}

fn crl_list<'a>(value: Arg<'a>, name: &str) -> BotanResult<Vec<&'a X509Crl>> {
    match value {
        Arg::Nil => Ok(Vec::new()),
        Arg::Crl(crl) => Ok(vec![crl]),
        Arg::Crls(crls) => Ok(crls.to_vec()),
        other => Err(BotanError::InvalidArgument(format!(
            ":{name} expects CRLs, got {}",
            other.type_name()
        ))),
    }
}

/// Native certificate status code. Zero means the path validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidationStatus(pub i32);

impl ValidationStatus {
    pub fn is_valid(self) -> bool {
        self.0 == 0
    }

    pub fn code(self) -> i32 {
        self.0
    }

    /// Human readable reason.
    pub fn explain(self) -> BotanResult<String> {
        self.explain_with(ffi::library()?)
    }

    pub(crate) fn explain_with(self, lib: &BotanFfi) -> BotanResult<String> {
        let describe = lib.botan_x509_cert_validation_status()?;
        // SAFETY: the call takes a plain integer and returns a static string
        // or null.
        let text = unsafe { describe(self.0) };
        if text.is_null() {
            return Ok(format!("Unknown validation status {}", self.0));
        }
        // SAFETY: non-null results point at static NUL-terminated strings.
        let text = unsafe { CStr::from_ptr(text) };
        Ok(text.to_str()?.to_owned())
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.explain() {
            Ok(text) => write!(f, "{text} ({})", self.0),
            Err(_) => write!(f, "validation status {}", self.0),
        }
    }
}

impl X509Cert {
    /// Validates a path from this certificate to a trust anchor.
    pub fn verify(&self, options: &VerifyOptions<'_>) -> BotanResult<ValidationStatus> {
        self.verify_with(ffi::library()?, options)
    }

    /// `botan_x509_cert_verify_with_crl` is called only when CRLs are given.
    pub(crate) fn verify_with(&self, lib: &BotanFfi, options: &VerifyOptions<'_>) -> BotanResult<ValidationStatus> {
        let hostname = options.hostname.as_deref().map(CString::new).transpose()?;
        let trusted_path = options.trusted_path.as_deref().map(path_to_cstring).transpose()?;
        let hostname_ptr = hostname.as_ref().map_or(null(), |h| h.as_ptr());
        let trusted_path_ptr = trusted_path.as_ref().map_or(null(), |p| p.as_ptr());

        let intermediates: Vec<RawObject> = options.intermediates.iter().map(|c| c.as_ptr()).collect();
        let trusted: Vec<RawObject> = options.trusted.iter().map(|c| c.as_ptr()).collect();
        let crls: Vec<RawObject> = options.crls.iter().map(|c| c.as_ptr()).collect();

        let mut status: c_int = 0;
        let rc = if crls.is_empty() {
            let verify = lib.botan_x509_cert_verify()?;
            // SAFETY: every array holds live handles and outlives the call;
            // strings are NUL-terminated or null.
            unsafe {
                verify(
                    &mut status,
                    self.as_ptr(),
                    intermediates.as_ptr(),
                    intermediates.len(),
                    trusted.as_ptr(),
                    trusted.len(),
                    trusted_path_ptr,
                    options.required_strength,
                    hostname_ptr,
                    options.reference_time,
                )
            }
        } else {
            let verify = lib.botan_x509_cert_verify_with_crl()?;
            // SAFETY: as above.
            unsafe {
                verify(
                    &mut status,
                    self.as_ptr(),
                    intermediates.as_ptr(),
                    intermediates.len(),
                    trusted.as_ptr(),
                    trusted.len(),
                    crls.as_ptr(),
                    crls.len(),
                    trusted_path_ptr,
                    options.required_strength,
                    hostname_ptr,
                    options.reference_time,
                )
            }
        };

        let result = status_from(rc, status);
        tracing::debug!(rc, status, crls = crls.len(), "certificate verify returned");
        result
    }
}

/// Verify returns 0 for a validated path and 1 for a rejected one; in both
/// cases `status` carries the reason. Negative returns are errors, and any
/// other positive return is outside the native contract.
fn status_from(rc: c_int, status: c_int) -> BotanResult<ValidationStatus> {
    match assert_ok(rc).map_botan_err("certificate verification failed")? {
        0 | 1 => Ok(ValidationStatus(status)),
        other => Err(BotanError::Ffi(ErrorKind::translate(other))),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ffi::c_char;

    use super::*;
    use crate::safeapi::handle::ManagedHandle;

    #[test]
    fn test_defaults() {
        let options = VerifyOptions::default();
        assert!(options.intermediates.is_empty());
        assert!(options.trusted.is_empty());
        assert!(options.crls.is_empty());
        assert_eq!(options.trusted_path, None);
        assert_eq!(options.required_strength, 0);
        assert_eq!(options.hostname, None);
        assert_eq!(options.reference_time, 0);
    }

    #[test]
    fn test_builder() {
        let options = VerifyOptions::new()
            .hostname("example.com")
            .required_strength(128)
            .reference_time(4_000_000_000)
            .trusted_path("/etc/ssl/certs");
        assert_eq!(options.hostname.as_deref(), Some("example.com"));
        assert_eq!(options.required_strength, 128);
        assert_eq!(options.reference_time, 4_000_000_000);
        assert_eq!(options.trusted_path, Some(PathBuf::from("/etc/ssl/certs")));
    }

    #[test]
    fn test_keywords_accept_both_separators() {
        let args = [
            Arg::Keyword("hostname"),
            Arg::Str("leaf.example"),
            Arg::Keyword("reference_time"),
            Arg::Uint(4_000_000_000),
            Arg::Keyword("required-strength"),
            Arg::Int(110),
            Arg::Keyword("trusted_path"),
            Arg::Nil,
            Arg::Keyword("intermediates"),
            Arg::Nil,
        ];
        let options = VerifyOptions::from_keywords(&args).expect("options");
        assert_eq!(options.hostname.as_deref(), Some("leaf.example"));
        assert_eq!(options.reference_time, 4_000_000_000);
        assert_eq!(options.required_strength, 110);
        assert_eq!(options.trusted_path, None);
        assert!(options.intermediates.is_empty());
    }

    #[test]
    fn test_keywords_reject_unknown_name() {
        let err = VerifyOptions::from_keywords(&[Arg::Keyword("max-depth"), Arg::Int(3)])
            .err()
            .expect("unknown");
        assert_eq!(err.kind(), ErrorKind::BadParameter);
        assert!(err.to_string().contains("max-depth"));
    }

    #[test]
    fn test_keywords_reject_duplicates_across_spellings() {
        let args = [
            Arg::Keyword("reference-time"),
            Arg::Uint(1),
            Arg::Keyword("reference_time"),
            Arg::Uint(2),
        ];
        let err = VerifyOptions::from_keywords(&args).err().expect("duplicate");
        assert!(matches!(err, BotanError::InvalidArgument(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_keywords_reject_wrong_value_types() {
        for args in [
            [Arg::Keyword("trusted"), Arg::Str("root.pem")],
            [Arg::Keyword("crls"), Arg::Int(1)],
            [Arg::Keyword("reference-time"), Arg::Str("now")],
            [Arg::Keyword("hostname"), Arg::Int(1)],
        ] {
            let err = VerifyOptions::from_keywords(&args).err().expect("type error");
            assert_eq!(err.kind(), ErrorKind::BadParameter, "{args:?}");
        }
    }

    #[test]
    fn test_keywords_require_pairs() {
        let err = VerifyOptions::from_keywords(&[Arg::Keyword("hostname")]).err().expect("missing");
        assert_eq!(err.kind(), ErrorKind::BadParameter);

        let err = VerifyOptions::from_keywords(&[Arg::Str("hostname"), Arg::Str("x")])
            .err()
            .expect("not a keyword");
        assert_eq!(err.kind(), ErrorKind::BadParameter);
    }

    thread_local! {
        static VERIFY_RC: Cell<c_int> = const { Cell::new(0) };
        static VERIFY_STATUS: Cell<c_int> = const { Cell::new(0) };
        static CALLED: Cell<&'static str> = const { Cell::new("") };
        static CRLS_SEEN: Cell<usize> = const { Cell::new(0) };
    }

    fn fake_object() -> RawObject {
        Box::into_raw(Box::new(0u64)).cast()
    }

    unsafe extern "C" fn fake_destroy(raw: RawObject) -> c_int {
        // SAFETY: `raw` came from `fake_object`.
        drop(unsafe { Box::from_raw(raw.cast::<u64>()) });
        0
    }

    fn fake_ctor(out: *mut RawObject) -> c_int {
        // SAFETY: `construct` passes a valid out-parameter.
        unsafe { *out = fake_object() };
        0
    }

    fn fake_cert() -> X509Cert {
        X509Cert {
            handle: ManagedHandle::construct("x509_cert", fake_destroy, fake_ctor).expect("fake cert"),
        }
    }

    fn fake_crl() -> X509Crl {
        X509Crl {
            handle: ManagedHandle::construct("x509_crl", fake_destroy, fake_ctor).expect("fake crl"),
        }
    }

    fn report(status: *mut c_int) -> c_int {
        // SAFETY: `verify_with` passes a valid out-parameter.
        unsafe { *status = VERIFY_STATUS.get() };
        VERIFY_RC.get()
    }

    unsafe extern "C" fn fake_verify(
        status: *mut c_int,
        _cert: RawObject,
        _intermediates: *const RawObject,
        _intermediates_len: usize,
        _trusted: *const RawObject,
        _trusted_len: usize,
        _trusted_path: *const c_char,
        _required_strength: usize,
        _hostname: *const c_char,
        _reference_time: u64,
    ) -> c_int {
        CALLED.set("verify");
        report(status)
    }

    unsafe extern "C" fn fake_verify_with_crl(
        status: *mut c_int,
        _cert: RawObject,
        _intermediates: *const RawObject,
        _intermediates_len: usize,
        _trusted: *const RawObject,
        _trusted_len: usize,
        _crls: *const RawObject,
        crls_len: usize,
        _trusted_path: *const c_char,
        _required_strength: usize,
        _hostname: *const c_char,
        _reference_time: u64,
    ) -> c_int {
        CALLED.set("verify_with_crl");
        CRLS_SEEN.set(crls_len);
        report(status)
    }

    unsafe extern "C" fn fake_status_text(code: c_int) -> *const c_char {
        match code {
            0 => b"Verified\0".as_ptr().cast(),
            _ => null(),
        }
    }

    fn fake_table() -> BotanFfi {
        let mut lib = BotanFfi::empty();
        lib.botan_x509_cert_verify = Some(fake_verify);
        lib.botan_x509_cert_verify_with_crl = Some(fake_verify_with_crl);
        lib.botan_x509_cert_validation_status = Some(fake_status_text);
        lib
    }

    fn verify_returning(rc: c_int, status: c_int, options: &VerifyOptions<'_>) -> BotanResult<ValidationStatus> {
        VERIFY_RC.set(rc);
        VERIFY_STATUS.set(status);
        fake_cert().verify_with(&fake_table(), options)
    }

    #[test_with_tracing::test]
    fn test_verified_and_rejected_paths_are_statuses() {
        let options = VerifyOptions::new();
        assert_eq!(verify_returning(0, 0, &options), Ok(ValidationStatus(0)));
        assert_eq!(verify_returning(1, 3002, &options), Ok(ValidationStatus(3002)));
        assert_eq!(CALLED.get(), "verify");
    }

    #[test_with_tracing::test]
    fn test_negative_return_is_translated_error() {
        let options = VerifyOptions::new();
        assert_eq!(
            verify_returning(ErrorKind::BadParameter.code(), 0, &options),
            Err(BotanError::Ffi(ErrorKind::BadParameter))
        );
        assert_eq!(
            verify_returning(ErrorKind::ExceptionThrown.code(), 0, &options),
            Err(BotanError::Ffi(ErrorKind::ExceptionThrown))
        );
    }

    #[test]
    fn test_positive_return_above_one_is_rejected() {
        let result = verify_returning(2, 0, &VerifyOptions::new());
        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::UnknownError)));
    }

    #[test]
    fn test_crls_select_crl_entry_point() {
        let crl = fake_crl();
        let options = VerifyOptions::new().crls([&crl]);
        assert_eq!(verify_returning(1, 5000, &options), Ok(ValidationStatus(5000)));
        assert_eq!(CALLED.get(), "verify_with_crl");
        assert_eq!(CRLS_SEEN.get(), 1);
    }

    #[test]
    fn test_missing_entry_point_is_not_implemented() {
        VERIFY_RC.set(0);
        let result = fake_cert().verify_with(&BotanFfi::empty(), &VerifyOptions::new());
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::NotImplemented));
    }

    #[test]
    fn test_explain_known_and_unknown_status() {
        let lib = fake_table();
        assert_eq!(ValidationStatus(0).explain_with(&lib).expect("known"), "Verified");
        assert_eq!(
            ValidationStatus(9999).explain_with(&lib).expect("unknown"),
            "Unknown validation status 9999"
        );
    }

    #[test]
    fn test_status_code() {
        assert!(ValidationStatus(0).is_valid());
        assert!(!ValidationStatus(3002).is_valid());
        assert_eq!(ValidationStatus(3002).code(), 3002);
    }
}
