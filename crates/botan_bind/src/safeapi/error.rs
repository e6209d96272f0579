// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::c_int;
use std::ffi::NulError;
use std::fmt;
use std::panic::catch_unwind;
use std::panic::UnwindSafe;
use std::process::abort;
use std::str::Utf8Error;

/// Status codes of the native library.
///
/// `Success` and `InvalidVerifier` are the only non-negative members; every
/// other code signals a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    Success = 0,
    InvalidVerifier = 1,
    InvalidInput = -1,
    BadMac = -2,
    NoValue = -3,
    InsufficientBufferSpace = -10,
    StringConversionError = -11,
    ExceptionThrown = -20,
    OutOfMemory = -21,
    SystemError = -22,
    InternalError = -23,
    BadFlag = -30,
    NullPointer = -31,
    BadParameter = -32,
    KeyNotSet = -33,
    InvalidKeyLength = -34,
    InvalidObjectState = -35,
    NotImplemented = -40,
    InvalidObject = -50,
    TlsError = -75,
    HttpError = -76,
    RoughtimeError = -77,
    TpmError = -78,
    UnknownError = -100,
}

impl ErrorKind {
    /// Every member of the taxonomy, in native declaration order.
    pub const ALL: [ErrorKind; 24] = [
        ErrorKind::Success,
        ErrorKind::InvalidVerifier,
        ErrorKind::InvalidInput,
        ErrorKind::BadMac,
        ErrorKind::NoValue,
        ErrorKind::InsufficientBufferSpace,
        ErrorKind::StringConversionError,
        ErrorKind::ExceptionThrown,
        ErrorKind::OutOfMemory,
        ErrorKind::SystemError,
        ErrorKind::InternalError,
        ErrorKind::BadFlag,
        ErrorKind::NullPointer,
        ErrorKind::BadParameter,
        ErrorKind::KeyNotSet,
        ErrorKind::InvalidKeyLength,
        ErrorKind::InvalidObjectState,
        ErrorKind::NotImplemented,
        ErrorKind::InvalidObject,
        ErrorKind::TlsError,
        ErrorKind::HttpError,
        ErrorKind::RoughtimeError,
        ErrorKind::TpmError,
        ErrorKind::UnknownError,
    ];

    /// Maps any native status onto the taxonomy. Codes outside the
    /// documented set become [`ErrorKind::UnknownError`].
    pub const fn translate(code: c_int) -> ErrorKind {
        match code {
            0 => ErrorKind::Success,
            1 => ErrorKind::InvalidVerifier,
            -1 => ErrorKind::InvalidInput,
            -2 => ErrorKind::BadMac,
            -3 => ErrorKind::NoValue,
            -10 => ErrorKind::InsufficientBufferSpace,
            -11 => ErrorKind::StringConversionError,
            -20 => ErrorKind::ExceptionThrown,
            -21 => ErrorKind::OutOfMemory,
            -22 => ErrorKind::SystemError,
            -23 => ErrorKind::InternalError,
            -30 => ErrorKind::BadFlag,
            -31 => ErrorKind::NullPointer,
            -32 => ErrorKind::BadParameter,
            -33 => ErrorKind::KeyNotSet,
            -34 => ErrorKind::InvalidKeyLength,
            -35 => ErrorKind::InvalidObjectState,
            -40 => ErrorKind::NotImplemented,
            -50 => ErrorKind::InvalidObject,
            -75 => ErrorKind::TlsError,
            -76 => ErrorKind::HttpError,
            -77 => ErrorKind::RoughtimeError,
            -78 => ErrorKind::TpmError,
            _ => ErrorKind::UnknownError,
        }
    }

    pub const fn code(self) -> c_int {
        self as i32 as c_int
    }

    /// Stable symbolic name, identical to the native header's macro name.
    pub const fn symbol(self) -> &'static str {
        match self {
            ErrorKind::Success => "BOTAN_FFI_SUCCESS",
            ErrorKind::InvalidVerifier => "BOTAN_FFI_INVALID_VERIFIER",
            ErrorKind::InvalidInput => "BOTAN_FFI_ERROR_INVALID_INPUT",
            ErrorKind::BadMac => "BOTAN_FFI_ERROR_BAD_MAC",
            ErrorKind::NoValue => "BOTAN_FFI_ERROR_NO_VALUE",
            ErrorKind::InsufficientBufferSpace => "BOTAN_FFI_ERROR_INSUFFICIENT_BUFFER_SPACE",
            ErrorKind::StringConversionError => "BOTAN_FFI_ERROR_STRING_CONVERSION_ERROR",
            ErrorKind::ExceptionThrown => "BOTAN_FFI_ERROR_EXCEPTION_THROWN",
            ErrorKind::OutOfMemory => "BOTAN_FFI_ERROR_OUT_OF_MEMORY",
            ErrorKind::SystemError => "BOTAN_FFI_ERROR_SYSTEM_ERROR",
            ErrorKind::InternalError => "BOTAN_FFI_ERROR_INTERNAL_ERROR",
            ErrorKind::BadFlag => "BOTAN_FFI_ERROR_BAD_FLAG",
            ErrorKind::NullPointer => "BOTAN_FFI_ERROR_NULL_POINTER",
            ErrorKind::BadParameter => "BOTAN_FFI_ERROR_BAD_PARAMETER",
            ErrorKind::KeyNotSet => "BOTAN_FFI_ERROR_KEY_NOT_SET",
            ErrorKind::InvalidKeyLength => "BOTAN_FFI_ERROR_INVALID_KEY_LENGTH",
            ErrorKind::InvalidObjectState => "BOTAN_FFI_ERROR_INVALID_OBJECT_STATE",
            ErrorKind::NotImplemented => "BOTAN_FFI_ERROR_NOT_IMPLEMENTED",
            ErrorKind::InvalidObject => "BOTAN_FFI_ERROR_INVALID_OBJECT",
            ErrorKind::TlsError => "BOTAN_FFI_ERROR_TLS_ERROR",
            ErrorKind::HttpError => "BOTAN_FFI_ERROR_HTTP_ERROR",
            ErrorKind::RoughtimeError => "BOTAN_FFI_ERROR_ROUGHTIME_ERROR",
            ErrorKind::TpmError => "BOTAN_FFI_ERROR_TPM_ERROR",
            ErrorKind::UnknownError => "BOTAN_FFI_ERROR_UNKNOWN_ERROR",
        }
    }

    pub const fn is_failure(self) -> bool {
        self.code() < 0
    }
}

impl From<ErrorKind> for c_int {
    fn from(kind: ErrorKind) -> c_int {
        kind.code()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Botan binding error type
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BotanError {
    /// Failure reported by a native call; displays the symbolic name only.
    #[error("{0}")]
    Ffi(ErrorKind),

    /// Native library could not be opened
    #[error("Could not load the native Botan library: {0}")]
    LibraryLoad(String),

    /// Native library already initialized
    #[error("Native library already initialized")]
    AlreadyInitialized,

    /// Nul byte found in a string passed to native code
    #[error("Null terminator found in string")]
    CStringNulError(#[from] NulError),

    /// Native string is not valid UTF-8
    #[error("Native string is not valid UTF-8")]
    Utf8Error(#[from] Utf8Error),

    /// Host argument rejected before any native call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrong number of host arguments
    #[error("Expected {expected} arguments, got {got}")]
    Arity { expected: String, got: usize },

    /// Keyword not present in the method table of a handle kind
    #[error("Unknown method {name} for {kind}")]
    UnknownMethod { kind: &'static str, name: String },

    /// Streaming call did not consume its whole input
    #[error("Native call consumed {consumed} of {len} input bytes")]
    IncompleteInput { consumed: usize, len: usize },

    /// View function returned without pushing any data
    #[error("View callback was never invoked")]
    ViewNotInvoked,
}

impl BotanError {
    /// Position of this error in the native taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotanError::Ffi(kind) => *kind,
            BotanError::LibraryLoad(_) => ErrorKind::SystemError,
            BotanError::AlreadyInitialized | BotanError::IncompleteInput { .. } => {
                ErrorKind::InvalidObjectState
            }
            BotanError::CStringNulError(_) | BotanError::Utf8Error(_) => {
                ErrorKind::StringConversionError
            }
            BotanError::InvalidArgument(_) | BotanError::Arity { .. } => ErrorKind::BadParameter,
            BotanError::UnknownMethod { .. } => ErrorKind::NotImplemented,
            BotanError::ViewNotInvoked => ErrorKind::NoValue,
        }
    }
}

impl From<ErrorKind> for BotanError {
    fn from(kind: ErrorKind) -> Self {
        BotanError::Ffi(kind)
    }
}

pub type BotanResult<T> = Result<T, BotanError>;

/// Passes non-negative codes through as data and turns negative codes into
/// the translated error.
pub fn assert_ok(code: c_int) -> BotanResult<c_int> {
    if code < 0 {
        Err(BotanError::Ffi(ErrorKind::translate(code)))
    } else {
        Ok(code)
    }
}

/// Like [`assert_ok`] for calls whose only success value is zero.
pub fn check(code: c_int) -> BotanResult<()> {
    match code {
        0 => Ok(()),
        _ => Err(BotanError::Ffi(ErrorKind::translate(code))),
    }
}

/// Answer convention of one boolean-style native call.
///
/// `yes` is the code meaning "true"; every code in `no` means "false". Any
/// other code, positive or negative, is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub name: &'static str,
    pub yes: c_int,
    pub no: &'static [c_int],
}

impl Predicate {
    pub const fn new(name: &'static str, yes: c_int, no: &'static [c_int]) -> Self {
        Self { name, yes, no }
    }

    pub fn eval(&self, code: c_int) -> BotanResult<bool> {
        predicate(code, self.yes, self.no).inspect_err(|err| {
            tracing::debug!(predicate = self.name, code, error = %err, "predicate failed");
        })
    }

    /// `botan_x509_cert_hostname_match`
    pub const HOSTNAME_MATCH: Predicate = Predicate::new("hostname_match", 0, &[-1]);
    /// `botan_x509_cert_allowed_usage`
    pub const ALLOWED_USAGE: Predicate = Predicate::new("allowed_usage", 0, &[1]);
    /// `botan_x509_is_revoked`: zero when revoked.
    pub const IS_REVOKED: Predicate = Predicate::new("is_revoked", 0, &[-1]);
    /// `botan_pk_op_verify_finish`
    pub const SIGNATURE_VALID: Predicate = Predicate::new("signature_valid", 0, &[1]);
    /// `botan_pubkey_check_key` / `botan_privkey_check_key`
    pub const KEY_VALID: Predicate = Predicate::new("key_valid", 0, &[-1]);
    /// `botan_bcrypt_is_valid`
    pub const BCRYPT_VALID: Predicate = Predicate::new("bcrypt_valid", 0, &[1]);
    /// `botan_hotp_check` / `botan_totp_check`
    pub const OTP_VALID: Predicate = Predicate::new("otp_valid", 0, &[1]);
    /// `botan_constant_time_compare`
    pub const BYTES_EQUAL: Predicate = Predicate::new("bytes_equal", 0, &[-1]);
    /// Native calls returning 1 for true and 0 for false (`botan_mp_is_*`,
    /// `botan_mp_get_bit`, `botan_mp_equal`, `botan_oid_equal`,
    /// `botan_cipher_valid_nonce_length`, `botan_cipher_is_authenticated`).
    pub const FLAG: Predicate = Predicate::new("flag", 1, &[0]);
}

/// Interprets `code` as a boolean answer.
pub fn predicate(code: c_int, yes: c_int, no: &[c_int]) -> BotanResult<bool> {
    if code == yes {
        Ok(true)
    } else if no.contains(&code) {
        Ok(false)
    } else {
        Err(BotanError::Ffi(ErrorKind::translate(code)))
    }
}

pub(crate) trait BotanErrorMapper<T> {
    fn map_botan_err(self, context: &str) -> BotanResult<T>;
}

impl<T> BotanErrorMapper<T> for BotanResult<T> {
    fn map_botan_err(self, context: &str) -> BotanResult<T> {
        self.inspect_err(|err| {
            tracing::debug!(error = %err, "{context}");
        })
    }
}

pub const fn level_to_string(level: tracing::Level) -> &'static str {
    match level {
        ::tracing::Level::TRACE => "TRACE",
        ::tracing::Level::DEBUG => "DEBUG",
        ::tracing::Level::INFO => "INFO",
        ::tracing::Level::WARN => "WARN",
        ::tracing::Level::ERROR => "ERROR",
    }
}

#[macro_export]
macro_rules! botan_log {
    ($error:expr, $level:expr, $($arg:tt)*) => {
        let file = file!();
        let line = line!();
        let level = $crate::safeapi::error::level_to_string($level);
        let log_string = format!("[{level}] {}: {}", $error, format!($($arg)*));

        match $level {
            ::tracing::Level::TRACE => tracing::trace!("{file}:{line}: {log_string}"),
            ::tracing::Level::DEBUG => tracing::debug!("{file}:{line}: {log_string}"),
            ::tracing::Level::INFO => tracing::info!("{file}:{line}: {log_string}"),
            ::tracing::Level::WARN => tracing::warn!("{file}:{line}: {log_string}"),
            ::tracing::Level::ERROR => tracing::error!("{file}:{line}: {log_string}"),
        }
    };
}

/// Catch an unwinding and abort. Used by callbacks invoked from native code,
/// where unwinding across the boundary is undefined.
pub fn on_unwind_abort<F: FnOnce() -> R + UnwindSafe, R>(func: F) -> R {
    match catch_unwind(func) {
        Ok(v) => v,
        Err(_) => abort(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_documented_codes() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::translate(kind.code()), kind);
            assert_eq!(c_int::from(kind), kind.code());
        }
    }

    #[test]
    fn test_translate_is_total() {
        let documented: Vec<c_int> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        for code in (-200..=200).chain([c_int::MIN, c_int::MAX]) {
            let kind = ErrorKind::translate(code);
            if documented.contains(&code) {
                assert_eq!(kind.code(), code);
            } else {
                assert_eq!(kind, ErrorKind::UnknownError, "code {code}");
            }
        }
    }

    #[test]
    fn test_symbols_are_unique_and_prefixed() {
        let mut symbols: Vec<&str> = ErrorKind::ALL.iter().map(|k| k.symbol()).collect();
        assert!(symbols.iter().all(|s| s.starts_with("BOTAN_FFI_")));
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_ffi_error_displays_symbol_only() {
        let err = BotanError::Ffi(ErrorKind::BadMac);
        assert_eq!(err.to_string(), "BOTAN_FFI_ERROR_BAD_MAC");
        assert_eq!(err.kind(), ErrorKind::BadMac);
    }

    #[test]
    fn test_assert_ok_passes_data_through() {
        assert_eq!(assert_ok(0), Ok(0));
        assert_eq!(assert_ok(1), Ok(1));
        assert_eq!(assert_ok(7), Ok(7));
        assert_eq!(assert_ok(-2), Err(BotanError::Ffi(ErrorKind::BadMac)));
        assert_eq!(assert_ok(-9999), Err(BotanError::Ffi(ErrorKind::UnknownError)));
    }

    #[test]
    fn test_check_rejects_positive() {
        assert_eq!(check(0), Ok(()));
        assert_eq!(check(1), Err(BotanError::Ffi(ErrorKind::InvalidVerifier)));
        assert_eq!(check(-31), Err(BotanError::Ffi(ErrorKind::NullPointer)));
    }

    #[test]
    fn test_predicates_answer_documented_codes() {
        let table = [
            Predicate::HOSTNAME_MATCH,
            Predicate::ALLOWED_USAGE,
            Predicate::IS_REVOKED,
            Predicate::SIGNATURE_VALID,
            Predicate::KEY_VALID,
            Predicate::BCRYPT_VALID,
            Predicate::OTP_VALID,
            Predicate::BYTES_EQUAL,
            Predicate::FLAG,
        ];
        for p in table {
            assert_eq!(p.eval(p.yes), Ok(true), "{}", p.name);
            for &no in p.no {
                assert_eq!(p.eval(no), Ok(false), "{}", p.name);
            }
            assert_eq!(
                p.eval(ErrorKind::InvalidObject.code()),
                Err(BotanError::Ffi(ErrorKind::InvalidObject)),
                "{}",
                p.name
            );
        }
    }

    #[test]
    fn test_predicate_unlisted_positive_is_error() {
        assert_eq!(
            Predicate::ALLOWED_USAGE.eval(5),
            Err(BotanError::Ffi(ErrorKind::UnknownError))
        );
        assert_eq!(Predicate::FLAG.eval(-1), Err(BotanError::Ffi(ErrorKind::InvalidInput)));
    }

    #[test]
    fn test_every_variant_has_a_kind() {
        let nul = std::ffi::CString::new(vec![b'a', 0]).err().expect("interior nul");
        let cases = [
            (BotanError::LibraryLoad("x".into()), ErrorKind::SystemError),
            (BotanError::AlreadyInitialized, ErrorKind::InvalidObjectState),
            (BotanError::CStringNulError(nul), ErrorKind::StringConversionError),
            (BotanError::InvalidArgument("x".into()), ErrorKind::BadParameter),
            (
                BotanError::Arity {
                    expected: "2".into(),
                    got: 1,
                },
                ErrorKind::BadParameter,
            ),
            (
                BotanError::UnknownMethod {
                    kind: "hash",
                    name: "nope".into(),
                },
                ErrorKind::NotImplemented,
            ),
            (
                BotanError::IncompleteInput { consumed: 1, len: 2 },
                ErrorKind::InvalidObjectState,
            ),
            (BotanError::ViewNotInvoked, ErrorKind::NoValue),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }
}
