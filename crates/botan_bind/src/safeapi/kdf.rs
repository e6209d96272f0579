// Copyright (C) Microsoft Corporation. All rights reserved.

//! Key derivation and password hashing.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::negotiate::fill_exact;
use crate::safeapi::negotiate::negotiate_string;
use crate::safeapi::rng::Rng;

/// Output of a tuned password hash together with the parameters chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedPasswordHash {
    pub output: Vec<u8>,
    pub params: (usize, usize, usize),
}

/// Generic KDF such as `HKDF(SHA-256)` or `KDF2(SHA-256)`.
pub fn kdf(algo: &str, out_len: usize, secret: &[u8], salt: &[u8], label: &[u8]) -> BotanResult<Vec<u8>> {
    let algo = CString::new(algo)?;
    let kdf = ffi::library()?.botan_kdf()?;
    fill_exact(out_len, |out, _| {
        // SAFETY: every input is readable for its length; `out` holds `out_len` bytes.
        unsafe {
            kdf(
                algo.as_ptr(),
                out,
                out_len,
                secret.as_ptr(),
                secret.len(),
                salt.as_ptr(),
                salt.len(),
                label.as_ptr(),
                label.len(),
            )
        }
    })
}

/// Password hash with explicit parameters. Their meaning depends on `algo`:
/// iterations for `PBKDF2(...)`, `(N, r, p)` for `Scrypt`, `(M, t, p)` for
/// `Argon2id`.
pub fn pwdhash(
    algo: &str,
    params: (usize, usize, usize),
    out_len: usize,
    password: &[u8],
    salt: &[u8],
) -> BotanResult<Vec<u8>> {
    let algo = CString::new(algo)?;
    let pwdhash = ffi::library()?.botan_pwdhash()?;
    fill_exact(out_len, |out, _| {
        // SAFETY: the password is passed with its length, so it need not be
        // NUL-terminated; `out` holds `out_len` bytes.
        unsafe {
            pwdhash(
                algo.as_ptr(),
                params.0,
                params.1,
                params.2,
                out,
                out_len,
                password.as_ptr().cast(),
                password.len(),
                salt.as_ptr(),
                salt.len(),
            )
        }
    })
}

/// Password hash whose parameters are tuned to take about `msec`
/// milliseconds.
pub fn pwdhash_timed(
    algo: &str,
    msec: u32,
    out_len: usize,
    password: &[u8],
    salt: &[u8],
) -> BotanResult<TimedPasswordHash> {
    let algo = CString::new(algo)?;
    let pwdhash_timed = ffi::library()?.botan_pwdhash_timed()?;
    let mut params = (0usize, 0usize, 0usize);

    let output = fill_exact(out_len, |out, _| {
        // SAFETY: as for `pwdhash`; the three parameter pointers are valid.
        unsafe {
            pwdhash_timed(
                algo.as_ptr(),
                msec,
                &mut params.0,
                &mut params.1,
                &mut params.2,
                out,
                out_len,
                password.as_ptr().cast(),
                password.len(),
                salt.as_ptr(),
                salt.len(),
            )
        }
    })?;
    tracing::debug!(?params, msec, "tuned password hash parameters");
    Ok(TimedPasswordHash { output, params })
}

/// Classic PBKDF, e.g. `PBKDF2(SHA-256)`.
pub fn pbkdf(algo: &str, password: &str, salt: &[u8], iterations: usize, out_len: usize) -> BotanResult<Vec<u8>> {
    let algo = CString::new(algo)?;
    let password = CString::new(password)?;
    let pbkdf = ffi::library()?.botan_pbkdf()?;
    fill_exact(out_len, |out, _| {
        // SAFETY: both strings are NUL-terminated; `out` holds `out_len` bytes.
        unsafe {
            pbkdf(
                algo.as_ptr(),
                out,
                out_len,
                password.as_ptr(),
                salt.as_ptr(),
                salt.len(),
                iterations,
            )
        }
    })
}

pub fn scrypt(password: &[u8], salt: &[u8], n: usize, r: usize, p: usize, out_len: usize) -> BotanResult<Vec<u8>> {
    pwdhash("Scrypt", (n, r, p), out_len, password, salt)
}

/// Bcrypt hash in modular crypt format (`$2a$...`).
pub fn bcrypt_generate(password: &str, rng: &Rng, work_factor: usize) -> BotanResult<String> {
    let password = CString::new(password)?;
    let generate = ffi::library()?.botan_bcrypt_generate()?;
    negotiate_string(|out, out_len| {
        // SAFETY: `password` is NUL-terminated; `rng` is live.
        unsafe { generate(out.cast(), out_len, password.as_ptr(), rng.as_ptr(), work_factor, 0) }
    })
}

pub fn bcrypt_is_valid(password: &str, hash: &str) -> BotanResult<bool> {
    let password = CString::new(password)?;
    let hash = CString::new(hash)?;
    let is_valid = ffi::library()?.botan_bcrypt_is_valid()?;
    // SAFETY: both strings are NUL-terminated.
    Predicate::BCRYPT_VALID.eval(unsafe { is_valid(password.as_ptr(), hash.as_ptr()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nul_in_password_is_rejected_early() {
        let err = pbkdf("PBKDF2(SHA-256)", "pass\0word", b"salt", 1000, 32)
            .err()
            .expect("interior nul");
        assert!(matches!(err, BotanError::CStringNulError(_)));
        assert!(matches!(
            bcrypt_is_valid("pw", "$2a\0"),
            Err(BotanError::CStringNulError(_))
        ));
    }
}
