// Copyright (C) Microsoft Corporation. All rights reserved.

//! One-time passwords (RFC 4226 HOTP and RFC 6238 TOTP).

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::ManagedHandle;

const DEFAULT_HASH: &str = "SHA-1";
const DEFAULT_DIGITS: usize = 6;
const DEFAULT_TIME_STEP: usize = 30;

/// Counter based one-time passwords.
#[derive(Debug)]
pub struct Hotp {
    handle: ManagedHandle,
}

impl Hotp {
    /// `digits` must be 6, 7 or 8.
    pub fn new(key: &[u8], hash: Option<&str>, digits: Option<usize>) -> BotanResult<Self> {
        let hash = CString::new(hash.unwrap_or(DEFAULT_HASH))?;
        let digits = digits.unwrap_or(DEFAULT_DIGITS);
        let lib = ffi::library()?;
        let init = lib.botan_hotp_init()?;

        let handle = ManagedHandle::construct("hotp", lib.botan_hotp_destroy()?, |out| {
            // SAFETY: `key` is readable; `hash` is NUL-terminated.
            unsafe { init(out, key.as_ptr(), key.len(), hash.as_ptr(), digits) }
        })?;
        Ok(Self { handle })
    }

    pub fn generate(&self, counter: u64) -> BotanResult<u32> {
        let generate = ffi::library()?.botan_hotp_generate()?;
        let mut code = 0u32;
        // SAFETY: valid out-parameter.
        check(unsafe { generate(self.handle.as_ptr(), &mut code, counter) })?;
        Ok(code)
    }

    /// Accepts `code` for any counter in `counter..=counter + resync_range`.
    /// Returns whether it matched and the counter to use next.
    pub fn check(&self, code: u32, counter: u64, resync_range: usize) -> BotanResult<(bool, u64)> {
        let check_code = ffi::library()?.botan_hotp_check()?;
        let mut next_counter = counter;
        // SAFETY: valid out-parameter.
        let rc = unsafe { check_code(self.handle.as_ptr(), &mut next_counter, code, counter, resync_range) };
        let ok = Predicate::OTP_VALID.eval(rc)?;
        Ok((ok, next_counter))
    }
}

/// Time based one-time passwords.
#[derive(Debug)]
pub struct Totp {
    handle: ManagedHandle,
}

impl Totp {
    pub fn new(key: &[u8], hash: Option<&str>, digits: Option<usize>, time_step: Option<usize>) -> BotanResult<Self> {
        let hash = CString::new(hash.unwrap_or(DEFAULT_HASH))?;
        let digits = digits.unwrap_or(DEFAULT_DIGITS);
        let time_step = time_step.unwrap_or(DEFAULT_TIME_STEP);
        let lib = ffi::library()?;
        let init = lib.botan_totp_init()?;

        let handle = ManagedHandle::construct("totp", lib.botan_totp_destroy()?, |out| {
            // SAFETY: `key` is readable; `hash` is NUL-terminated.
            unsafe { init(out, key.as_ptr(), key.len(), hash.as_ptr(), digits, time_step) }
        })?;
        Ok(Self { handle })
    }

    pub fn generate(&self, timestamp: u64) -> BotanResult<u32> {
        let generate = ffi::library()?.botan_totp_generate()?;
        let mut code = 0u32;
        // SAFETY: valid out-parameter.
        check(unsafe { generate(self.handle.as_ptr(), &mut code, timestamp) })?;
        Ok(code)
    }

    /// Accepts `code` within `drift` time steps either side of `timestamp`.
    pub fn check(&self, code: u32, timestamp: u64, drift: usize) -> BotanResult<bool> {
        let check_code = ffi::library()?.botan_totp_check()?;
        // SAFETY: plain value arguments on a live handle.
        Predicate::OTP_VALID.eval(unsafe { check_code(self.handle.as_ptr(), code, timestamp, drift) })
    }
}

fn hotp_generate(hotp: &mut Hotp, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(hotp.generate(get_u64(args, 0)?)?.into())
}

fn hotp_check(hotp: &mut Hotp, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 2, 3)?;
    let (ok, next_counter) = hotp.check(get_u32(args, 0)?, get_u64(args, 1)?, opt_size(args, 2, 0)?)?;
    Ok(Value::Tuple(vec![ok.into(), next_counter.into()]))
}

impl Dispatch for Hotp {
    const KIND: &'static str = "hotp";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Hotp>)] = &[("generate", hotp_generate), ("check", hotp_check)];
        METHODS
    }
}

fn totp_generate(totp: &mut Totp, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(totp.generate(get_u64(args, 0)?)?.into())
}

fn totp_check(totp: &mut Totp, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 2, 3)?;
    Ok(totp.check(get_u32(args, 0)?, get_u64(args, 1)?, opt_size(args, 2, 0)?)?.into())
}

impl Dispatch for Totp {
    const KIND: &'static str = "totp";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Totp>)] = &[("generate", totp_generate), ("check", totp_check)];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tables() {
        assert_eq!(Hotp::method_names(), vec!["generate", "check"]);
        assert_eq!(Totp::method_names(), vec!["generate", "check"]);
    }
}
