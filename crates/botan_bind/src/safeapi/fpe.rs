// Copyright (C) Microsoft Corporation. All rights reserved.

//! Format preserving encryption over the integers `0..n` (FE1 scheme).

use crate::ffi;
use crate::ffi::RawObject;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mpi::Mpi;

/// Round count used when a caller does not choose one.
pub const DEFAULT_ROUNDS: usize = 5;

/// `BOTAN_FPE_FLAG_FE1_COMPAT_MODE`
const FE1_COMPAT_MODE: u32 = 1;

type FpeOp = unsafe extern "C" fn(RawObject, RawObject, *const u8, usize) -> std::ffi::c_int;

#[derive(Debug)]
pub struct Fpe {
    handle: ManagedHandle,
}

impl AsHandle for Fpe {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Fpe {
    /// FE1 over `0..modulus`. At least 16 rounds are recommended. The
    /// compatibility mode matches the output of library versions before 2.5.
    pub fn fe1(modulus: &Mpi, key: &[u8], rounds: usize, compat_mode: bool) -> BotanResult<Self> {
        let lib = ffi::library()?;
        let init = lib.botan_fpe_fe1_init()?;
        let flags = if compat_mode { FE1_COMPAT_MODE } else { 0 };

        let handle = ManagedHandle::construct("fpe", lib.botan_fpe_destroy()?, |out| {
            // SAFETY: `modulus` is live; `key` is readable for its full length.
            unsafe { init(out, modulus.as_ptr(), key.as_ptr(), key.len(), rounds, flags) }
        })?;
        Ok(Self { handle })
    }

    fn apply(&self, op: FpeOp, x: &mut Mpi, tweak: &[u8]) -> BotanResult<()> {
        // SAFETY: both handles are live; `tweak` is readable for its full
        // length.
        check(unsafe { op(self.handle.as_ptr(), x.as_ptr(), tweak.as_ptr(), tweak.len()) })
    }

    pub fn encrypt_in_place(&self, x: &mut Mpi, tweak: &[u8]) -> BotanResult<()> {
        self.apply(ffi::library()?.botan_fpe_encrypt()?, x, tweak)
    }

    pub fn decrypt_in_place(&self, x: &mut Mpi, tweak: &[u8]) -> BotanResult<()> {
        self.apply(ffi::library()?.botan_fpe_decrypt()?, x, tweak)
    }

    /// Ciphertext of `x`, which must be below the modulus. `x` is left
    /// untouched.
    pub fn encrypt(&self, x: &Mpi, tweak: &[u8]) -> BotanResult<Mpi> {
        let mut out = x.try_clone()?;
        self.encrypt_in_place(&mut out, tweak)?;
        Ok(out)
    }

    pub fn decrypt(&self, x: &Mpi, tweak: &[u8]) -> BotanResult<Mpi> {
        let mut out = x.try_clone()?;
        self.decrypt_in_place(&mut out, tweak)?;
        Ok(out)
    }
}

fn fpe_encrypt(fpe: &mut Fpe, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 2)?;
    Ok(Value::Mpi(fpe.encrypt(get_mpi(args, 0)?, get_bytes(args, 1)?)?))
}

fn fpe_decrypt(fpe: &mut Fpe, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 2)?;
    Ok(Value::Mpi(fpe.decrypt(get_mpi(args, 0)?, get_bytes(args, 1)?)?))
}

impl Dispatch for Fpe {
    const KIND: &'static str = "fpe";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Fpe>)] = &[("encrypt", fpe_encrypt), ("decrypt", fpe_decrypt)];
        METHODS
    }
}
