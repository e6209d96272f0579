// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;

/// Generator implementations offered by the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RngType {
    /// Operating system generator.
    #[default]
    System,
    /// Userspace generator seeded from the system generator.
    User,
    /// `User`, with internal locking.
    UserThreadsafe,
    /// Always fails; useful to assert that no randomness is consumed.
    Null,
    /// Hardware generator, where present.
    Hwrnd,
    /// `RDRAND` instruction, where present.
    Rdrand,
}

impl RngType {
    pub fn name(self) -> &'static str {
        match self {
            RngType::System => "system",
            RngType::User => "user",
            RngType::UserThreadsafe => "user-threadsafe",
            RngType::Null => "null",
            RngType::Hwrnd => "hwrnd",
            RngType::Rdrand => "rdrand",
        }
    }
}

/// A native random number generator.
///
/// Generation mutates native state but only through the owned handle; the
/// type is `Send` and not `Sync`, so `&self` access is never concurrent.
#[derive(Debug)]
pub struct Rng {
    handle: ManagedHandle,
}

impl AsHandle for Rng {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Rng {
    pub fn new(rng_type: RngType) -> BotanResult<Self> {
        let name = CString::new(rng_type.name())?;
        let lib = ffi::library()?;
        let init = lib.botan_rng_init()?;

        let handle = ManagedHandle::construct("rng", lib.botan_rng_destroy()?, |out| {
            // SAFETY: `name` is NUL-terminated and outlives the call.
            unsafe { init(out, name.as_ptr()) }
        })?;
        tracing::debug!(rng = rng_type.name(), "created rng");
        Ok(Self { handle })
    }

    pub fn fill(&self, out: &mut [u8]) -> BotanResult<()> {
        let get = ffi::library()?.botan_rng_get()?;
        // SAFETY: `out` is writable for its full length.
        check(unsafe { get(self.handle.as_ptr(), out.as_mut_ptr(), out.len()) })
    }

    pub fn generate(&self, len: usize) -> BotanResult<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.fill(&mut out)?;
        Ok(out)
    }

    pub fn reseed(&self, bits: usize) -> BotanResult<()> {
        let reseed = ffi::library()?.botan_rng_reseed()?;
        // SAFETY: plain value arguments on a live handle.
        check(unsafe { reseed(self.handle.as_ptr(), bits) })
    }

    pub fn reseed_from_rng(&self, source: &Rng, bits: usize) -> BotanResult<()> {
        let reseed = ffi::library()?.botan_rng_reseed_from_rng()?;
        // SAFETY: both handles are live.
        check(unsafe { reseed(self.handle.as_ptr(), source.handle.as_ptr(), bits) })
    }

    pub fn add_entropy(&self, entropy: &[u8]) -> BotanResult<()> {
        let add = ffi::library()?.botan_rng_add_entropy()?;
        // SAFETY: `entropy` is readable for its full length.
        check(unsafe { add(self.handle.as_ptr(), entropy.as_ptr(), entropy.len()) })
    }
}

static DEFAULT_RNG: OnceLock<BotanResult<Mutex<Rng>>> = OnceLock::new();

/// Runs `f` with the process-wide system generator.
///
/// The generator is created on first use, at most once, and shared by all
/// callers behind a lock. A creation failure is cached and returned to every
/// later caller.
pub fn with_default<R>(f: impl FnOnce(&Rng) -> BotanResult<R>) -> BotanResult<R> {
    let rng = DEFAULT_RNG
        .get_or_init(|| Rng::new(RngType::System).map(Mutex::new))
        .as_ref()
        .map_err(Clone::clone)?;
    let guard = rng.lock();
    f(&guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_type_names() {
        let names: Vec<&str> = [
            RngType::System,
            RngType::User,
            RngType::UserThreadsafe,
            RngType::Null,
            RngType::Hwrnd,
            RngType::Rdrand,
        ]
        .iter()
        .map(|t| t.name())
        .collect();
        assert_eq!(names, ["system", "user", "user-threadsafe", "null", "hwrnd", "rdrand"]);
        assert_eq!(RngType::default(), RngType::System);
    }

    #[test]
    fn test_default_rng_failure_is_stable() {
        // With or without the native library, two calls agree.
        let first = with_default(|rng| rng.generate(4).map(|b| b.len()));
        let second = with_default(|rng| rng.generate(4).map(|b| b.len()));
        assert_eq!(first.is_ok(), second.is_ok());
        if let Ok(len) = first {
            assert_eq!(len, 4);
        }
    }
}
