// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::negotiate::fill_exact;
use crate::safeapi::negotiate::negotiate_string;

/// Incremental message digest.
#[derive(Debug)]
pub struct Hash {
    handle: ManagedHandle,
}

impl AsHandle for Hash {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Hash {
    /// Creates a digest by algorithm name, e.g. `SHA-256` or `BLAKE2b(256)`.
    pub fn new(name: &str) -> BotanResult<Self> {
        let name = CString::new(name)?;
        let lib = ffi::library()?;
        let init = lib.botan_hash_init()?;

        let handle = ManagedHandle::construct("hash", lib.botan_hash_destroy()?, |out| {
            // SAFETY: `name` is NUL-terminated; flags must be zero.
            unsafe { init(out, name.as_ptr(), 0) }
        })?;
        Ok(Self { handle })
    }

    /// One-shot digest of `data`.
    pub fn digest(name: &str, data: &[u8]) -> BotanResult<Vec<u8>> {
        let mut hash = Self::new(name)?;
        hash.update(data)?;
        hash.finish()
    }

    /// A new object carrying a copy of the current digest state.
    pub fn copy_state(&self) -> BotanResult<Self> {
        let lib = ffi::library()?;
        let copy = lib.botan_hash_copy_state()?;

        let handle = ManagedHandle::construct("hash", lib.botan_hash_destroy()?, |out| {
            // SAFETY: `self` is live.
            unsafe { copy(out, self.handle.as_ptr()) }
        })?;
        Ok(Self { handle })
    }

    pub fn update(&mut self, data: &[u8]) -> BotanResult<()> {
        let update = ffi::library()?.botan_hash_update()?;
        // SAFETY: `data` is readable for its full length.
        check(unsafe { update(self.handle.as_ptr(), data.as_ptr(), data.len()) })
    }

    /// Returns the digest and resets the state for reuse.
    pub fn finish(&mut self) -> BotanResult<Vec<u8>> {
        let finish = ffi::library()?.botan_hash_final()?;
        fill_exact(self.output_length()?, |out, _| {
            // SAFETY: `out` holds `output_length` bytes.
            unsafe { finish(self.handle.as_ptr(), out) }
        })
    }

    pub fn clear(&mut self) -> BotanResult<()> {
        let clear = ffi::library()?.botan_hash_clear()?;
        // SAFETY: live handle.
        check(unsafe { clear(self.handle.as_ptr()) })
    }

    pub fn name(&self) -> BotanResult<String> {
        let name = ffi::library()?.botan_hash_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { name(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn output_length(&self) -> BotanResult<usize> {
        let output_length = ffi::library()?.botan_hash_output_length()?;
        let mut len = 0usize;
        // SAFETY: `len` is a valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), &mut len) })?;
        Ok(len)
    }

    pub fn block_size(&self) -> BotanResult<usize> {
        let block_size = ffi::library()?.botan_hash_block_size()?;
        let mut len = 0usize;
        // SAFETY: `len` is a valid out-parameter.
        check(unsafe { block_size(self.handle.as_ptr(), &mut len) })?;
        Ok(len)
    }
}

fn hash_update(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    hash.update(get_bytes(args, 0)?)?;
    Ok(Value::Nil)
}

fn hash_final(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(hash.finish()?.into())
}

fn hash_clear(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(hash.clear()?.into())
}

fn hash_name(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(hash.name()?.into())
}

fn hash_output_length(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(hash.output_length()?.into())
}

fn hash_block_size(hash: &mut Hash, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(hash.block_size()?.into())
}

impl Dispatch for Hash {
    const KIND: &'static str = "hash";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Hash>)] = &[
            ("update", hash_update),
            ("final", hash_final),
            ("clear", hash_clear),
            ("name", hash_name),
            ("output-length", hash_output_length),
            ("block-size", hash_block_size),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table() {
        assert_eq!(
            Hash::method_names(),
            vec!["update", "final", "clear", "name", "output-length", "block-size"]
        );
        assert!(Hash::lookup("copy").is_none());
    }

    #[test]
    fn test_bad_name_fails_before_native_call() {
        let err = Hash::new("SHA\0256").err().expect("interior nul");
        assert_eq!(err.kind(), ErrorKind::StringConversionError);
    }
}
