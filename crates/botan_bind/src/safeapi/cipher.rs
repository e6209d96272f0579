// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mac::KeySpec;
use crate::safeapi::negotiate::fill_bounded;
use crate::safeapi::negotiate::negotiate_string;

const UPDATE_FLAG_FINAL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    fn init_flags(self) -> u32 {
        match self {
            Direction::Encrypt => 0,
            Direction::Decrypt => 1,
        }
    }
}

/// Symmetric cipher mode, including AEAD modes.
///
/// The object carries state across `set_key`, `start`, `update` and
/// `finish`. Interleaving two messages on one object is a logic error the
/// native side cannot detect.
#[derive(Debug)]
pub struct Cipher {
    handle: ManagedHandle,
    direction: Direction,
}

impl AsHandle for Cipher {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Cipher {
    /// Creates a mode by name, e.g. `AES-256/GCM` or `ChaCha20Poly1305`.
    pub fn new(name: &str, direction: Direction) -> BotanResult<Self> {
        let name = CString::new(name)?;
        let lib = ffi::library()?;
        let init = lib.botan_cipher_init()?;

        let handle = ManagedHandle::construct("cipher", lib.botan_cipher_destroy()?, |out| {
            // SAFETY: `name` is NUL-terminated.
            unsafe { init(out, name.as_ptr(), direction.init_flags()) }
        })?;
        Ok(Self { handle, direction })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_key(&mut self, key: &[u8]) -> BotanResult<()> {
        let set_key = ffi::library()?.botan_cipher_set_key()?;
        // SAFETY: `key` is readable for its full length.
        check(unsafe { set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) })
    }

    /// AEAD modes only; must precede `start`.
    pub fn set_associated_data(&mut self, ad: &[u8]) -> BotanResult<()> {
        let set_ad = ffi::library()?.botan_cipher_set_associated_data()?;
        // SAFETY: `ad` is readable for its full length.
        check(unsafe { set_ad(self.handle.as_ptr(), ad.as_ptr(), ad.len()) })
    }

    pub fn start(&mut self, nonce: &[u8]) -> BotanResult<()> {
        let start = ffi::library()?.botan_cipher_start()?;
        // SAFETY: `nonce` is readable for its full length.
        check(unsafe { start(self.handle.as_ptr(), nonce.as_ptr(), nonce.len()) })
    }

    fn transform(&mut self, flags: u32, input: &[u8], capacity: usize) -> BotanResult<Vec<u8>> {
        let update = ffi::library()?.botan_cipher_update()?;
        let handle = self.handle.as_ptr();
        let mut consumed = 0usize;

        let output = fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out_len` points at the capacity of `out`.
            let out_size = unsafe { *out_len };
            // SAFETY: buffers are valid for the stated lengths.
            unsafe {
                update(
                    handle,
                    flags,
                    out,
                    out_size,
                    out_len,
                    input.as_ptr(),
                    input.len(),
                    &mut consumed,
                )
            }
        })?;

        if consumed != input.len() {
            Err(BotanError::IncompleteInput {
                consumed,
                len: input.len(),
            })?;
        }
        Ok(output)
    }

    /// Processes a non-final chunk. `input` must be a multiple of
    /// [`Cipher::update_granularity`].
    pub fn update(&mut self, input: &[u8]) -> BotanResult<Vec<u8>> {
        self.transform(0, input, input.len())
    }

    /// Processes the last chunk, appending or verifying the tag of AEAD
    /// modes. A tag mismatch is reported as `BadMac`.
    pub fn finish(&mut self, input: &[u8]) -> BotanResult<Vec<u8>> {
        let capacity = self.output_length(input.len())?;
        self.transform(UPDATE_FLAG_FINAL, input, capacity)
    }

    /// Encrypts or decrypts one whole message under `nonce`.
    pub fn process(&mut self, nonce: &[u8], input: &[u8]) -> BotanResult<Vec<u8>> {
        self.start(nonce)?;
        self.finish(input)
    }

    /// Drops message state, keeps the key.
    pub fn reset(&mut self) -> BotanResult<()> {
        let reset = ffi::library()?.botan_cipher_reset()?;
        // SAFETY: live handle.
        check(unsafe { reset(self.handle.as_ptr()) })
    }

    /// Drops message state and the key.
    pub fn clear(&mut self) -> BotanResult<()> {
        let clear = ffi::library()?.botan_cipher_clear()?;
        // SAFETY: live handle.
        check(unsafe { clear(self.handle.as_ptr()) })
    }

    pub fn name(&self) -> BotanResult<String> {
        let name = ffi::library()?.botan_cipher_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { name(self.handle.as_ptr(), out, out_len) }
        })
    }

    /// Output size of a final call on `input_len` bytes.
    pub fn output_length(&self, input_len: usize) -> BotanResult<usize> {
        let output_length = ffi::library()?.botan_cipher_output_length()?;
        let mut len = 0usize;
        // SAFETY: `len` is a valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), input_len, &mut len) })?;
        Ok(len)
    }

    pub fn tag_length(&self) -> BotanResult<usize> {
        self.read_size(ffi::library()?.botan_cipher_get_tag_length()?)
    }

    pub fn default_nonce_length(&self) -> BotanResult<usize> {
        self.read_size(ffi::library()?.botan_cipher_get_default_nonce_length()?)
    }

    pub fn update_granularity(&self) -> BotanResult<usize> {
        self.read_size(ffi::library()?.botan_cipher_get_update_granularity()?)
    }

    pub fn ideal_update_granularity(&self) -> BotanResult<usize> {
        self.read_size(ffi::library()?.botan_cipher_get_ideal_update_granularity()?)
    }

    fn read_size(
        &self,
        getter: unsafe extern "C" fn(ffi::RawObject, *mut usize) -> std::ffi::c_int,
    ) -> BotanResult<usize> {
        let mut value = 0usize;
        // SAFETY: `value` is a valid out-parameter.
        check(unsafe { getter(self.handle.as_ptr(), &mut value) })?;
        Ok(value)
    }

    pub fn valid_nonce_length(&self, len: usize) -> BotanResult<bool> {
        let valid = ffi::library()?.botan_cipher_valid_nonce_length()?;
        // SAFETY: live handle.
        Predicate::FLAG.eval(unsafe { valid(self.handle.as_ptr(), len) })
    }

    /// Whether the mode produces a tag. Libraries without the direct query
    /// answer through the tag length.
    pub fn is_authenticated(&self) -> BotanResult<bool> {
        match ffi::library()?.botan_cipher_is_authenticated() {
            // SAFETY: live handle.
            Ok(query) => Predicate::FLAG.eval(unsafe { query(self.handle.as_ptr()) }),
            Err(err) if err.kind() == ErrorKind::NotImplemented => Ok(self.tag_length()? > 0),
            Err(err) => Err(err),
        }
    }

    pub fn key_spec(&self) -> BotanResult<KeySpec> {
        let get_keyspec = ffi::library()?.botan_cipher_get_keyspec()?;
        let (mut minimum, mut maximum, mut modulo) = (0usize, 0usize, 0usize);
        // SAFETY: all three out-parameters are valid.
        check(unsafe { get_keyspec(self.handle.as_ptr(), &mut minimum, &mut maximum, &mut modulo) })?;
        Ok(KeySpec {
            minimum,
            maximum,
            modulo,
        })
    }
}

fn cipher_set_key(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(c.set_key(get_bytes(args, 0)?)?.into())
}

fn cipher_set_ad(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(c.set_associated_data(get_bytes(args, 0)?)?.into())
}

fn cipher_start(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(c.start(get_bytes(args, 0)?)?.into())
}

fn cipher_update(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(c.update(get_bytes(args, 0)?)?.into())
}

fn cipher_finish(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 0, 1)?;
    Ok(c.finish(opt_bytes(args, 0)?.unwrap_or_default())?.into())
}

fn cipher_reset(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.reset()?.into())
}

fn cipher_clear(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.clear()?.into())
}

fn cipher_name(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.name()?.into())
}

fn cipher_tag_length(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.tag_length()?.into())
}

fn cipher_default_nonce_length(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.default_nonce_length()?.into())
}

fn cipher_valid_nonce_length(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(c.valid_nonce_length(get_size(args, 0)?)?.into())
}

fn cipher_update_granularity(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.update_granularity()?.into())
}

fn cipher_is_authenticated(c: &mut Cipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(c.is_authenticated()?.into())
}

impl Dispatch for Cipher {
    const KIND: &'static str = "cipher";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<Cipher>)] = &[
            ("set-key", cipher_set_key),
            ("set-associated-data", cipher_set_ad),
            ("start", cipher_start),
            ("update", cipher_update),
            ("finish", cipher_finish),
            ("reset", cipher_reset),
            ("clear", cipher_clear),
            ("name", cipher_name),
            ("tag-length", cipher_tag_length),
            ("default-nonce-length", cipher_default_nonce_length),
            ("valid-nonce-length", cipher_valid_nonce_length),
            ("update-granularity", cipher_update_granularity),
            ("is-authenticated", cipher_is_authenticated),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_flags() {
        assert_eq!(Direction::Encrypt.init_flags(), 0);
        assert_eq!(Direction::Decrypt.init_flags(), 1);
    }

    #[test]
    fn test_method_table() {
        assert!(Cipher::lookup("finish").is_some());
        assert!(Cipher::lookup("process").is_none());
    }
}
