// Copyright (C) Microsoft Corporation. All rights reserved.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::mac::KeySpec;
use crate::safeapi::negotiate::negotiate_string;

/// Raw block cipher applied block by block (ECB), for building modes that
/// the native library does not provide.
#[derive(Debug)]
pub struct BlockCipher {
    handle: ManagedHandle,
}

impl AsHandle for BlockCipher {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl BlockCipher {
    pub fn new(name: &str) -> BotanResult<Self> {
        let name = CString::new(name)?;
        let lib = ffi::library()?;
        let init = lib.botan_block_cipher_init()?;

        let handle = ManagedHandle::construct("block_cipher", lib.botan_block_cipher_destroy()?, |out| {
            // SAFETY: `name` is NUL-terminated.
            unsafe { init(out, name.as_ptr()) }
        })?;
        Ok(Self { handle })
    }

    pub fn set_key(&mut self, key: &[u8]) -> BotanResult<()> {
        let set_key = ffi::library()?.botan_block_cipher_set_key()?;
        // SAFETY: `key` is readable for its full length.
        check(unsafe { set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) })
    }

    /// Block size in bytes. The native call returns it as its status.
    pub fn block_size(&self) -> BotanResult<usize> {
        let block_size = ffi::library()?.botan_block_cipher_block_size()?;
        // SAFETY: live handle.
        let size = assert_ok(unsafe { block_size(self.handle.as_ptr()) })?;
        usize::try_from(size).map_err(|_| BotanError::Ffi(ErrorKind::InternalError))
    }

    fn blocks_in(&self, input: &[u8]) -> BotanResult<usize> {
        let block_size = self.block_size()?;
        if block_size == 0 || input.len() % block_size != 0 {
            Err(BotanError::InvalidArgument(format!(
                "input length {} is not a multiple of the block size {block_size}",
                input.len()
            )))?;
        }
        Ok(input.len() / block_size)
    }

    pub fn encrypt_blocks(&self, input: &[u8]) -> BotanResult<Vec<u8>> {
        let encrypt = ffi::library()?.botan_block_cipher_encrypt_blocks()?;
        let blocks = self.blocks_in(input)?;
        let mut out = vec![0u8; input.len()];
        // SAFETY: `input` and `out` both hold `blocks` whole blocks.
        check(unsafe { encrypt(self.handle.as_ptr(), input.as_ptr(), out.as_mut_ptr(), blocks) })?;
        Ok(out)
    }

    pub fn decrypt_blocks(&self, input: &[u8]) -> BotanResult<Vec<u8>> {
        let decrypt = ffi::library()?.botan_block_cipher_decrypt_blocks()?;
        let blocks = self.blocks_in(input)?;
        let mut out = vec![0u8; input.len()];
        // SAFETY: `input` and `out` both hold `blocks` whole blocks.
        check(unsafe { decrypt(self.handle.as_ptr(), input.as_ptr(), out.as_mut_ptr(), blocks) })?;
        Ok(out)
    }

    /// Forgets the key.
    pub fn clear(&mut self) -> BotanResult<()> {
        let clear = ffi::library()?.botan_block_cipher_clear()?;
        // SAFETY: live handle.
        check(unsafe { clear(self.handle.as_ptr()) })
    }

    pub fn name(&self) -> BotanResult<String> {
        let name = ffi::library()?.botan_block_cipher_name()?;
        negotiate_string(|out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes.
            unsafe { name(self.handle.as_ptr(), out, out_len) }
        })
    }

    pub fn key_spec(&self) -> BotanResult<KeySpec> {
        let get_keyspec = ffi::library()?.botan_block_cipher_get_keyspec()?;
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

fn bc_set_key(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(bc.set_key(get_bytes(args, 0)?)?.into())
}

fn bc_encrypt(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(bc.encrypt_blocks(get_bytes(args, 0)?)?.into())
}

fn bc_decrypt(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(bc.decrypt_blocks(get_bytes(args, 0)?)?.into())
}

fn bc_clear(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(bc.clear()?.into())
}

fn bc_name(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(bc.name()?.into())
}

fn bc_block_size(bc: &mut BlockCipher, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(bc.block_size()?.into())
}

impl Dispatch for BlockCipher {
    const KIND: &'static str = "block_cipher";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<BlockCipher>)] = &[
            ("set-key", bc_set_key),
            ("encrypt", bc_encrypt),
            ("decrypt", bc_decrypt),
            ("clear", bc_clear),
            ("name", bc_name),
            ("block-size", bc_block_size),
        ];
        METHODS
    }
}
