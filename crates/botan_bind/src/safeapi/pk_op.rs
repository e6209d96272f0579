// Copyright (C) Microsoft Corporation. All rights reserved.

//! Public key operations.
//!
//! Each operation object borrows the key it was created from, so the key
//! outlives every native operation that refers to it.
//!
//! Signing, encryption and key encapsulation consume randomness and are not
//! repeatable, so their outputs are sized from the native length query up
//! front and filled in a single native call.
//!
//! The KEM operations own their key instead of borrowing it, which lets them
//! carry a dispatch table like the other handle kinds.

use std::ffi::CString;
use std::marker::PhantomData;

use crate::ffi;
use crate::safeapi::dispatch::*;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::negotiate::fill_bounded;
use crate::safeapi::negotiate::view_bytes;
use crate::safeapi::privkey::PrivateKey;
use crate::safeapi::pubkey::PublicKey;
use crate::safeapi::rng;
use crate::safeapi::rng::Rng;

#[derive(Debug)]
pub struct Signer<'a> {
    handle: ManagedHandle,
    _key: PhantomData<&'a PrivateKey>,
}

impl AsHandle for Signer<'_> {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl<'a> Signer<'a> {
    /// `padding` names the hash and padding scheme, e.g. `PSS(SHA-256)` for
    /// RSA or `SHA-256` for ECDSA.
    pub fn new(key: &'a PrivateKey, padding: &str) -> BotanResult<Self> {
        let padding = CString::new(padding)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_sign_create()?;

        let handle = ManagedHandle::construct("pk_op_sign", lib.botan_pk_op_sign_destroy()?, |out| {
            // SAFETY: `key` is live; `padding` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), padding.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            _key: PhantomData,
        })
    }

    pub fn update(&mut self, data: &[u8]) -> BotanResult<()> {
        let update = ffi::library()?.botan_pk_op_sign_update()?;
        // SAFETY: `data` is readable for its full length.
        check(unsafe { update(self.handle.as_ptr(), data.as_ptr(), data.len()) })
    }

    /// Signs everything passed to `update` since the last `finish`.
    pub fn finish(&mut self, rng: &Rng) -> BotanResult<Vec<u8>> {
        let lib = ffi::library()?;
        let output_length = lib.botan_pk_op_sign_output_length()?;
        let finish = lib.botan_pk_op_sign_finish()?;

        let mut capacity = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), &mut capacity) })?;

        fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes; `rng` is live.
            unsafe { finish(self.handle.as_ptr(), rng.as_ptr(), out, out_len) }
        })
    }
}

#[derive(Debug)]
pub struct Verifier<'a> {
    handle: ManagedHandle,
    _key: PhantomData<&'a PublicKey>,
}

impl AsHandle for Verifier<'_> {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl<'a> Verifier<'a> {
    pub fn new(key: &'a PublicKey, padding: &str) -> BotanResult<Self> {
        let padding = CString::new(padding)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_verify_create()?;

        let handle = ManagedHandle::construct("pk_op_verify", lib.botan_pk_op_verify_destroy()?, |out| {
            // SAFETY: `key` is live; `padding` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), padding.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            _key: PhantomData,
        })
    }

    pub fn update(&mut self, data: &[u8]) -> BotanResult<()> {
        let update = ffi::library()?.botan_pk_op_verify_update()?;
        // SAFETY: `data` is readable for its full length.
        check(unsafe { update(self.handle.as_ptr(), data.as_ptr(), data.len()) })
    }

    /// `Ok(false)` for a well-formed but wrong signature.
    pub fn finish(&mut self, signature: &[u8]) -> BotanResult<bool> {
        let finish = ffi::library()?.botan_pk_op_verify_finish()?;
        // SAFETY: `signature` is readable for its full length.
        Predicate::SIGNATURE_VALID.eval(unsafe { finish(self.handle.as_ptr(), signature.as_ptr(), signature.len()) })
    }
}

#[derive(Debug)]
pub struct Encryptor<'a> {
    handle: ManagedHandle,
    _key: PhantomData<&'a PublicKey>,
}

impl AsHandle for Encryptor<'_> {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl<'a> Encryptor<'a> {
    /// `padding` e.g. `OAEP(SHA-256)`.
    pub fn new(key: &'a PublicKey, padding: &str) -> BotanResult<Self> {
        let padding = CString::new(padding)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_encrypt_create()?;

        let handle = ManagedHandle::construct("pk_op_encrypt", lib.botan_pk_op_encrypt_destroy()?, |out| {
            // SAFETY: `key` is live; `padding` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), padding.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            _key: PhantomData,
        })
    }

    pub fn encrypt(&mut self, rng: &Rng, plaintext: &[u8]) -> BotanResult<Vec<u8>> {
        let lib = ffi::library()?;
        let output_length = lib.botan_pk_op_encrypt_output_length()?;
        let encrypt = lib.botan_pk_op_encrypt()?;

        let mut capacity = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), plaintext.len(), &mut capacity) })?;

        fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes; `plaintext` is readable.
            unsafe { encrypt(self.handle.as_ptr(), rng.as_ptr(), out, out_len, plaintext.as_ptr(), plaintext.len()) }
        })
    }
}

#[derive(Debug)]
pub struct Decryptor<'a> {
    handle: ManagedHandle,
    _key: PhantomData<&'a PrivateKey>,
}

impl AsHandle for Decryptor<'_> {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl<'a> Decryptor<'a> {
    pub fn new(key: &'a PrivateKey, padding: &str) -> BotanResult<Self> {
        let padding = CString::new(padding)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_decrypt_create()?;

        let handle = ManagedHandle::construct("pk_op_decrypt", lib.botan_pk_op_decrypt_destroy()?, |out| {
            // SAFETY: `key` is live; `padding` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), padding.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            _key: PhantomData,
        })
    }

    /// Fails with `InvalidInput` (or `BadMac` for authenticated schemes)
    /// when the ciphertext does not decrypt.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> BotanResult<Vec<u8>> {
        let lib = ffi::library()?;
        let output_length = lib.botan_pk_op_decrypt_output_length()?;
        let decrypt = lib.botan_pk_op_decrypt()?;

        let mut capacity = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { output_length(self.handle.as_ptr(), ciphertext.len(), &mut capacity) })?;

        fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes; `ciphertext` is readable.
            unsafe { decrypt(self.handle.as_ptr(), out, out_len, ciphertext.as_ptr(), ciphertext.len()) }
        })
    }
}

#[derive(Debug)]
pub struct KeyAgreement<'a> {
    handle: ManagedHandle,
    key: &'a PrivateKey,
}

impl AsHandle for KeyAgreement<'_> {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl<'a> KeyAgreement<'a> {
    /// `kdf` is applied to the shared secret; `Raw` returns it unchanged.
    pub fn new(key: &'a PrivateKey, kdf: &str) -> BotanResult<Self> {
        let kdf = CString::new(kdf)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_key_agreement_create()?;

        let handle = ManagedHandle::construct(
            "pk_op_key_agreement",
            lib.botan_pk_op_key_agreement_destroy()?,
            |out| {
                // SAFETY: `key` is live; `kdf` is NUL-terminated.
                unsafe { create(out, key.as_ptr(), kdf.as_ptr(), 0) }
            },
        )?;
        Ok(Self { handle, key })
    }

    /// The value to send to the peer.
    pub fn public_value(&self) -> BotanResult<Vec<u8>> {
        let view = ffi::library()?.botan_pk_op_key_agreement_view_public()?;
        view_bytes(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_bytes`.
            unsafe { view(self.key.as_ptr(), ctx, callback) }
        })
    }

    /// Derives `key_len` bytes from the peer's public value. With
    /// `key_len == 0` the natural agreement size is used.
    pub fn agree(&mut self, other: &[u8], key_len: usize, salt: &[u8]) -> BotanResult<Vec<u8>> {
        let lib = ffi::library()?;
        let agree = lib.botan_pk_op_key_agreement()?;

        let capacity = if key_len == 0 {
            let size = lib.botan_pk_op_key_agreement_size()?;
            let mut natural = 0usize;
            // SAFETY: valid out-parameter.
            check(unsafe { size(self.handle.as_ptr(), &mut natural) })?;
            natural
        } else {
            key_len
        };

        // The in-value of `out_len` is the requested key length.
        fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes; inputs are readable.
            unsafe {
                agree(
                    self.handle.as_ptr(),
                    out,
                    out_len,
                    other.as_ptr(),
                    other.len(),
                    salt.as_ptr(),
                    salt.len(),
                )
            }
        })
    }
}

/// Sender side of a key encapsulation.
#[derive(Debug)]
pub struct KemEncryptor {
    handle: ManagedHandle,
    key: PublicKey,
}

impl AsHandle for KemEncryptor {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl KemEncryptor {
    /// `kdf` derives the shared key from the encapsulated secret, e.g.
    /// `KDF2(SHA-256)`, or `Raw` for schemes such as ML-KEM.
    pub fn new(key: PublicKey, kdf: &str) -> BotanResult<Self> {
        let kdf = CString::new(kdf)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_kem_encrypt_create()?;

        let handle = ManagedHandle::construct("pk_op_kem_encrypt", lib.botan_pk_op_kem_encrypt_destroy()?, |out| {
            // SAFETY: `key` is live; `kdf` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), kdf.as_ptr()) }
        })?;
        Ok(Self { handle, key })
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    pub fn into_key(self) -> PublicKey {
        self.key
    }

    /// Length of the shared key produced for a requested length.
    pub fn shared_key_length(&self, desired_len: usize) -> BotanResult<usize> {
        let length = ffi::library()?.botan_pk_op_kem_encrypt_shared_key_length()?;
        let mut out_len = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { length(self.handle.as_ptr(), desired_len, &mut out_len) })?;
        Ok(out_len)
    }

    pub fn encapsulated_key_length(&self) -> BotanResult<usize> {
        let length = ffi::library()?.botan_pk_op_kem_encrypt_encapsulated_key_length()?;
        let mut out_len = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { length(self.handle.as_ptr(), &mut out_len) })?;
        Ok(out_len)
    }

    /// Returns the shared key and the encapsulated key to send to the owner
    /// of the private key.
    pub fn create_shared_key(&mut self, rng: &Rng, salt: &[u8], desired_len: usize) -> BotanResult<(Vec<u8>, Vec<u8>)> {
        let create = ffi::library()?.botan_pk_op_kem_encrypt_create_shared_key()?;
        let shared_capacity = self.shared_key_length(desired_len)?;
        let encapsulated_capacity = self.encapsulated_key_length()?;

        let mut shared = vec![0u8; shared_capacity];
        let mut shared_len = shared_capacity;
        let mut encapsulated = vec![0u8; encapsulated_capacity];
        let mut encapsulated_len = encapsulated_capacity;
        // SAFETY: both output buffers hold the lengths passed alongside them;
        // `salt` is readable; `rng` is live.
        check(unsafe {
            create(
                self.handle.as_ptr(),
                rng.as_ptr(),
                salt.as_ptr(),
                salt.len(),
                desired_len,
                shared.as_mut_ptr(),
                &mut shared_len,
                encapsulated.as_mut_ptr(),
                &mut encapsulated_len,
            )
        })?;
        shared.truncate(shared_len);
        encapsulated.truncate(encapsulated_len);
        Ok((shared, encapsulated))
    }
}

/// Receiver side of a key encapsulation.
#[derive(Debug)]
pub struct KemDecryptor {
    handle: ManagedHandle,
    key: PrivateKey,
}

impl AsHandle for KemDecryptor {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl KemDecryptor {
    /// `kdf` must match the sender's.
    pub fn new(key: PrivateKey, kdf: &str) -> BotanResult<Self> {
        let kdf = CString::new(kdf)?;
        let lib = ffi::library()?;
        let create = lib.botan_pk_op_kem_decrypt_create()?;

        let handle = ManagedHandle::construct("pk_op_kem_decrypt", lib.botan_pk_op_kem_decrypt_destroy()?, |out| {
            // SAFETY: `key` is live; `kdf` is NUL-terminated.
            unsafe { create(out, key.as_ptr(), kdf.as_ptr()) }
        })?;
        Ok(Self { handle, key })
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn into_key(self) -> PrivateKey {
        self.key
    }

    pub fn shared_key_length(&self, desired_len: usize) -> BotanResult<usize> {
        let length = ffi::library()?.botan_pk_op_kem_decrypt_shared_key_length()?;
        let mut out_len = 0usize;
        // SAFETY: valid out-parameter.
        check(unsafe { length(self.handle.as_ptr(), desired_len, &mut out_len) })?;
        Ok(out_len)
    }

    /// Recovers the shared key from an encapsulated key.
    pub fn decrypt_shared_key(&mut self, salt: &[u8], desired_len: usize, encapsulated: &[u8]) -> BotanResult<Vec<u8>> {
        let decrypt = ffi::library()?.botan_pk_op_kem_decrypt_shared_key()?;
        let capacity = self.shared_key_length(desired_len)?;

        fill_bounded(capacity, |out, out_len| {
            // SAFETY: `out` holds `*out_len` bytes; inputs are readable.
            unsafe {
                decrypt(
                    self.handle.as_ptr(),
                    salt.as_ptr(),
                    salt.len(),
                    encapsulated.as_ptr(),
                    encapsulated.len(),
                    desired_len,
                    out,
                    out_len,
                )
            }
        })
    }
}

fn kem_encrypt_shared_key_length(op: &mut KemEncryptor, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(op.shared_key_length(get_size(args, 0)?)?.into())
}

fn kem_encrypt_encapsulated_key_length(op: &mut KemEncryptor, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 0)?;
    Ok(op.encapsulated_key_length()?.into())
}

/// `salt desired-len [rng]`; the default RNG is used when none is given.
fn kem_encrypt_create_shared_key(op: &mut KemEncryptor, args: &[Arg<'_>]) -> BotanResult<Value> {
    arity(args, 2, 3)?;
    let salt = get_bytes(args, 0)?;
    let desired_len = get_size(args, 1)?;
    let (shared, encapsulated) = match args.get(2) {
        None | Some(Arg::Nil) => rng::with_default(|rng| op.create_shared_key(rng, salt, desired_len))?,
        Some(_) => op.create_shared_key(get_rng(args, 2)?, salt, desired_len)?,
    };
    Ok(Value::Tuple(vec![shared.into(), encapsulated.into()]))
}

impl Dispatch for KemEncryptor {
    const KIND: &'static str = "pk_op_kem_encrypt";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<KemEncryptor>)] = &[
            ("shared-key-length", kem_encrypt_shared_key_length),
            ("encapsulated-key-length", kem_encrypt_encapsulated_key_length),
            ("create-shared-key", kem_encrypt_create_shared_key),
        ];
        METHODS
    }
}

fn kem_decrypt_shared_key_length(op: &mut KemDecryptor, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 1)?;
    Ok(op.shared_key_length(get_size(args, 0)?)?.into())
}

/// `salt desired-len encapsulated-key`
fn kem_decrypt_shared_key(op: &mut KemDecryptor, args: &[Arg<'_>]) -> BotanResult<Value> {
    fixarity(args, 3)?;
    Ok(op
        .decrypt_shared_key(get_bytes(args, 0)?, get_size(args, 1)?, get_bytes(args, 2)?)?
        .into())
}

impl Dispatch for KemDecryptor {
    const KIND: &'static str = "pk_op_kem_decrypt";

    fn methods() -> &'static [(&'static str, Method<Self>)] {
        const METHODS: &[(&str, Method<KemDecryptor>)] = &[
            ("shared-key-length", kem_decrypt_shared_key_length),
            ("decrypt-shared-key", kem_decrypt_shared_key),
        ];
        METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kem_method_tables() {
        assert_eq!(
            KemEncryptor::method_names(),
            vec!["shared-key-length", "encapsulated-key-length", "create-shared-key"]
        );
        assert_eq!(KemDecryptor::method_names(), vec!["shared-key-length", "decrypt-shared-key"]);
        assert!(KemDecryptor::lookup("create-shared-key").is_none());
    }
}
