// Copyright (C) Microsoft Corporation. All rights reserved.

//! SRP-6a password authenticated key exchange.
//!
//! Every output of the exchange is at most the size of the group modulus,
//! which is queried once and used as the buffer bound.

use std::ffi::CString;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::negotiate::fill_bounded;
use crate::safeapi::rng::Rng;

/// Size in bytes of the modulus of `group`, e.g. `modp/srp/2048`.
pub fn srp6_group_size(group: &str) -> BotanResult<usize> {
    let group = CString::new(group)?;
    let group_size = ffi::library()?.botan_srp6_group_size()?;
    let mut bytes = 0usize;
    // SAFETY: `group` is NUL-terminated; valid out-parameter.
    check(unsafe { group_size(group.as_ptr(), &mut bytes) })?;
    Ok(bytes)
}

/// The verifier a server stores for `identifier`.
pub fn srp6_generate_verifier(
    identifier: &str,
    password: &str,
    salt: &[u8],
    group: &str,
    hash: &str,
) -> BotanResult<Vec<u8>> {
    let identifier = CString::new(identifier)?;
    let password = CString::new(password)?;
    let group_name = CString::new(group)?;
    let hash = CString::new(hash)?;
    let capacity = srp6_group_size(group)?;
    let generate = ffi::library()?.botan_srp6_generate_verifier()?;

    fill_bounded(capacity, |out, out_len| {
        // SAFETY: strings are NUL-terminated; `out` holds `*out_len` bytes.
        unsafe {
            generate(
                identifier.as_ptr(),
                password.as_ptr(),
                salt.as_ptr(),
                salt.len(),
                group_name.as_ptr(),
                hash.as_ptr(),
                out,
                out_len,
            )
        }
    })
}

/// Client side of the exchange. Returns the client public value `A` and the
/// shared key `K`.
pub fn srp6_client_agree(
    username: &str,
    password: &str,
    group: &str,
    hash: &str,
    salt: &[u8],
    b_pub: &[u8],
    rng: &Rng,
) -> BotanResult<(Vec<u8>, Vec<u8>)> {
    let username = CString::new(username)?;
    let password = CString::new(password)?;
    let group_name = CString::new(group)?;
    let hash = CString::new(hash)?;
    let capacity = srp6_group_size(group)?;
    let agree = ffi::library()?.botan_srp6_client_agree()?;

    let mut a_pub = vec![0u8; capacity];
    let mut a_pub_len = capacity;
    let mut key = vec![0u8; capacity];
    let mut key_len = capacity;
    // SAFETY: strings are NUL-terminated; both output buffers hold
    // `capacity` bytes as stated by their lengths.
    check(unsafe {
        agree(
            username.as_ptr(),
            password.as_ptr(),
            group_name.as_ptr(),
            hash.as_ptr(),
            salt.as_ptr(),
            salt.len(),
            b_pub.as_ptr(),
            b_pub.len(),
            rng.as_ptr(),
            a_pub.as_mut_ptr(),
            &mut a_pub_len,
            key.as_mut_ptr(),
            &mut key_len,
        )
    })?;
    a_pub.truncate(a_pub_len);
    key.truncate(key_len);
    Ok((a_pub, key))
}

/// Server side state between the two steps of one exchange.
#[derive(Debug)]
pub struct Srp6ServerSession {
    handle: ManagedHandle,
    group: CString,
    group_size: usize,
}

impl AsHandle for Srp6ServerSession {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Srp6ServerSession {
    pub fn new(group: &str) -> BotanResult<Self> {
        let group_size = srp6_group_size(group)?;
        let group = CString::new(group)?;
        let lib = ffi::library()?;
        let init = lib.botan_srp6_server_session_init()?;

        let handle = ManagedHandle::construct("srp6_server_session", lib.botan_srp6_server_session_destroy()?, |out| {
            // SAFETY: valid out-parameter.
            unsafe { init(out) }
        })?;
        Ok(Self {
            handle,
            group,
            group_size,
        })
    }

    /// Returns the server public value `B` to send to the client.
    pub fn step1(&mut self, verifier: &[u8], hash: &str, rng: &Rng) -> BotanResult<Vec<u8>> {
        let hash = CString::new(hash)?;
        let step1 = ffi::library()?.botan_srp6_server_session_step1()?;
        fill_bounded(self.group_size, |out, out_len| {
            // SAFETY: strings are NUL-terminated; `out` holds `*out_len` bytes.
            unsafe {
                step1(
                    self.handle.as_ptr(),
                    verifier.as_ptr(),
                    verifier.len(),
                    self.group.as_ptr(),
                    hash.as_ptr(),
                    rng.as_ptr(),
                    out,
                    out_len,
                )
            }
        })
    }

    /// Consumes the client public value `A` and returns the shared key.
    pub fn step2(&mut self, a_pub: &[u8]) -> BotanResult<Vec<u8>> {
        let step2 = ffi::library()?.botan_srp6_server_session_step2()?;
        fill_bounded(self.group_size, |out, out_len| {
            // SAFETY: `a_pub` is readable; `out` holds `*out_len` bytes.
            unsafe { step2(self.handle.as_ptr(), a_pub.as_ptr(), a_pub.len(), out, out_len) }
        })
    }
}
