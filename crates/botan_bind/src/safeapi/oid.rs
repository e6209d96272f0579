// Copyright (C) Microsoft Corporation. All rights reserved.

use std::cmp::Ordering;
use std::ffi::c_int;
use std::ffi::CString;

use crate::ffi;
use crate::safeapi::error::*;
use crate::safeapi::handle::impl_native_display;
use crate::safeapi::handle::impl_native_ord;
use crate::safeapi::handle::ordering_from;
use crate::safeapi::handle::AsHandle;
use crate::safeapi::handle::ManagedHandle;
use crate::safeapi::handle::NativeDisplay;
use crate::safeapi::handle::NativeOrd;
use crate::safeapi::negotiate::view_string;

/// ASN.1 object identifier.
pub struct Oid {
    handle: ManagedHandle,
}

impl AsHandle for Oid {
    fn handle(&self) -> &ManagedHandle {
        &self.handle
    }
}

impl Oid {
    /// Parses a dotted string (`1.2.840.113549`) or a registered name
    /// (`RSA`).
    pub fn from_string(text: &str) -> BotanResult<Self> {
        let text = CString::new(text)?;
        let lib = ffi::library()?;
        let from_string = lib.botan_oid_from_string()?;

        let handle = ManagedHandle::construct("oid", lib.botan_oid_destroy()?, |out| {
            // SAFETY: `text` is NUL-terminated.
            unsafe { from_string(out, text.as_ptr()) }
        })?;
        Ok(Self { handle })
    }

    pub(crate) fn construct(ctor: impl FnOnce(*mut ffi::RawObject) -> c_int) -> BotanResult<Self> {
        let handle = ManagedHandle::construct("oid", ffi::library()?.botan_oid_destroy()?, ctor)?;
        Ok(Self { handle })
    }

    /// Adds a process-wide name for this identifier.
    pub fn register(&self, name: &str) -> BotanResult<()> {
        let name = CString::new(name)?;
        let register = ffi::library()?.botan_oid_register()?;
        // SAFETY: `name` is NUL-terminated.
        check(unsafe { register(self.handle.as_ptr(), name.as_ptr()) })
    }

    pub fn to_dotted_string(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_oid_view_string()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }

    /// Registered name, or the dotted form when none is known.
    pub fn name(&self) -> BotanResult<String> {
        let view = ffi::library()?.botan_oid_view_name()?;
        view_string(|ctx, callback| {
            // SAFETY: `ctx` and `callback` come from `view_string`.
            unsafe { view(self.handle.as_ptr(), ctx, callback) }
        })
    }
}

impl NativeOrd for Oid {
    fn native_cmp(&self, other: &Self) -> BotanResult<Ordering> {
        let cmp = ffi::library()?.botan_oid_cmp()?;
        let mut result: c_int = 0;
        // SAFETY: both handles are live; `result` is a valid out-parameter.
        check(unsafe { cmp(&mut result, self.handle.as_ptr(), other.handle.as_ptr()) })?;
        Ok(ordering_from(result))
    }
}

impl NativeDisplay for Oid {
    fn render(&self) -> BotanResult<String> {
        self.to_dotted_string()
    }
}

impl_native_ord!(Oid);
impl_native_display!(Oid);
