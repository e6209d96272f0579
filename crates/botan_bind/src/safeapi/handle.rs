// Copyright (C) Microsoft Corporation. All rights reserved.

//! Exclusive ownership of one native object.
//!
//! A [`ManagedHandle`] pairs a native object pointer with the destructor that
//! releases it. The destructor runs exactly once: either through
//! [`ManagedHandle::destroy`], which consumes the handle, or from `Drop`.
//! Because `destroy` takes the handle by value, a second release of the same
//! handle does not compile:
//!
//! ```compile_fail
//! use botan_bind::safeapi::handle::ManagedHandle;
//!
//! fn release_twice(handle: ManagedHandle) {
//!     let _ = handle.destroy();
//!     let _ = handle.destroy();
//! }
//! ```
//!
//! Handles are `Send` but not `Sync`: a handle may move between threads, but
//! shared use of one native object from several threads needs an external
//! lock such as `parking_lot::Mutex`.

use std::cmp::Ordering;
use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::null_mut;
use std::ptr::NonNull;

use crate::botan_log;
use crate::ffi::Destructor;
use crate::ffi::RawObject;
use crate::safeapi::error::check;
use crate::safeapi::error::BotanError;
use crate::safeapi::error::BotanResult;
use crate::safeapi::error::ErrorKind;

pub struct ManagedHandle {
    raw: NonNull<std::ffi::c_void>,
    destructor: Destructor,
    kind: &'static str,
    // Opts out of the auto `Sync` impl.
    _not_sync: PhantomData<std::cell::Cell<()>>,
}

// SAFETY: native objects carry no thread affinity; exclusive ownership moves
// with the handle.
unsafe impl Send for ManagedHandle {}

impl ManagedHandle {
    /// Takes ownership of an existing native object.
    ///
    /// # Safety
    ///
    /// `raw` must be a live object created by the native library, not owned
    /// by anything else, and `destructor` must be the matching release
    /// function for its type.
    pub unsafe fn wrap(kind: &'static str, raw: RawObject, destructor: Destructor) -> BotanResult<Self> {
        let raw = NonNull::new(raw).ok_or(BotanError::Ffi(ErrorKind::NullPointer))?;
        tracing::trace!(kind, ptr = ?raw, "handle acquired");
        Ok(Self {
            raw,
            destructor,
            kind,
            _not_sync: PhantomData,
        })
    }

    /// Runs a native constructor that writes the new object through its
    /// out-parameter. If the constructor fails after writing an object, that
    /// object is released before the error is returned.
    pub fn construct<F>(kind: &'static str, destructor: Destructor, ctor: F) -> BotanResult<Self>
    where
        F: FnOnce(*mut RawObject) -> c_int,
    {
        let mut raw: RawObject = null_mut();
        let rc = ctor(&mut raw);

        if let Err(err) = check(rc) {
            if !raw.is_null() {
                // SAFETY: the constructor produced `raw`; nothing else owns it.
                let release_rc = unsafe { destructor(raw) };
                tracing::debug!(kind, release_rc, "released partially constructed object");
            }
            botan_log!(err, tracing::Level::DEBUG, "constructing {kind} failed");
            return Err(err);
        }

        // SAFETY: the constructor reported success and handed over ownership.
        unsafe { Self::wrap(kind, raw, destructor) }
    }

    /// Releases the native object now, reporting the destructor's status.
    pub fn destroy(self) -> BotanResult<()> {
        let this = ManuallyDrop::new(self);
        tracing::trace!(kind = this.kind, ptr = ?this.raw, "handle destroyed");
        // SAFETY: `this` is never dropped, so this is the only release.
        check(unsafe { (this.destructor)(this.raw.as_ptr()) })
    }

    pub fn as_ptr(&self) -> RawObject {
        self.raw.as_ptr()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Drop for ManagedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle owns the object and this is its only release.
        let rc = unsafe { (self.destructor)(self.raw.as_ptr()) };
        tracing::trace!(kind = self.kind, ptr = ?self.raw, "handle dropped");

        if let Err(err) = check(rc) {
            botan_log!(err, tracing::Level::ERROR, "destructor for {} failed", self.kind);
            if !std::thread::panicking() {
                panic!("destructor for {} failed: {err}", self.kind);
            }
        }
    }
}

impl fmt::Debug for ManagedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedHandle")
            .field("kind", &self.kind)
            .field("ptr", &self.raw)
            .finish()
    }
}

/// Typed wrappers that own a [`ManagedHandle`].
pub trait AsHandle {
    fn handle(&self) -> &ManagedHandle;

    fn as_ptr(&self) -> RawObject {
        self.handle().as_ptr()
    }
}

/// Native three-way comparison.
pub trait NativeOrd {
    fn native_cmp(&self, other: &Self) -> BotanResult<Ordering>;
}

/// Converts a native `-1/0/1` comparison result.
pub(crate) fn ordering_from(result: c_int) -> Ordering {
    result.cmp(&0)
}

/// Native textual rendering.
pub trait NativeDisplay {
    fn render(&self) -> BotanResult<String>;
}

/// Derives `PartialEq`, `Eq`, `PartialOrd` and `Ord` from [`NativeOrd`].
///
/// A failing native comparison only happens for an invalid handle, which the
/// typed wrappers never produce, so it panics. Code that must not panic, such
/// as the dispatch tables, calls [`NativeOrd::native_cmp`] directly.
macro_rules! impl_native_ord {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == ::std::cmp::Ordering::Equal
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                match $crate::safeapi::handle::NativeOrd::native_cmp(self, other) {
                    Ok(ordering) => ordering,
                    Err(err) => panic!("native compare of {} failed: {err}", stringify!($ty)),
                }
            }
        }
    };
}

/// Derives `Display` and `Debug` from [`NativeDisplay`].
macro_rules! impl_native_display {
    ($ty:ty) => {
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match $crate::safeapi::handle::NativeDisplay::render(self) {
                    Ok(text) => f.write_str(&text),
                    Err(err) => write!(f, "<{}: {err}>", stringify!($ty)),
                }
            }
        }

        impl ::std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($ty), self)
            }
        }
    };
}

pub(crate) use impl_native_display;
pub(crate) use impl_native_ord;
