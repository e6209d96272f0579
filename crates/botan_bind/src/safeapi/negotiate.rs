// Copyright (C) Microsoft Corporation. All rights reserved.

//! Retrieval of native outputs whose length the caller does not know.
//!
//! Two protocols exist. Fill-style calls take `(out, &mut out_len)`; when the
//! buffer is too small they store the required length in `out_len` and
//! return `InsufficientBufferSpace`. View-style calls push the finished
//! result into a callback once.

use std::ffi::c_char;
use std::ffi::c_int;
use std::ptr::null_mut;
use std::slice;

use crate::ffi::ViewBinFn;
use crate::ffi::ViewCtx;
use crate::ffi::ViewStrFn;
use crate::safeapi::error::check;
use crate::safeapi::error::on_unwind_abort;
use crate::safeapi::error::BotanError;
use crate::safeapi::error::BotanResult;
use crate::safeapi::error::ErrorKind;

const INSUFFICIENT_BUFFER_SPACE: c_int = ErrorKind::InsufficientBufferSpace.code();

/// Size query, then fill.
///
/// `fill` is called first with a null buffer of length zero. If the native
/// side asks for more room, a buffer of exactly the reported length is
/// allocated and `fill` runs once more. A failure of that second call is
/// returned as is; it is never retried.
pub fn negotiate<F>(mut fill: F) -> BotanResult<Vec<u8>>
where
    F: FnMut(*mut u8, *mut usize) -> c_int,
{
    let mut required = 0usize;
    match fill(null_mut(), &mut required) {
        0 => return Ok(Vec::new()),
        INSUFFICIENT_BUFFER_SPACE => {}
        rc => return Err(BotanError::Ffi(ErrorKind::translate(rc))),
    }

    tracing::trace!(required, "size query reported output length");
    fill_exact(required, fill)
}

/// [`negotiate`] for NUL-terminated text.
pub fn negotiate_string<F>(fill: F) -> BotanResult<String>
where
    F: FnMut(*mut c_char, *mut usize) -> c_int,
{
    let mut fill = fill;
    let bytes = negotiate(|out, len| fill(out.cast(), len))?;
    into_string(bytes)
}

/// Fills a buffer of exactly `len` bytes. The native side may report fewer
/// bytes written, in which case the result is truncated.
pub fn fill_exact<F>(len: usize, mut fill: F) -> BotanResult<Vec<u8>>
where
    F: FnMut(*mut u8, *mut usize) -> c_int,
{
    let mut out = vec![0u8; len];
    let mut written = len;
    check(fill(out.as_mut_ptr(), &mut written))?;
    out.truncate(written);
    Ok(out)
}

/// Fills at most `capacity` bytes in a single native call.
///
/// For calls that consume state or randomness (signing, encryption, cipher
/// updates, SRP-6 steps). Such a call is never repeated: an output larger
/// than `capacity` fails with `InsufficientBufferSpace` and the native object
/// is left in whatever state the failed call produced.
pub fn fill_bounded<F>(capacity: usize, fill: F) -> BotanResult<Vec<u8>>
where
    F: FnOnce(*mut u8, *mut usize) -> c_int,
{
    let mut out = vec![0u8; capacity];
    let mut written = capacity;
    let rc = fill(out.as_mut_ptr(), &mut written);

    if rc == INSUFFICIENT_BUFFER_SPACE {
        tracing::debug!(capacity, required = written, "bounded output overflowed");
    }

    check(rc)?;
    out.truncate(written);
    Ok(out)
}

fn into_string(mut bytes: Vec<u8>) -> BotanResult<String> {
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    let text = std::str::from_utf8(&bytes)?;
    Ok(text.to_owned())
}

extern "C" fn copy_bin(ctx: ViewCtx, data: *const u8, len: usize) -> c_int {
    on_unwind_abort(|| {
        if ctx.is_null() || (data.is_null() && len > 0) {
            return ErrorKind::NullPointer.code();
        }

        // SAFETY: `ctx` is the sink passed by `view_bytes`/`view_string`, which
        // outlives the native call that invokes this callback.
        let sink = unsafe { &mut *ctx.cast::<Option<Vec<u8>>>() };
        let copied = if len == 0 {
            Vec::new()
        } else {
            // SAFETY: the native side guarantees `len` readable bytes at `data`
            // for the duration of the callback.
            unsafe { slice::from_raw_parts(data, len) }.to_vec()
        };
        *sink = Some(copied);
        0
    })
}

extern "C" fn copy_str(ctx: ViewCtx, data: *const c_char, len: usize) -> c_int {
    copy_bin(ctx, data.cast(), len)
}

/// Push-style retrieval of binary data.
pub fn view_bytes<F>(call: F) -> BotanResult<Vec<u8>>
where
    F: FnOnce(ViewCtx, ViewBinFn) -> c_int,
{
    let mut sink: Option<Vec<u8>> = None;
    let ctx: ViewCtx = (&mut sink as *mut Option<Vec<u8>>).cast();
    check(call(ctx, copy_bin))?;
    sink.ok_or(BotanError::ViewNotInvoked)
}

/// Push-style retrieval of text. The pushed length counts the trailing NUL.
pub fn view_string<F>(call: F) -> BotanResult<String>
where
    F: FnOnce(ViewCtx, ViewStrFn) -> c_int,
{
    let mut sink: Option<Vec<u8>> = None;
    let ctx: ViewCtx = (&mut sink as *mut Option<Vec<u8>>).cast();
    check(call(ctx, copy_str))?;
    into_string(sink.ok_or(BotanError::ViewNotInvoked)?)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::cell::RefCell;

    use super::*;

    /// Mimics the native writer: stores the required length, then either
    /// copies or reports that the buffer is too small.
    fn fake_write(payload: &[u8], out: *mut u8, out_len: *mut usize) -> c_int {
        // SAFETY: callers pass a valid length pointer.
        let available = unsafe { *out_len };
        unsafe { *out_len = payload.len() };
        if available < payload.len() {
            return INSUFFICIENT_BUFFER_SPACE;
        }
        if !payload.is_empty() {
            // SAFETY: `out` has at least `available >= payload.len()` bytes.
            unsafe { std::ptr::copy_nonoverlapping(payload.as_ptr(), out, payload.len()) };
        }
        0
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_size_query_then_fill_yields_exact_length() {
        for len in [1usize, 2, 31, 32, 33, 4096] {
            let data = payload(len);
            let calls = Cell::new(0);
            let out = negotiate(|out, out_len| {
                calls.set(calls.get() + 1);
                fake_write(&data, out, out_len)
            })
            .expect("negotiate");
            assert_eq!(out, data);
            assert_eq!(calls.get(), 2);
        }
    }

    #[test]
    fn test_empty_output_needs_no_fill() {
        let out = negotiate(|out, out_len| fake_write(&[], out, out_len)).expect("negotiate");
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_buffer_fails() {
        let data = payload(48);
        let exact = fill_exact(48, |out, out_len| fake_write(&data, out, out_len)).expect("fill");
        assert_eq!(exact, data);

        let short = fill_exact(47, |out, out_len| fake_write(&data, out, out_len));
        assert_eq!(short, Err(BotanError::Ffi(ErrorKind::InsufficientBufferSpace)));
    }

    #[test]
    fn test_growth_between_query_and_fill_is_reported() {
        // The source grows after the size query, so the fill sees a short buffer.
        let calls = Cell::new(0usize);
        let result = negotiate(|out, out_len| {
            calls.set(calls.get() + 1);
            fake_write(&payload(10 * calls.get()), out, out_len)
        });
        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::InsufficientBufferSpace)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_size_query_error_is_translated() {
        let result = negotiate(|_, _| ErrorKind::InvalidObject.code());
        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::InvalidObject)));
    }

    #[test]
    fn test_negotiate_string_strips_terminator() {
        let name = b"SHA-256\0";
        let text = negotiate_string(|out, out_len| fake_write(name, out.cast(), out_len)).expect("string");
        assert_eq!(text, "SHA-256");
    }

    #[test]
    fn test_negotiate_string_rejects_invalid_utf8() {
        let bad = [0xffu8, 0xfe, 0];
        let err = negotiate_string(|out, out_len| fake_write(&bad, out.cast(), out_len))
            .err()
            .expect("invalid utf-8");
        assert_eq!(err.kind(), ErrorKind::StringConversionError);
    }

    #[test]
    fn test_bounded_fill_truncates_to_written() {
        let data = payload(100);
        let out = fill_bounded(128, |out, out_len| fake_write(&data, out, out_len)).expect("fill");
        assert_eq!(out, data);

        let small = fill_bounded(256, |out, out_len| fake_write(&data[..5], out, out_len)).expect("fill");
        assert_eq!(small, &data[..5]);
    }

    #[test]
    fn test_bounded_fill_never_repeats_a_consuming_call() {
        // Behaves like a signer: every call takes the buffered message, then
        // reports the signature length it needs.
        let pending = RefCell::new(b"message to sign".to_vec());
        let calls = Cell::new(0usize);
        let result = fill_bounded(4, |out, out_len| {
            calls.set(calls.get() + 1);
            let message = std::mem::take(&mut *pending.borrow_mut());
            let mut signature = b"SIG-OF-".to_vec();
            signature.extend_from_slice(if message.is_empty() { b"EMPTY-MSG-XX" } else { &message });
            fake_write(&signature, out, out_len)
        });

        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::InsufficientBufferSpace)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_view_copies_pushed_bytes() {
        let data = payload(77);
        let out = view_bytes(|ctx, cb| cb(ctx, data.as_ptr(), data.len())).expect("view");
        assert_eq!(out, data);
    }

    #[test]
    fn test_view_string_counts_terminator() {
        let text = b"-----BEGIN CERTIFICATE-----\0";
        let out = view_string(|ctx, cb| cb(ctx, text.as_ptr().cast(), text.len())).expect("view");
        assert_eq!(out, "-----BEGIN CERTIFICATE-----");
    }

    #[test]
    fn test_view_not_invoked() {
        assert_eq!(view_bytes(|_, _| 0), Err(BotanError::ViewNotInvoked));
    }

    #[test]
    fn test_view_native_error_wins() {
        let result = view_bytes(|ctx, cb| {
            cb(ctx, [1u8].as_ptr(), 1);
            ErrorKind::BadFlag.code()
        });
        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::BadFlag)));
    }

    #[test]
    fn test_view_rejects_null_data() {
        let mut callback_rc = 0;
        let result = view_bytes(|ctx, cb| {
            callback_rc = cb(ctx, std::ptr::null(), 4);
            callback_rc
        });
        assert_eq!(callback_rc, ErrorKind::NullPointer.code());
        assert_eq!(result, Err(BotanError::Ffi(ErrorKind::NullPointer)));
    }
}
