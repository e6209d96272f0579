// Copyright (C) Microsoft Corporation. All rights reserved.

#![allow(dead_code)]

use std::path::PathBuf;

use botan_bind::ffi;

/// Far inside the validity window of every fixture (2096).
pub const REFERENCE_TIME: u64 = 4_000_000_000;

/// Before any fixture becomes valid (1998).
pub const BEFORE_VALIDITY: u64 = 900_000_000;

pub fn native_available() -> bool {
    if ffi::is_available() {
        true
    } else {
        tracing::warn!("native Botan library not found; skipping");
        false
    }
}

/// Returns from the calling test when the native library cannot be loaded.
macro_rules! require_native {
    () => {
        if !common::native_available() {
            return;
        }
    };
}

pub fn symbol_available(present: impl FnOnce(&ffi::BotanFfi) -> bool, symbol: &str) -> bool {
    match ffi::library() {
        Ok(lib) if present(lib) => true,
        _ => {
            tracing::warn!(symbol, "not exported by the loaded library; skipping");
            false
        }
    }
}

/// Like `require_native!`, and also returns when the loaded library is too
/// old to export `symbol`.
macro_rules! require_symbol {
    ($symbol:ident) => {
        require_native!();
        if !common::symbol_available(|lib| lib.$symbol().is_ok(), stringify!($symbol)) {
            return;
        }
    };
}

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    let path = data_path(name);
    std::fs::read(&path).unwrap_or_else(|err| panic!("reading {}: {err}", path.display()))
}

pub fn hex(text: &str) -> Vec<u8> {
    assert!(text.len() % 2 == 0, "odd hex length");
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).expect("hex digit"))
        .collect()
}
