// Copyright (C) Microsoft Corporation. All rights reserved.

//! Safe bindings over the C ABI of the Botan 3 cryptography library.
//!
//! The native library is loaded at runtime (see [`ffi`]). Every native object
//! is owned by exactly one Rust value and released when that value is
//! dropped; outputs of unknown length are retrieved through the negotiation
//! helpers in [`safeapi::negotiate`]; native status codes surface as
//! [`BotanError`] values carrying the native symbolic error name.

pub mod ffi;
pub mod safeapi;

pub use safeapi::error::BotanError;
pub use safeapi::error::BotanResult;
pub use safeapi::error::ErrorKind;
pub use safeapi::handle::ManagedHandle;
