// Copyright (C) Microsoft Corporation. All rights reserved.

pub mod block_cipher;
pub mod cipher;
pub mod dispatch;
pub mod ec_group;
pub mod error;
pub mod fpe;
pub mod handle;
pub mod hash;
pub mod kdf;
pub mod key_wrap;
pub mod mac;
pub mod mpi;
pub mod negotiate;
pub mod oid;
pub mod otp;
pub mod pk_op;
pub mod privkey;
pub mod pubkey;
pub mod rng;
pub mod srp6;
pub mod utility;
pub mod version;
pub mod x509;
pub mod zfec;
