// Copyright (C) Microsoft Corporation. All rights reserved.

//! X.509 certificates, revocation lists and path validation.

pub mod cert;
pub mod crl;
pub mod verify;

pub use cert::KeyUsage;
pub use cert::X509Cert;
pub use crl::X509Crl;
pub use verify::ValidationStatus;
pub use verify::VerifyOptions;
