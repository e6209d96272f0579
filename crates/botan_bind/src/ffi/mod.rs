// Copyright (C) Microsoft Corporation. All rights reserved.

//! Runtime loading of the native Botan library.
//!
//! The library is opened with `libloading` the first time any wrapper needs
//! it, or explicitly through [`init`]. The resolved [`BotanFfi`] table lives
//! for the remainder of the process.

mod table;

use std::path::PathBuf;
use std::sync::OnceLock;

use libloading::Library;
pub use table::BotanFfi;
pub use table::Destructor;
pub use table::RawObject;
pub use table::ViewBinFn;
pub use table::ViewCtx;
pub use table::ViewStrFn;

use crate::safeapi::error::BotanError;
use crate::safeapi::error::BotanResult;

/// Environment variable naming an explicit library path.
pub const LIBRARY_PATH_ENV: &str = "BOTAN_LIBRARY_PATH";

/// Highest `libbotan-3.so.N` soname tried after the unversioned name.
const MAX_SONAME_MINOR: u32 = 15;

/// Where to find the native library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Explicit path. When `None`, the platform search path is used.
    pub path: Option<PathBuf>,
}

impl LibraryConfig {
    /// Builds a config from [`LIBRARY_PATH_ENV`]. An unset or empty variable
    /// leaves the path unset.
    pub fn from_env() -> Self {
        let path = std::env::var_os(LIBRARY_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { path }
    }

    /// Names tried in order when no explicit path is configured.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.path {
            return vec![path.clone()];
        }

        let mut names = vec![PathBuf::from(libloading::library_filename("botan-3"))];
        if cfg!(all(unix, not(target_os = "macos"))) {
            names.extend((0..=MAX_SONAME_MINOR).map(|minor| PathBuf::from(format!("libbotan-3.so.{minor}"))));
        }
        names
    }
}

static BOTAN: OnceLock<BotanResult<BotanFfi>> = OnceLock::new();

fn open(config: &LibraryConfig) -> BotanResult<BotanFfi> {
    let mut failures = Vec::new();

    for candidate in config.candidates() {
        // SAFETY: loading Botan runs only its static initializers, which have
        // no preconditions on the calling process.
        match unsafe { Library::new(&candidate) } {
            Ok(library) => {
                let table = BotanFfi::resolve(library);
                tracing::info!(
                    library = %candidate.display(),
                    symbols = table.resolved_count(),
                    "loaded native Botan library"
                );
                return Ok(table);
            }
            Err(err) => {
                tracing::trace!(library = %candidate.display(), error = %err, "candidate rejected");
                failures.push(format!("{}: {err}", candidate.display()));
            }
        }
    }

    tracing::warn!(attempts = failures.len(), "native Botan library not found");
    Err(BotanError::LibraryLoad(failures.join("; ")))
}

/// Loads the library using `config`. Fails with
/// [`BotanError::AlreadyInitialized`] once any load, explicit or implicit,
/// has already happened.
pub fn init(config: LibraryConfig) -> BotanResult<&'static BotanFfi> {
    let mut loaded_here = false;
    BOTAN.get_or_init(|| {
        loaded_here = true;
        open(&config)
    });

    if loaded_here {
        library()
    } else {
        Err(BotanError::AlreadyInitialized)
    }
}

/// The process-wide function table, loading it from the environment config
/// on first use.
pub fn library() -> BotanResult<&'static BotanFfi> {
    BOTAN
        .get_or_init(|| open(&LibraryConfig::from_env()))
        .as_ref()
        .map_err(Clone::clone)
}

/// Whether the native library could be loaded.
pub fn is_available() -> bool {
    library().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safeapi::error::ErrorKind;

    #[test]
    fn test_explicit_path_is_sole_candidate() {
        let config = LibraryConfig {
            path: Some(PathBuf::from("/opt/botan/lib/libbotan-3.so")),
        };
        assert_eq!(config.candidates(), vec![PathBuf::from("/opt/botan/lib/libbotan-3.so")]);
    }

    #[test]
    fn test_default_candidates_start_with_platform_name() {
        let candidates = LibraryConfig::default().candidates();
        assert_eq!(candidates[0], PathBuf::from(libloading::library_filename("botan-3")));
        if cfg!(target_os = "linux") {
            assert!(candidates.contains(&PathBuf::from("libbotan-3.so.0")));
            assert_eq!(candidates.len(), 2 + MAX_SONAME_MINOR as usize);
        }
    }

    #[test]
    fn test_missing_library_reports_every_attempt() {
        let config = LibraryConfig {
            path: Some(PathBuf::from("/nonexistent/libbotan-does-not-exist.so")),
        };
        match open(&config) {
            Err(BotanError::LibraryLoad(msg)) => assert!(msg.contains("libbotan-does-not-exist")),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("nonexistent library loaded"),
        }
    }

    #[test]
    fn test_absent_symbol_is_not_implemented() {
        let table = BotanFfi::empty();
        assert_eq!(table.resolved_count(), 0);
        let err = table.botan_hash_init().err().expect("symbol should be absent");
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_second_init_is_rejected() {
        // Whatever the first load produced, a later explicit init must refuse.
        let _ = library();
        assert!(matches!(
            init(LibraryConfig::default()),
            Err(BotanError::AlreadyInitialized)
        ));
    }
}
