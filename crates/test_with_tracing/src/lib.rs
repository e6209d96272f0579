// Copyright (C) Microsoft Corporation. All rights reserved.

//! Test attribute that routes `tracing` output of the code under test
//! into the libtest capture buffer.

// Only test code depends on this crate; `expect` is allowed here (but not `unwrap`).
#![allow(clippy::expect_used)]

#[cfg(test)]
extern crate self as test_with_tracing;

pub use test_with_tracing_macro::test;
use tracing::metadata::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Environment variable holding a `Targets` directive such as
/// `botan_bind=trace,warn`. Falls back to `RUST_LOG` when unset.
pub const LOG_ENV: &str = "BOTAN_BIND_TEST_LOG";

fn targets() -> Targets {
    let directive = std::env::var(LOG_ENV).or_else(|_| std::env::var("RUST_LOG"));
    match directive {
        Ok(var) => var
            .parse()
            .expect("Failed to parse test log directive"),
        Err(_) => Targets::new().with_default(LevelFilter::DEBUG),
    }
}

#[doc(hidden)]
/// Installs the global subscriber once per test binary.
pub fn init() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .pretty()
            .with_ansi(false)
            .log_internal_errors(true)
            .with_test_writer()
            .with_max_level(LevelFilter::TRACE)
            .with_thread_ids(true)
            .finish()
            .with(targets())
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::test;

    #[test]
    fn test_emits_event() {
        tracing::info!(target: "botan_bind", "subscriber installed");
    }

    #[test]
    fn test_init_is_idempotent() {
        super::init();
        super::init();
        tracing::debug!("still one subscriber");
    }

    #[test]
    fn test_with_return() -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("ok");
        Ok(())
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_attributes_are_kept() {
        panic!("boom");
    }
}
