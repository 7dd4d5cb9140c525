//! # crossfire-log
//!
//! Thin logging facade used across CrossFire. Components log through the
//! re-exported `tracing` macros; binaries and tests pick an output setup once
//! with one of the `init*` functions.
//!
//! ## Quick Start
//!
//! ```rust
//! use crossfire_log::prelude::*;
//!
//! fn main() -> LogResult<()> {
//!     let _guard = crossfire_log::auto_init()?;
//!
//!     info!(capacity = 4096, "allocator ready");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;
mod error;

// Public API
pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, Format, Level, Writer};
pub use error::{LogError, LogResult};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Config, Level, LogResult, auto_init, debug, error, info, init, init_with, trace, warn,
    };
}

// Re-export tracing macros
pub use tracing::{debug, error, info, span, trace, warn};

/// Auto-detect and initialize the best logging configuration
///
/// An explicit `CROSSFIRE_LOG` / `RUST_LOG` wins; otherwise debug builds get
/// [`Config::development`] and release builds [`Config::production`].
pub fn auto_init() -> LogResult<LoggerGuard> {
    if std::env::var_os("CROSSFIRE_LOG").is_some() || std::env::var_os("RUST_LOG").is_some() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with default configuration
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with custom configuration
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Initialize for tests
///
/// Output goes through the libtest capture. Safe to call from every test:
/// once any global subscriber exists this returns a no-op guard.
pub fn init_test() -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }
    match init_with(Config::test()) {
        // Another test thread won the race.
        Err(LogError::AlreadyInitialized) => Ok(LoggerGuard::noop()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_test_is_idempotent() {
        let first = init_test();
        let second = init_test();
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert!(!second.unwrap().is_active());
    }
}
