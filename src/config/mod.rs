//! Analyzer Configuration Module
//!
//! Provides the tunable analysis parameters loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `WIND_ANALYZER_CONFIG` environment variable (path to TOML file)
//! 2. `analyzer_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Binaries call `config::init()` once at startup and read it back with
//! `config::get()`. Library functions take the config as an argument so they
//! can be exercised without global state.
//!
//! ```ignore
//! config::init(AnalyzerConfig::load());
//! let lags = config::get().autocorrelation.correlation_length;
//! ```

mod analyzer_config;
pub mod defaults;
pub mod validation;

pub use analyzer_config::*;

use std::sync::OnceLock;

/// Global analyzer configuration, initialized once at startup.
static ANALYZER_CONFIG: OnceLock<AnalyzerConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored.
pub fn init(config: AnalyzerConfig) {
    if ANALYZER_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration, or the built-in defaults if `init()` was
/// never called.
pub fn get() -> &'static AnalyzerConfig {
    if !is_initialized() {
        tracing::debug!("config::get() before init(), using built-in defaults");
    }
    ANALYZER_CONFIG.get_or_init(AnalyzerConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ANALYZER_CONFIG.get().is_some()
}
