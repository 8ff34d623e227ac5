//! # tron-settings
//!
//! Configuration management with layered sources for the Tron agent.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`TronSettings::default()`]
//! 2. **User file** — `~/.tron/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `TRON_*` overrides (highest priority)
//!
//! `~/.tron/settings.json` is the source of truth for persisted overrides.
//!
//! # Usage
//!
//! ```no_run
//! use tron_settings::{get_settings, TronSettings};
//!
//! let settings = get_settings();
//! println!("max turns: {}", settings.agent.max_turns);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. The settings are loaded
/// from `~/.tron/settings.json` with env var overrides, or fall back to
/// compiled defaults if loading fails.
static SETTINGS: OnceLock<TronSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.tron/settings.json` with env var
/// overrides. On subsequent calls, returns the cached value. If loading
/// fails, returns compiled defaults.
pub fn get_settings() -> &'static TronSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// Returns `Ok(())` if the settings were set, or `Err(settings)` if
/// they were already initialized.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: TronSettings) -> std::result::Result<(), TronSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
