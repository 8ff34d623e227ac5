//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format. Each type implements [`Default`] with production default values.
//! Types marked with `#[serde(default)]` allow partial JSON — missing fields
//! get their default value during deserialization.

mod context;

pub use context::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the agent runtime.
///
/// Loaded from `~/.tron/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "name": "tron",
///   "agent": { "maxTurns": 50 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TronSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Default model selection.
    pub models: ModelSettings,
    /// Retry configuration for provider calls.
    pub retry: RetrySettings,
    /// Context management settings (compaction, memory, rules, tasks).
    pub context: ContextSettings,
    /// Agent runtime settings (max turns, nesting depth).
    pub agent: AgentRuntimeSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Hook system configuration.
    pub hooks: HookSettings,
    /// Session behavior settings.
    pub session: SessionSettings,
    /// Event store settings (SQLite path, FTS, blob threshold).
    pub store: StoreSettings,
}

impl Default for TronSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "tron".to_string(),
            models: ModelSettings::default(),
            retry: RetrySettings::default(),
            context: ContextSettings::default(),
            agent: AgentRuntimeSettings::default(),
            logging: LoggingSettings::default(),
            hooks: HookSettings::default(),
            session: SessionSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

/// Default model selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Default model for main conversations.
    #[serde(rename = "default")]
    pub default_model: String,
    /// Default model for subagent sessions.
    pub subagent: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_model: "claude-opus-4-6".to_string(),
            subagent: "claude-haiku-4-5-20251001".to_string(),
        }
    }
}

/// Retry configuration for provider calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter factor (0.0–1.0) applied to retry delays.
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        }
    }
}

/// Agent runtime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentRuntimeSettings {
    /// Maximum turns per run before the loop gives up.
    pub max_turns: u32,
    /// Maximum subagent nesting depth.
    pub subagent_max_depth: u32,
    /// Timeout for a single turn in milliseconds.
    pub turn_timeout_ms: u64,
}

impl Default for AgentRuntimeSettings {
    fn default() -> Self {
        Self {
            max_turns: 100,
            subagent_max_depth: 3,
            turn_timeout_ms: 300_000,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Tracing filter directive (e.g. `"info"`, `"tron=debug"`).
    pub level: String,
    /// Whether to also persist log events to SQLite.
    pub sqlite_sink: bool,
    /// Path to the log sink database file.
    pub sqlite_path: String,
    /// Emit logs as structured JSON instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            sqlite_sink: true,
            sqlite_path: "~/.tron/logs.db".to_string(),
            json: false,
        }
    }
}

/// Hook system configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HookSettings {
    /// Whether hooks are enabled at all.
    pub enabled: bool,
    /// Timeout for a single hook invocation in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
        }
    }
}

/// Session behavior settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Directory where session working trees are created.
    pub sessions_dir: String,
    /// Maximum number of concurrently active sessions.
    pub max_concurrent_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sessions_dir: "~/.tron/sessions".to_string(),
            max_concurrent_sessions: 64,
        }
    }
}

/// Event store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Path to the SQLite event store database.
    pub db_path: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// Size threshold (bytes) above which payloads move to blob storage.
    pub blob_threshold_bytes: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "~/.tron/events.db".to_string(),
            pool_size: 8,
            blob_threshold_bytes: 8192,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
