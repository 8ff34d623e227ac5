//! Core types for the memory system.
//!
//! Includes compaction trigger configuration, cycle information, and ledger
//! write results. All serializable types use `camelCase` for wire compatibility.

use serde::{Deserialize, Serialize};

/// Configuration for the compaction trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionTriggerConfig {
    /// Token ratio that forces compaction (0.0–1.0). Default: 0.70.
    pub trigger_token_threshold: f64,
    /// Token ratio for alert zone (more aggressive compaction). Default: 0.50.
    pub alert_zone_threshold: f64,
    /// Turns before auto-compaction in normal zone. Default: 8.
    pub default_turn_fallback: u32,
    /// Turns before auto-compaction in alert zone. Default: 5.
    pub alert_turn_fallback: u32,
}

impl Default for CompactionTriggerConfig {
    fn default() -> Self {
        Self {
            trigger_token_threshold: 0.70,
            alert_zone_threshold: 0.50,
            default_turn_fallback: 8,
            alert_turn_fallback: 5,
        }
    }
}

/// Input to the compaction trigger decision engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionTriggerInput {
    /// Current token usage ratio (0.0–1.0).
    pub current_token_ratio: f64,
    /// Recent event types from the current cycle.
    pub recent_event_types: Vec<String>,
    /// Recent Bash tool call commands.
    pub recent_tool_calls: Vec<String>,
}

/// Result of the compaction trigger decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionTriggerResult {
    /// Whether compaction should run.
    pub compact: bool,
    /// Reason for the decision.
    pub reason: String,
}

/// Information about a completed response cycle.
///
/// Passed to [`MemoryManager::on_cycle_complete`](crate::manager::MemoryManager::on_cycle_complete)
/// at the end of each agent response cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleInfo {
    /// Model used for the cycle.
    pub model: String,
    /// Working directory.
    pub working_directory: String,
    /// Current token usage ratio (0.0–1.0).
    pub current_token_ratio: f64,
    /// Recent event types.
    pub recent_event_types: Vec<String>,
    /// Recent Bash tool call commands.
    pub recent_tool_calls: Vec<String>,
}

/// Options for a ledger write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerWriteOpts {
    /// Model used for the cycle.
    pub model: String,
    /// Working directory.
    pub working_directory: String,
}

/// Result of a ledger write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerWriteResult {
    /// Whether an entry was written.
    pub written: bool,
    /// Reason (set when not written).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Title of the ledger entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Entry type classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    /// Event ID of the persisted entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Full payload of the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl LedgerWriteResult {
    /// Create a result indicating no entry was written.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            written: false,
            reason: Some(reason.into()),
            title: None,
            entry_type: None,
            event_id: None,
            payload: None,
        }
    }

    /// Create a result indicating an error (not a normal skip).
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            written: false,
            reason: Some(reason.into()),
            title: None,
            entry_type: Some("error".to_string()),
            event_id: None,
            payload: None,
        }
    }

    /// Create a result indicating a successful write.
    #[must_use]
    pub fn written(
        title: String,
        entry_type: String,
        event_id: String,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            written: true,
            reason: None,
            title: Some(title),
            entry_type: Some(entry_type),
            event_id: Some(event_id),
            payload: Some(payload),
        }
    }
}
