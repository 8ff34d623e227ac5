//! Token usage tracking types.
//!
//! [`TokenUsage`] matches the TypeScript `TokenUsage` interface exactly,
//! with `camelCase` field naming for wire compatibility.

use serde::{Deserialize, Serialize};

/// Token usage reported by LLM providers.
///
/// All fields use `camelCase` serialization to match the TypeScript/iOS
/// wire format. Optional cache fields are omitted from JSON when `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Number of input tokens consumed.
    pub input_tokens: i64,
    /// Number of output tokens generated.
    pub output_tokens: i64,
    /// Tokens read from prompt cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<i64>,
    /// Tokens written to prompt cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<i64>,
    /// 5-minute cache creation tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_5m_tokens: Option<i64>,
    /// 1-hour cache creation tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_1h_tokens: Option<i64>,
}

/// Canonical token record with source, computed, and metadata fields.
///
/// Stored as `tokenRecord` on assistant message and streaming turn-end events.
/// Kept as opaque JSON because the schema is defined in `tron-tokens` crate.
pub type TokenRecord = serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
