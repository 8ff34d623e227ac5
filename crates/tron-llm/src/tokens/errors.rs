//! Token subsystem error types.

use tron_core::messages::ProviderType;

/// Errors that can occur during token processing.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Provider did not return usage data.
    #[error("missing token data from {provider:?} on turn {turn} (session {session_id})")]
    MissingData {
        /// Which provider failed to report.
        provider: Option<ProviderType>,
        /// Turn number where the error occurred.
        turn: u64,
        /// Session identifier.
        session_id: String,
        /// Whether partial data was present.
        has_partial_data: bool,
    },

    /// Pricing information not found for the given model.
    #[error("no pricing info for model `{model}`")]
    UnknownModel {
        /// The model identifier.
        model: String,
    },

    /// Invalid token value encountered.
    #[error("invalid token value: {0}")]
    InvalidValue(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TokenError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
