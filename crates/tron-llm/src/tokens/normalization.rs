//! Token normalization — provider-aware context window calculation.
//!
//! Different providers report `input_tokens` differently:
//!
//! | Provider | `input_tokens` means | Context window formula |
//! |----------|---------------------|------------------------|
//! | Anthropic | **New** tokens only | `input + cache_read + cache_creation` |
//! | `OpenAI` / Google | Full context sent | `input_tokens` directly |
//!
//! This module normalizes provider data into a uniform [`TokenRecord`]
//! with correct context window size and per-turn deltas.

use tron_core::messages::ProviderType;

use super::types::{CalculationMethod, ComputedTokens, TokenMeta, TokenRecord, TokenSource};

/// Normalize raw token data into a [`TokenRecord`].
///
/// Takes the raw provider data, the previous context window baseline
/// (from the prior turn), and metadata. Returns an immutable record
/// with computed context window size and per-turn delta.
pub fn normalize_tokens(
    source: TokenSource,
    previous_baseline: u64,
    meta: TokenMeta,
) -> TokenRecord {
    let (context_window_tokens, calculation_method) = compute_context_window(&source);
    let new_input_tokens =
        compute_new_input_tokens(&source, context_window_tokens, previous_baseline);

    let computed = ComputedTokens {
        context_window_tokens,
        new_input_tokens,
        previous_context_baseline: previous_baseline,
        calculation_method,
    };

    let mut meta = meta;
    meta.normalized_at = chrono::Utc::now().to_rfc3339();

    TokenRecord {
        source,
        computed,
        meta,
    }
}

/// Compute context window size based on provider type.
///
/// Anthropic reports `input`/`cache_read`/`cache_creation` as three mutually
/// exclusive buckets. Other providers report the full context in `input_tokens`.
fn compute_context_window(source: &TokenSource) -> (u64, CalculationMethod) {
    match source.provider {
        ProviderType::Anthropic | ProviderType::MiniMax => {
            let total = source.raw_input_tokens
                + source.raw_cache_read_tokens
                + source.raw_cache_creation_tokens;
            (total, CalculationMethod::AnthropicCacheAware)
        }
        ProviderType::OpenAi | ProviderType::OpenAiCodex | ProviderType::Google => {
            (source.raw_input_tokens, CalculationMethod::Direct)
        }
    }
}

/// Compute per-turn delta (new tokens added this turn).
///
/// For Anthropic: `rawInputTokens` represents genuinely new, non-cached input.
/// iOS displays this as the down-arrow metric (separate from cache lightning bolt).
/// For other providers: use context window delta (no cache semantics).
fn compute_new_input_tokens(
    source: &TokenSource,
    context_window_tokens: u64,
    previous_baseline: u64,
) -> u64 {
    if matches!(source.provider, ProviderType::Anthropic | ProviderType::MiniMax) {
        source.raw_input_tokens
    } else {
        if previous_baseline == 0 {
            return context_window_tokens;
        }
        context_window_tokens.saturating_sub(previous_baseline)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
