//! Token counting, normalization, and cost calculation for LLM usage.

pub mod errors;
pub mod extraction;
pub mod normalization;
pub mod pricing;
pub mod state;
pub mod types;

pub use errors::{Result, TokenError};
pub use pricing::{
    calculate_cost, detect_provider, format_cost, format_tokens, get_context_limit,
    get_pricing_tier,
};
pub use types::{
    AccumulatedTokens, CalculationMethod, ComputedTokens, ContextWindowState, PricingTier,
    TokenMeta, TokenRecord, TokenSource, TokenState,
};
