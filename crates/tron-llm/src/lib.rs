//! # tron-llm
//!
//! LLM provider trait and shared streaming utilities.
//!
//! Defines the `Provider` trait that all LLM backends implement:
//! - Shared SSE parser (handles Anthropic / `OpenAI` / Google format differences)
//! - Stream retry with exponential backoff + jitter
//! - Tool call JSON parsing from incremental deltas
//! - ID remapping utilities
//! - Model registry: `model_id -> ModelInfo { context_window, max_output, pricing, capabilities }`
//! - Per-turn token extraction, normalization, and cost accounting

#![deny(unsafe_code)]

pub mod context_composition;
pub mod error_parsing;
pub mod health;
pub mod id_remapping;
pub mod models;
pub mod provider;
pub mod retry;
pub mod sse;
pub mod stream_pipeline;
pub mod tokens;
pub mod tool_parsing;

pub use health::ProviderHealthTracker;
pub use models::model_ids;
pub use retry::{StreamFactory, StreamRetryConfig, with_provider_retry};
