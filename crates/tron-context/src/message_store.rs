//! In-memory message storage with token caching.
//!
//! [`MessageStore`] holds the conversation messages for an active session and
//! maintains a parallel token-count cache so that context budget calculations
//! avoid redundant re-estimation.
//!
//! ## Design
//!
//! TypeScript uses a `WeakMap<Message, number>` for the token cache. Rust
//! doesn't have weak references in the same way — instead we keep a parallel
//! `Vec<u32>` that is always the same length as the message list. Index-based
//! lookup is O(1) and trivially correct since add/set/clear keep both vectors
//! in sync.

use tron_core::messages::Message;

use crate::token_estimator::estimate_message_tokens;

/// Configuration for creating a [`MessageStore`].
#[derive(Clone, Debug, Default)]
pub struct MessageStoreConfig {
    /// Initial messages to populate the store.
    pub initial_messages: Option<Vec<Message>>,
}

/// In-memory message store with per-message token caching.
///
/// Provides the conversation message list used by the context manager.
/// Token estimates are computed and cached on insertion so that repeated
/// calls to [`MessageStore::get_tokens`] are cheap.
#[derive(Clone, Debug)]
pub struct MessageStore {
    messages: Vec<Message>,
    token_cache: Vec<u32>,
}

impl MessageStore {
    /// Create a new empty message store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            token_cache: Vec::new(),
        }
    }

    /// Create a message store with an initial configuration.
    #[must_use]
    pub fn with_config(config: MessageStoreConfig) -> Self {
        let mut store = Self::new();
        if let Some(messages) = config.initial_messages {
            store.set(messages);
        }
        store
    }

    /// Add a message to the store.
    ///
    /// The token estimate is computed and cached immediately.
    pub fn add(&mut self, message: Message) {
        let tokens = estimate_message_tokens(&message);
        self.messages.push(message);
        self.token_cache.push(tokens);
    }

    /// Replace all messages in the store.
    ///
    /// Token cache is rebuilt for the new messages.
    pub fn set(&mut self, messages: Vec<Message>) {
        self.token_cache = messages.iter().map(estimate_message_tokens).collect();
        self.messages = messages;
    }

    /// Get a clone of all messages.
    #[must_use]
    pub fn get(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Get a reference to the internal message slice (no allocation).
    #[must_use]
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Clear all messages from the store.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.token_cache.clear();
    }

    /// Get total token count for all messages.
    ///
    /// Uses cached values — O(n) addition with no re-estimation.
    #[must_use]
    pub fn get_tokens(&self) -> u32 {
        self.token_cache.iter().copied().sum()
    }

    /// Get the cached token count for a message at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    #[must_use]
    pub fn get_cached_tokens(&self, index: usize) -> Option<u32> {
        self.token_cache.get(index).copied()
    }

    /// Get current message count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the store contains no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
