//! Memory manager.
//!
//! Orchestrates the compaction → ledger pipeline. The critical invariant is
//! **sequential ordering**: compaction always runs before ledger writing,
//! ensuring `compact.boundary` events always precede `memory.ledger` events
//! in the event log.
//!
//! All operations are **fail-silent** — errors are logged but never propagated.
//! Memory errors must never crash a session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::MemoryError;
use crate::trigger::CompactionTrigger;
use crate::types::{
    CompactionTriggerInput, CycleInfo, LedgerWriteOpts, LedgerWriteResult,
};

/// Dependencies for the memory manager.
///
/// Implemented by the runtime to provide compaction execution, ledger writing,
/// event emission, and embedding. Uses trait-based dependency injection to
/// avoid circular dependencies.
#[async_trait]
pub trait MemoryManagerDeps: Send + Sync {
    /// Execute context compaction.
    async fn execute_compaction(&self) -> Result<(), MemoryError>;

    /// Write a ledger entry via subagent.
    async fn write_ledger_entry(&self, opts: &LedgerWriteOpts) -> LedgerWriteResult;

    /// Whether ledger writing is enabled (checked each cycle).
    fn is_ledger_enabled(&self) -> bool;

    /// Emit `memory.updating` event (before ledger write starts).
    fn emit_memory_updating(&self, session_id: &str);

    /// Emit `memory.updated` event (after ledger write completes or skips).
    fn emit_memory_updated(
        &self,
        session_id: &str,
        title: Option<&str>,
        entry_type: Option<&str>,
    );

    /// Fire-and-forget embedding for semantic search.
    async fn embed_memory(
        &self,
        event_id: &str,
        workspace_id: &str,
        payload: &serde_json::Value,
    );

    /// Called after a successful ledger write with the payload and title.
    fn on_memory_written(&self, payload: &serde_json::Value, title: &str);

    /// The current session ID.
    fn session_id(&self) -> &str;

    /// The current workspace ID (if known).
    fn workspace_id(&self) -> Option<&str>;
}

/// Memory manager orchestrating compaction and ledger writing.
///
/// # Sequential Ordering
///
/// Compaction **always** runs before ledger writing. This guarantees that
/// `compact.boundary` events precede `memory.ledger` events in the
/// event sequence, which is critical for correct event reconstruction.
///
/// # Fail-Silent
///
/// All errors are caught and logged. The manager never propagates errors
/// to the caller because memory operations are observability, not functionality.
pub struct MemoryManager<D: MemoryManagerDeps> {
    deps: D,
    trigger: CompactionTrigger,
}

impl<D: MemoryManagerDeps> MemoryManager<D> {
    /// Create a new memory manager.
    pub fn new(deps: D, trigger: CompactionTrigger) -> Self {
        Self { deps, trigger }
    }

    /// Called at the end of each agent response cycle.
    ///
    /// Pipeline:
    /// 1. Check compaction trigger → if triggered, execute compaction then reset
    /// 2. If ledger enabled → emit updating, write entry, emit updated
    /// 3. If entry written → call `on_memory_written`, spawn embedding
    ///
    /// All errors are caught and logged (fail-silent).
    pub async fn on_cycle_complete(&mut self, info: CycleInfo) {
        let session_id = self.deps.session_id().to_string();

        // --- Phase 1: Compaction (runs first for sequential ordering) ---
        let compaction_result = self.trigger.should_compact(&CompactionTriggerInput {
            current_token_ratio: info.current_token_ratio,
            recent_event_types: info.recent_event_types.clone(),
            recent_tool_calls: info.recent_tool_calls.clone(),
        });

        if compaction_result.compact {
            info!(
                reason = %compaction_result.reason,
                session_id = %session_id,
                "Compaction triggered by memory manager"
            );
            match self.deps.execute_compaction().await {
                Ok(()) => {
                    self.trigger.reset();
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        session_id = %session_id,
                        "Memory-triggered compaction failed"
                    );
                }
            }
        }

        // --- Phase 2: Ledger writing (runs after compaction) ---
        if !self.deps.is_ledger_enabled() {
            return;
        }

        self.deps.emit_memory_updating(&session_id);

        let opts = LedgerWriteOpts {
            model: info.model.clone(),
            working_directory: info.working_directory.clone(),
        };

        let ledger_result = self.deps.write_ledger_entry(&opts).await;

        if ledger_result.written {
            self.deps.emit_memory_updated(
                &session_id,
                ledger_result.title.as_deref(),
                ledger_result.entry_type.as_deref(),
            );

            if let Some(payload) = &ledger_result.payload {
                self.deps.on_memory_written(
                    payload,
                    ledger_result.title.as_deref().unwrap_or("Untitled"),
                );

                // Fire-and-forget embedding
                if let Some(event_id) = &ledger_result.event_id {
                    let workspace_id = self
                        .deps
                        .workspace_id()
                        .unwrap_or("")
                        .to_string();
                    self.deps
                        .embed_memory(event_id, &workspace_id, payload)
                        .await;
                }
            }
        } else {
            self.deps.emit_memory_updated(&session_id, None, Some("skipped"));
        }
    }

    /// Get a reference to the compaction trigger (for testing/inspection).
    #[must_use]
    pub fn trigger(&self) -> &CompactionTrigger {
        &self.trigger
    }

    /// Get a mutable reference to the compaction trigger.
    pub fn trigger_mut(&mut self) -> &mut CompactionTrigger {
        &mut self.trigger
    }
}

impl<D: MemoryManagerDeps> std::fmt::Debug for MemoryManager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}


// Implement MemoryManagerDeps for Arc<T> where T: MemoryManagerDeps
#[async_trait]
impl<T: MemoryManagerDeps> MemoryManagerDeps for Arc<T>
where
    T: Send + Sync,
{
    async fn execute_compaction(&self) -> Result<(), MemoryError> {
        (**self).execute_compaction().await
    }
    async fn write_ledger_entry(&self, opts: &LedgerWriteOpts) -> LedgerWriteResult {
        (**self).write_ledger_entry(opts).await
    }
    fn is_ledger_enabled(&self) -> bool {
        (**self).is_ledger_enabled()
    }
    fn emit_memory_updating(&self, session_id: &str) {
        (**self).emit_memory_updating(session_id);
    }
    fn emit_memory_updated(&self, session_id: &str, title: Option<&str>, entry_type: Option<&str>) {
        (**self).emit_memory_updated(session_id, title, entry_type);
    }
    async fn embed_memory(&self, event_id: &str, workspace_id: &str, payload: &serde_json::Value) {
        (**self).embed_memory(event_id, workspace_id, payload).await;
    }
    fn on_memory_written(&self, payload: &serde_json::Value, title: &str) {
        (**self).on_memory_written(payload, title);
    }
    fn session_id(&self) -> &str {
        (**self).session_id()
    }
    fn workspace_id(&self) -> Option<&str> {
        (**self).workspace_id()
    }
}
