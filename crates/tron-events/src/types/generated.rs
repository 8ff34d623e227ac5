//! Auto-generated event type definitions.
//!
//! All definitions are produced by [`define_events!`] from a single
//! source-of-truth table. **Do not hand-edit the generated code** —
//! add or remove events by modifying the macro invocation below.

use serde::{Deserialize, Serialize};

use super::base::SessionEvent;
use super::payloads;

define_events! {
    events {
        /// New session started.
        SessionStart => "session.start" => payloads::session::SessionStartPayload,
        /// Session ended.
        SessionEnd => "session.end" => payloads::session::SessionEndPayload,
        /// Session forked from another.
        SessionFork => "session.fork" => payloads::session::SessionForkPayload,
        /// User message.
        MessageUser => "message.user" => payloads::message::UserMessagePayload,
        /// Assistant (model) message.
        MessageAssistant => "message.assistant" => payloads::message::AssistantMessagePayload,
        /// System-injected message.
        MessageSystem => "message.system" => payloads::message::SystemMessagePayload,
        /// Message deleted (soft delete).
        MessageDeleted => "message.deleted" => payloads::message_ops::MessageDeletedPayload,
        /// Tool call from the model.
        ToolCall => "tool.call" => payloads::tool::ToolCallPayload,
        /// Tool execution result.
        ToolResult => "tool.result" => payloads::tool::ToolResultPayload,
        /// Text delta during streaming.
        StreamTextDelta => "stream.text_delta" => payloads::streaming::StreamTextDeltaPayload,
        /// Thinking delta during streaming.
        StreamThinkingDelta => "stream.thinking_delta" => payloads::streaming::StreamThinkingDeltaPayload,
        /// Turn started streaming.
        StreamTurnStart => "stream.turn_start" => payloads::streaming::StreamTurnStartPayload,
        /// Turn finished streaming.
        StreamTurnEnd => "stream.turn_end" => payloads::streaming::StreamTurnEndPayload,
        /// Model switched.
        ConfigModelSwitch => "config.model_switch" => payloads::config::ConfigModelSwitchPayload,
        /// System prompt updated.
        ConfigPromptUpdate => "config.prompt_update" => payloads::config::ConfigPromptUpdatePayload,
        /// Reasoning level changed.
        ConfigReasoningLevel => "config.reasoning_level" => payloads::config::ConfigReasoningLevelPayload,
        /// Agent interrupted by user.
        NotificationInterrupted => "notification.interrupted" => payloads::notification::NotificationInterruptedPayload,
        /// Subagent result notification.
        NotificationSubagentResult => "notification.subagent_result" => payloads::notification::NotificationSubagentResultPayload,
        /// Compaction boundary marker.
        CompactBoundary => "compact.boundary" => payloads::compact::CompactBoundaryPayload,
        /// Compaction summary.
        CompactSummary => "compact.summary" => payloads::compact::CompactSummaryPayload,
        /// Context cleared.
        ContextCleared => "context.cleared" => payloads::context::ContextClearedPayload,
        /// Skill added to session.
        SkillAdded => "skill.added" => payloads::skill::SkillAddedPayload,
        /// Skill removed from session.
        SkillRemoved => "skill.removed" => payloads::skill::SkillRemovedPayload,
        /// Rules files loaded.
        RulesLoaded => "rules.loaded" => payloads::rules::RulesLoadedPayload,
        /// Rules indexed.
        RulesIndexed => "rules.indexed" => payloads::rules::RulesIndexedPayload,
        /// Scoped rules activated by file path touches.
        RulesActivated => "rules.activated" => payloads::rules::RulesActivatedPayload,
        /// Session metadata updated.
        MetadataUpdate => "metadata.update" => payloads::metadata::MetadataUpdatePayload,
        /// Session tag added/removed.
        MetadataTag => "metadata.tag" => payloads::metadata::MetadataTagPayload,
        /// File read by agent.
        FileRead => "file.read" => payloads::file::FileReadPayload,
        /// File written by agent.
        FileWrite => "file.write" => payloads::file::FileWritePayload,
        /// File edited by agent.
        FileEdit => "file.edit" => payloads::file::FileEditPayload,
        /// Git worktree acquired.
        WorktreeAcquired => "worktree.acquired" => payloads::worktree::WorktreeAcquiredPayload,
        /// Commit in worktree.
        WorktreeCommit => "worktree.commit" => payloads::worktree::WorktreeCommitPayload,
        /// Worktree released.
        WorktreeReleased => "worktree.released" => payloads::worktree::WorktreeReleasedPayload,
        /// Worktree merged back.
        WorktreeMerged => "worktree.merged" => payloads::worktree::WorktreeMergedPayload,
        /// Agent-level error.
        ErrorAgent => "error.agent" => payloads::error::ErrorAgentPayload,
        /// Tool execution error.
        ErrorTool => "error.tool" => payloads::error::ErrorToolPayload,
        /// Provider (LLM) error.
        ErrorProvider => "error.provider" => payloads::error::ErrorProviderPayload,
        /// Subagent spawned.
        SubagentSpawned => "subagent.spawned" => payloads::subagent::SubagentSpawnedPayload,
        /// Subagent status update.
        SubagentStatusUpdate => "subagent.status_update" => payloads::subagent::SubagentStatusUpdatePayload,
        /// Subagent completed.
        SubagentCompleted => "subagent.completed" => payloads::subagent::SubagentCompletedPayload,
        /// Subagent failed.
        SubagentFailed => "subagent.failed" => payloads::subagent::SubagentFailedPayload,
        /// Subagent results consumed by parent agent.
        SubagentResultsConsumed => "subagent.results_consumed" => payloads::notification::SubagentResultsConsumedPayload,
        /// Todo list written.
        TodoWrite => "todo.write" => payloads::todo::TodoWritePayload,
        /// Task created.
        TaskCreated => "task.created" => payloads::task::TaskCreatedPayload,
        /// Task updated.
        TaskUpdated => "task.updated" => payloads::task::TaskUpdatedPayload,
        /// Task deleted.
        TaskDeleted => "task.deleted" => payloads::task::TaskDeletedPayload,
        /// Project created.
        ProjectCreated => "project.created" => payloads::task::ProjectCreatedPayload,
        /// Project updated.
        ProjectUpdated => "project.updated" => payloads::task::ProjectUpdatedPayload,
        /// Project deleted.
        ProjectDeleted => "project.deleted" => payloads::task::ProjectDeletedPayload,
        /// Area created.
        AreaCreated => "area.created" => payloads::task::AreaCreatedPayload,
        /// Area updated.
        AreaUpdated => "area.updated" => payloads::task::AreaUpdatedPayload,
        /// Area deleted.
        AreaDeleted => "area.deleted" => payloads::task::AreaDeletedPayload,
        /// Turn failed.
        TurnFailed => "turn.failed" => payloads::turn::TurnFailedPayload,
        /// Hook triggered.
        HookTriggered => "hook.triggered" => payloads::hook::HookTriggeredPayload,
        /// Hook completed.
        HookCompleted => "hook.completed" => payloads::hook::HookCompletedPayload,
        /// Background hook started.
        HookBackgroundStarted => "hook.background_started" => payloads::hook::HookBackgroundStartedPayload,
        /// Background hook completed.
        HookBackgroundCompleted => "hook.background_completed" => payloads::hook::HookBackgroundCompletedPayload,
        /// Memory ledger entry.
        MemoryLedger => "memory.ledger" => payloads::memory::MemoryLedgerPayload,
    }
    raw_events {
        /// Memory loaded into context (raw payload).
        MemoryLoaded => "memory.loaded" => serde_json::Value,
    }
    domain_groups {
        /// Whether this is a session lifecycle event (`session.*`).
        is_session_type => [SessionStart, SessionEnd, SessionFork],
        /// Whether this is a message event (`message.user|assistant|system`).
        is_message_type => [MessageUser, MessageAssistant, MessageSystem],
        /// Whether this is a streaming event (`stream.*`).
        is_streaming_type => [StreamTextDelta, StreamThinkingDelta, StreamTurnStart, StreamTurnEnd],
        /// Whether this is an error event (`error.*`).
        is_error_type => [ErrorAgent, ErrorTool, ErrorProvider],
        /// Whether this is a config event (`config.*`).
        is_config_type => [ConfigModelSwitch, ConfigPromptUpdate, ConfigReasoningLevel],
        /// Whether this is a worktree event (`worktree.*`).
        is_worktree_type => [WorktreeAcquired, WorktreeCommit, WorktreeReleased, WorktreeMerged],
        /// Whether this is a subagent event (`subagent.*`).
        is_subagent_type => [SubagentSpawned, SubagentStatusUpdate, SubagentCompleted, SubagentFailed, SubagentResultsConsumed],
        /// Whether this is a hook event (`hook.*`).
        is_hook_type => [HookTriggered, HookCompleted, HookBackgroundStarted, HookBackgroundCompleted],
        /// Whether this is a skill event (`skill.*`).
        is_skill_type => [SkillAdded, SkillRemoved],
        /// Whether this is a rules event (`rules.*`).
        is_rules_type => [RulesLoaded, RulesIndexed, RulesActivated],
        /// Whether this is a memory event (`memory.*`).
        is_memory_type => [MemoryLedger, MemoryLoaded],
        /// Whether this is a task/project/area CRUD event.
        is_task_crud_type => [TaskCreated, TaskUpdated, TaskDeleted, ProjectCreated, ProjectUpdated, ProjectDeleted, AreaCreated, AreaUpdated, AreaDeleted],
        /// Whether this is a file event (`file.*`).
        is_file_type => [FileRead, FileWrite, FileEdit],
    }
}
