//! Filesystem hook discovery.
//!
//! Scans directories for hook files matching naming conventions:
//! - `pre-tool-use.sh` → [`HookType::PreToolUse`]
//! - `100-session-start.sh` → [`HookType::SessionStart`] with priority 100
//!
//! Searches three paths in order:
//! 1. Project-level: `.agent/hooks/` and `.tron/hooks/`
//! 2. User-level: `~/.config/tron/hooks/`
//! 3. Additional custom paths

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::{DiscoveredHook, DiscoveryConfig, HookSource, HookType};

/// Default file extensions to consider as hook scripts.
const DEFAULT_EXTENSIONS: &[&str] = &[".sh", ".ts", ".js"];

/// Project-level hook directories (relative to project root).
const PROJECT_HOOK_DIRS: &[&str] = &[".agent/hooks", ".tron/hooks"];

/// User-level hook directory (relative to home).
const USER_HOOK_DIR: &str = ".config/tron/hooks";

/// Discover hook files from configured paths.
///
/// Returns a list of discovered hooks with inferred types and priorities.
/// Non-existent directories are silently skipped.
pub fn discover_hooks(config: &DiscoveryConfig) -> Vec<DiscoveredHook> {
    let mut discovered = Vec::new();
    let extensions = if config.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
    } else {
        config.extensions.clone()
    };

    // 1. Project-level hooks
    if let Some(project_path) = &config.project_path {
        for dir in PROJECT_HOOK_DIRS {
            let path = PathBuf::from(project_path).join(dir);
            scan_directory(&path, HookSource::Project, &extensions, &mut discovered);
        }
    }

    // 2. User-level hooks
    if config.include_user_hooks {
        let home = config
            .user_home
            .clone()
            .or_else(|| std::env::var("HOME").ok())
            .unwrap_or_else(|| "/root".to_string());
        let path = PathBuf::from(home).join(USER_HOOK_DIR);
        scan_directory(&path, HookSource::User, &extensions, &mut discovered);
    }

    // 3. Custom paths
    for custom in &config.additional_paths {
        let path = PathBuf::from(custom);
        scan_directory(&path, HookSource::Custom, &extensions, &mut discovered);
    }

    debug!(count = discovered.len(), "Discovered hooks");
    discovered
}

/// Scan a single directory for hook files.
fn scan_directory(
    dir: &Path,
    source: HookSource,
    extensions: &[String],
    results: &mut Vec<DiscoveredHook>,
) {
    if !dir.exists() || !dir.is_dir() {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read hooks directory");
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        // Check extension
        let has_valid_ext = extensions.iter().any(|ext| filename.ends_with(ext.as_str()));
        if !has_valid_ext {
            continue;
        }

        // Parse hook type and priority from filename
        if let Some(hook) = parse_hook_filename(&filename, &path, source) {
            debug!(
                name = %hook.name,
                hook_type = %hook.hook_type,
                source = %source,
                "Discovered hook file"
            );
            results.push(hook);
        }
    }
}

/// Parse a hook filename into a [`DiscoveredHook`].
///
/// Supports formats:
/// - `pre-tool-use.sh` → type=PreToolUse, priority=None
/// - `100-pre-tool-use.sh` → type=PreToolUse, priority=Some(100)
fn parse_hook_filename(
    filename: &str,
    path: &Path,
    source: HookSource,
) -> Option<DiscoveredHook> {
    let stem = Path::new(filename)
        .file_stem()?
        .to_str()?;

    let is_shell = std::path::Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sh"));

    // Try to extract priority prefix: "100-pre-tool-use" → (Some(100), "pre-tool-use")
    let (priority, hook_name) = extract_priority(stem);

    let hook_type = parse_hook_type(hook_name)?;

    let name = format!("{source}:{hook_name}");

    Some(DiscoveredHook {
        name,
        path: path.to_path_buf(),
        hook_type,
        is_shell_script: is_shell,
        source,
        priority,
    })
}

/// Extract optional numeric priority prefix from a stem.
///
/// `"100-pre-tool-use"` → `(Some(100), "pre-tool-use")`
/// `"pre-tool-use"` → `(None, "pre-tool-use")`
fn extract_priority(stem: &str) -> (Option<i32>, &str) {
    if let Some(pos) = stem.find('-') {
        let prefix = &stem[..pos];
        if let Ok(priority) = prefix.parse::<i32>() {
            return (Some(priority), &stem[pos + 1..]);
        }
    }
    (None, stem)
}

/// Map a hook name to its [`HookType`].
fn parse_hook_type(name: &str) -> Option<HookType> {
    match name {
        "pre-tool-use" | "pre-tool" => Some(HookType::PreToolUse),
        "post-tool-use" | "post-tool" => Some(HookType::PostToolUse),
        "session-start" => Some(HookType::SessionStart),
        "session-end" => Some(HookType::SessionEnd),
        "stop" => Some(HookType::Stop),
        "subagent-stop" => Some(HookType::SubagentStop),
        "user-prompt-submit" => Some(HookType::UserPromptSubmit),
        "pre-compact" => Some(HookType::PreCompact),
        "notification" => Some(HookType::Notification),
        _ => None,
    }
}
