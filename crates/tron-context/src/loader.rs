//! Hierarchical context file loader.
//!
//! Loads AGENTS.md / agents.md / CLAUDE.md / claude.md from project-level
//! and directory-level locations, merges them in depth order, and supports
//! caching with freshness validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Types
// =============================================================================

/// A loaded context file.
#[derive(Clone, Debug)]
pub struct ContextFile {
    /// Absolute path.
    pub path: PathBuf,
    /// File content.
    pub content: String,
    /// Where the file was found.
    pub level: ContextLevel,
    /// Distance from project root (0 = project root).
    pub depth: usize,
}

/// Where a context file was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextLevel {
    /// Root-level file (`.claude/AGENTS.md` or similar).
    Project,
    /// Nested directory file.
    Directory,
}

/// Result of loading context.
#[derive(Clone, Debug)]
pub struct LoadedContext {
    /// Merged content from all files.
    pub merged: String,
    /// Individual files in depth order.
    pub files: Vec<ContextFile>,
}

/// Configuration for the loader.
#[derive(Clone, Debug)]
pub struct ContextLoaderConfig {
    /// Absolute path to project root.
    pub project_root: PathBuf,
    /// File names to search for (in priority order).
    pub file_names: Vec<String>,
    /// Agent directory names (`.claude`, `.tron`, `.agent`).
    pub agent_dirs: Vec<String>,
    /// Maximum directory traversal depth.
    pub max_depth: usize,
}

impl Default for ContextLoaderConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            file_names: vec![
                "AGENTS.md".into(),
                "agents.md".into(),
                "CLAUDE.md".into(),
                "claude.md".into(),
            ],
            agent_dirs: vec![".claude".into(), ".tron".into(), ".agent".into()],
            max_depth: 5,
        }
    }
}

// =============================================================================
// ContextLoader
// =============================================================================

/// Loads and merges context files from a project hierarchy.
pub struct ContextLoader {
    config: ContextLoaderConfig,
    cache: HashMap<PathBuf, CachedContext>,
}

/// Cached context with freshness tracking.
#[derive(Clone, Debug)]
struct CachedContext {
    result: LoadedContext,
    /// File paths and their modification times at load time.
    file_mtimes: Vec<(PathBuf, std::time::SystemTime)>,
}

impl ContextLoader {
    /// Create a new context loader with the given configuration.
    pub fn new(config: ContextLoaderConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    /// Load context for a target directory.
    ///
    /// Checks the cache first. If stale or missing, performs a fresh load.
    pub fn load(&mut self, target_dir: &Path) -> std::io::Result<LoadedContext> {
        let target = target_dir.to_path_buf();

        // Check cache freshness
        if let Some(cached) = self.cache.get(&target) {
            if is_cache_fresh(&cached.file_mtimes) {
                return Ok(cached.result.clone());
            }
        }

        let result = self.load_fresh(target_dir)?;

        // Cache with mtime tracking
        let file_mtimes: Vec<(PathBuf, std::time::SystemTime)> = result
            .files
            .iter()
            .filter_map(|f| {
                std::fs::metadata(&f.path)
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(|mtime| (f.path.clone(), mtime))
            })
            .collect();

        let _ = self.cache.insert(
            target,
            CachedContext {
                result: result.clone(),
                file_mtimes,
            },
        );

        Ok(result)
    }

    /// Load without caching.
    fn load_fresh(&self, target_dir: &Path) -> std::io::Result<LoadedContext> {
        let mut files = Vec::new();

        // 1. Load project-level context
        if let Some(project_file) = self.load_project_context()? {
            files.push(project_file);
        }

        // 2. Load directory-level contexts (walk from root to target)
        let dir_files = self.load_directory_contexts(target_dir)?;
        files.extend(dir_files);

        // 3. Merge
        let merged = merge_contexts(&files);

        Ok(LoadedContext { merged, files })
    }

    /// Find a context file at the project root.
    ///
    /// Search order:
    /// 1. Agent dirs (`.claude/`, `.tron/`, `.agent/`) for each filename
    /// 2. Project root for each filename
    fn load_project_context(&self) -> std::io::Result<Option<ContextFile>> {
        let root = &self.config.project_root;

        // Check agent directories first
        for dir_name in &self.config.agent_dirs {
            let dir_path = root.join(dir_name);
            if dir_path.is_dir() {
                for file_name in &self.config.file_names {
                    let file_path = dir_path.join(file_name);
                    if file_path.is_file() {
                        let content = std::fs::read_to_string(&file_path)?;
                        return Ok(Some(ContextFile {
                            path: file_path,
                            content,
                            level: ContextLevel::Project,
                            depth: 0,
                        }));
                    }
                }
            }
        }

        // Check project root directly
        for file_name in &self.config.file_names {
            let file_path = root.join(file_name);
            if file_path.is_file() {
                let content = std::fs::read_to_string(&file_path)?;
                return Ok(Some(ContextFile {
                    path: file_path,
                    content,
                    level: ContextLevel::Project,
                    depth: 0,
                }));
            }
        }

        Ok(None)
    }

    /// Load directory-level context files by walking from root to target.
    fn load_directory_contexts(
        &self,
        target_dir: &Path,
    ) -> std::io::Result<Vec<ContextFile>> {
        let root = &self.config.project_root;
        let mut files = Vec::new();

        // Build path segments from root to target
        let relative = match target_dir.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => return Ok(files), // target outside project root
        };

        let mut current = root.clone();
        for (depth_offset, component) in relative.components().enumerate() {
            current = current.join(component);
            let depth = depth_offset + 1;

            if depth > self.config.max_depth {
                break;
            }

            if let Some(file) = self.find_context_file_in(&current, depth)? {
                files.push(file);
            }
        }

        Ok(files)
    }

    /// Search for a context file in a specific directory.
    fn find_context_file_in(
        &self,
        dir: &Path,
        depth: usize,
    ) -> std::io::Result<Option<ContextFile>> {
        // Check agent subdirectories
        for agent_dir in &self.config.agent_dirs {
            let agent_path = dir.join(agent_dir);
            if agent_path.is_dir() {
                for file_name in &self.config.file_names {
                    let file_path = agent_path.join(file_name);
                    if file_path.is_file() {
                        let content = std::fs::read_to_string(&file_path)?;
                        return Ok(Some(ContextFile {
                            path: file_path,
                            content,
                            level: ContextLevel::Directory,
                            depth,
                        }));
                    }
                }
            }
        }

        // Check directory root
        for file_name in &self.config.file_names {
            let file_path = dir.join(file_name);
            if file_path.is_file() {
                let content = std::fs::read_to_string(&file_path)?;
                return Ok(Some(ContextFile {
                    path: file_path,
                    content,
                    level: ContextLevel::Directory,
                    depth,
                }));
            }
        }

        Ok(None)
    }

    /// Clear all cached contexts.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Invalidate cache for a specific directory.
    pub fn invalidate_cache(&mut self, dir: &Path) {
        let _ = self.cache.remove(dir);
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Merge context files into a single string.
///
/// Files are in depth order (shallowest first). Each file is prefixed with
/// a comment indicating its source.
fn merge_contexts(files: &[ContextFile]) -> String {
    let mut parts = Vec::with_capacity(files.len());
    for file in files {
        parts.push(file.content.clone());
    }
    parts.join("\n\n")
}

/// Check if a cache entry is still fresh by comparing file mtimes.
fn is_cache_fresh(file_mtimes: &[(PathBuf, std::time::SystemTime)]) -> bool {
    for (path, cached_mtime) in file_mtimes {
        match std::fs::metadata(path) {
            Ok(meta) => {
                if let Ok(current_mtime) = meta.modified() {
                    if current_mtime != *cached_mtime {
                        return false;
                    }
                } else {
                    return false;
                }
            }
            Err(_) => return false, // File was deleted
        }
    }
    true
}

// =============================================================================
// Tests
// =============================================================================
