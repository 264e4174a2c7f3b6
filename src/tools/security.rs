use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use super::error::ToolError;
use crate::constants::{DEFAULT_SCRIPT_TIMEOUT_SECS, PYTHON_EXTENSION, get_max_chars, get_python};

/// Sandbox configuration shared by every tool call
///
/// Built once at startup and handed to the dispatcher by reference:
/// - Confinement root (canonical, must be an existing directory)
/// - Read cap for `get_file_content`
/// - Interpreter, script extension and timeout for `run_python_file`
#[derive(Debug, Clone)]
pub struct SandboxContext {
    root: PathBuf,
    max_chars: usize,
    interpreter: String,
    script_extension: String,
    script_timeout: Duration,
}

impl SandboxContext {
    /// Create a sandbox rooted at `root` with defaults taken from the environment
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .with_context(|| format!("Working directory not found: {}", root.display()))?;

        if !canonical.is_dir() {
            return Err(anyhow!(
                "Working directory is not a directory: {}",
                root.display()
            ));
        }

        Ok(Self {
            root: canonical,
            max_chars: get_max_chars(),
            interpreter: get_python(),
            script_extension: PYTHON_EXTENSION.to_string(),
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECS),
        })
    }

    /// Set the read cap in characters (builder pattern)
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Set the script interpreter (builder pattern)
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Set the script timeout (builder pattern)
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }

    /// Resolve a caller-supplied relative path inside the root
    ///
    /// The joined path is normalized lexically, then symlinks are resolved on
    /// the longest existing prefix. Both forms must stay under the root,
    /// compared segment by segment (`/a/bx` is not inside `/a/b`).
    pub fn resolve(&self, candidate: &str, action: &'static str) -> Result<PathBuf, ToolError> {
        let escape = || ToolError::PathEscape {
            action,
            path: candidate.to_string(),
        };

        let lexical = normalize_lexically(&self.root.join(candidate));
        if !lexical.starts_with(&self.root) {
            return Err(escape());
        }

        let resolved = canonicalize_existing_prefix(&lexical).ok_or_else(escape)?;
        if !resolved.starts_with(&self.root) {
            return Err(escape());
        }

        Ok(resolved)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn script_extension(&self) -> &str {
        &self.script_extension
    }

    pub fn script_timeout(&self) -> Duration {
        self.script_timeout
    }
}

/// Drop `.` segments and apply `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
///
/// Returns `None` for dangling symlinks: their target cannot be checked.
fn canonicalize_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut tail: Vec<OsString> = Vec::new();
    let mut current = path.to_path_buf();

    loop {
        match current.canonicalize() {
            Ok(mut canonical) => {
                for part in tail.iter().rev() {
                    canonical.push(part);
                }
                return Some(canonical);
            }
            Err(_) if current.symlink_metadata().is_ok() => return None,
            Err(_) => {
                let name = current.file_name()?.to_os_string();
                tail.push(name);
                current = current.parent()?.to_path_buf();
            }
        }
    }
}
