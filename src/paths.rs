//! Path resolution for mmdot
//!
//! Paths in `mmdot.toml` may use `~` and environment variables. Relative
//! paths are resolved against the directory holding the config file, not
//! the current directory, so `mmdot -c ~/dotfiles/mmdot.toml` behaves the
//! same from anywhere.
//!
//! # Environment Variables
//!
//! - `MMDOT_CONFIG_PATH` - Config file to use when `--config` is not given

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the config file path
pub const ENV_CONFIG_PATH: &str = "MMDOT_CONFIG_PATH";

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// The user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

/// Resolves config paths relative to a fixed base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create a resolver for paths found in the config file at `config_path`.
    pub fn for_config(config_path: &Path) -> Result<Self> {
        let base = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().context("Could not determine current directory")?,
        };
        let base = if base.is_absolute() {
            base
        } else {
            std::env::current_dir()
                .context("Could not determine current directory")?
                .join(base)
        };
        Ok(Self::new(base))
    }

    /// Base directory for relative paths.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Expand and resolve a path string.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let expanded = expand(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.base.join(expanded)
        }
    }

    /// Expand and resolve a path read from the config.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.resolve(&path.to_string_lossy())
    }
}

// ============================================================================
// Tests
// ============================================================================
