use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sshkit::{HostSource, SyncTarget};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::paths::{self, PathResolver};

// ============================================================================
// Main Config Schema
// ============================================================================

/// The mmdot configuration file (`mmdot.toml`)
#[derive(Debug, Default, Deserialize)]
pub struct MmdotConfig {
    /// SSH host synchronization
    #[serde(default)]
    pub ssh: SshConfig,
}

impl MmdotConfig {
    /// Load the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Parse config text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.ssh.validate()?;
        Ok(config)
    }
}

// ============================================================================
// SSH Config
// ============================================================================

/// The `[ssh]` table
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// SSH client config to manage (default `~/.ssh/config`)
    #[serde(default)]
    pub config_file: Option<String>,

    /// Back up the config before rewriting it
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Rebuild managed sections from sources on every sync
    #[serde(default = "default_true")]
    pub preserve_local: bool,

    /// Host sources (`[[ssh.hosts]]`)
    #[serde(default)]
    pub hosts: Vec<HostSource>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            backup: true,
            preserve_local: true,
            hosts: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl SshConfig {
    /// Check structural problems that make the config unusable.
    pub fn validate(&self) -> Result<()> {
        if self.config_file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            bail!("ssh.config_file cannot be empty");
        }

        let mut names = HashSet::new();
        for (i, source) in self.hosts.iter().enumerate() {
            if source.name.is_empty() {
                bail!("host source {i}: name cannot be empty");
            }
            if !names.insert(source.name.as_str()) {
                bail!("host source '{}' is defined more than once", source.name);
            }
        }

        Ok(())
    }

    /// Resolve every path and build the sync target.
    pub fn to_target(&self, resolver: &PathResolver) -> Result<SyncTarget> {
        let config_file = match &self.config_file {
            Some(path) => resolver.resolve(path),
            None => default_ssh_config()?,
        };

        let sources = self
            .hosts
            .iter()
            .map(|source| resolve_source(source, resolver))
            .collect();

        Ok(SyncTarget {
            config_file,
            backup: self.backup,
            preserve_local: self.preserve_local,
            sources,
        })
    }
}

/// `~/.ssh/config`
fn default_ssh_config() -> Result<PathBuf> {
    Ok(paths::home_dir()?.join(".ssh").join("config"))
}

fn resolve_source(source: &HostSource, resolver: &PathResolver) -> HostSource {
    let resolve = |path: &Option<PathBuf>| path.as_deref().map(|p| resolver.resolve_path(p));
    HostSource {
        file: resolve(&source.file),
        encrypted_file: resolve(&source.encrypted_file),
        identity_file: resolve(&source.identity_file),
        ..source.clone()
    }
}

/// Load the config and build its sync target.
pub fn load_target(config_path: &Path) -> Result<SyncTarget> {
    let config = MmdotConfig::load(config_path)?;
    let resolver = PathResolver::for_config(config_path)?;
    log::debug!("Resolving config paths against {}", resolver.base().display());

    let target = config.ssh.to_target(&resolver)?;
    log::debug!(
        "Loaded {} host source(s) from {}; managing {}",
        target.sources.len(),
        config_path.display(),
        target.config_file.display()
    );
    Ok(target)
}

// ============================================================================
// Tests
// ============================================================================
