//! Core types for SSH host synchronization.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Indentation used for directives inside a generated `Host` block.
const INDENT: &str = "    ";

/// Highest valid TCP port.
const MAX_PORT: i64 = 65535;

/// A desired SSH host definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Host {
    /// Host alias written on the `Host` line
    pub name: String,
    /// Real hostname or address
    #[serde(default)]
    pub hostname: String,
    /// Login user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Port (0 means the ssh default)
    #[serde(default)]
    pub port: i64,
    /// Private key path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    /// Jump host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_jump: Option<String>,
    /// `ForwardAgent yes|no`, omitted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_agent: Option<bool>,
    /// `ForwardX11 yes|no`, omitted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_x11: Option<bool>,
    /// Local forwards as `"port:host:hostport"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_forward: Vec<String>,
    /// Remote forwards as `"port:host:hostport"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_forward: Vec<String>,
    /// Raw directives copied verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<String>,

    /// Priority of the producing source (stamped at load time)
    #[serde(skip)]
    pub priority: i64,
    /// Name of the producing source (stamped at load time)
    #[serde(skip)]
    pub source: String,
}

impl Host {
    /// Create a host with a name and hostname.
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Set the login user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: i64) -> Self {
        self.port = port;
        self
    }

    /// Stamp the producing source and its priority.
    pub fn with_source(mut self, source: impl Into<String>, priority: i64) -> Self {
        self.source = source.into();
        self.priority = priority;
        self
    }

    /// Check that the host can be written to an SSH config.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation("host name cannot be empty".to_string()));
        }
        if self.hostname.is_empty() {
            return Err(Error::Validation(format!(
                "hostname cannot be empty for host {}",
                self.name
            )));
        }
        if !(0..=MAX_PORT).contains(&self.port) {
            return Err(Error::Validation(format!(
                "invalid port {} for host {}",
                self.port, self.name
            )));
        }
        Ok(())
    }

    /// Render the host as SSH config lines, `Host` line first.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Host {}", self.name)];
        let mut directive = |key: &str, value: &str| {
            lines.push(format!("{INDENT}{key} {value}"));
        };

        if !self.hostname.is_empty() {
            directive("Hostname", &self.hostname);
        }
        if let Some(user) = non_empty(&self.user) {
            directive("User", user);
        }
        if self.port > 0 {
            directive("Port", &self.port.to_string());
        }
        if let Some(identity) = non_empty(&self.identity_file) {
            directive("IdentityFile", identity);
        }
        if let Some(jump) = non_empty(&self.proxy_jump) {
            directive("ProxyJump", jump);
        }
        if let Some(agent) = self.forward_agent {
            directive("ForwardAgent", yes_no(agent));
        }
        if let Some(x11) = self.forward_x11 {
            directive("ForwardX11", yes_no(x11));
        }
        for forward in &self.local_forward {
            if let Some((local, remote)) = forward.split_once(':') {
                directive("LocalForward", &format!("{local} {remote}"));
            }
        }
        for forward in &self.remote_forward {
            if let Some((remote, local)) = forward.split_once(':') {
                directive("RemoteForward", &format!("{remote} {local}"));
            }
        }
        for custom in &self.custom {
            lines.push(format!("{INDENT}{custom}"));
        }

        lines
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_lines().join("\n"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// A named, prioritized provider of desired hosts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostSource {
    /// Unique source name, also the managed section name
    pub name: String,
    /// Higher priority wins when two sources define the same host
    #[serde(default)]
    pub priority: i64,
    /// Hosts defined inline in the config
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<Host>,
    /// Plain TOML hosts file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// age-encrypted TOML hosts file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_file: Option<PathBuf>,
    /// age recipients used when encrypting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    /// age identity used when decrypting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    /// Free-form labels for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl HostSource {
    /// Create an inline source.
    pub fn inline(name: impl Into<String>, priority: i64, hosts: Vec<Host>) -> Self {
        Self {
            name: name.into(),
            priority,
            hosts,
            ..Default::default()
        }
    }

    /// Whether hosts must be decrypted before use.
    pub fn needs_decryption(&self) -> bool {
        self.encrypted_file.is_some()
    }

    /// Whether the source can be (re-)encrypted.
    pub fn has_encryption(&self) -> bool {
        self.encrypted_file.is_some() && !self.recipients.is_empty()
    }

    /// Whether the source carries any of the given tags.
    ///
    /// An empty filter matches every source.
    pub fn matches_tags(&self, filter: &[String]) -> bool {
        filter.is_empty() || filter.iter().any(|tag| self.tags.contains(tag))
    }
}

/// The host-list format used by plain and encrypted hosts files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostsFile {
    /// Host definitions
    #[serde(default)]
    pub hosts: Vec<Host>,
}

impl HostsFile {
    /// Parse a hosts file belonging to `source_name`.
    pub fn from_bytes(source_name: &str, bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::HostsFileParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(text).map_err(|e| Error::HostsFileParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Ownership of an entry in the physical SSH config.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntrySource {
    /// Hand-written, outside any managed section
    Local,
    /// Inside the managed section of the named source
    Managed(String),
}

impl EntrySource {
    /// Create a managed tag.
    pub fn managed(name: impl Into<String>) -> Self {
        Self::Managed(name.into())
    }

    /// Whether the entry is hand-written.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Section name for managed entries.
    pub fn managed_name(&self) -> Option<&str> {
        match self {
            Self::Local => None,
            Self::Managed(name) => Some(name),
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Managed(name) => write!(f, "managed:{name}"),
        }
    }
}

/// A host block recovered from (or destined for) the physical SSH config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHost {
    /// Everything after the `Host` keyword
    pub name: String,
    /// The `Host` line and its body, verbatim
    pub lines: Vec<String>,
    /// Comment lines directly above the `Host` line
    pub comments: Vec<String>,
    /// Ownership tag
    pub source: EntrySource,
}

impl ParsedHost {
    /// Render a desired host as a managed entry of `source_name`.
    pub fn from_host(host: &Host, source_name: &str) -> Self {
        Self {
            name: host.name.clone(),
            lines: host.to_lines(),
            comments: Vec::new(),
            source: EntrySource::managed(source_name),
        }
    }
}

/// Where and how to synchronize hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Physical SSH config path
    pub config_file: PathBuf,
    /// Copy the existing file aside before writing
    pub backup: bool,
    /// Discard managed sections on read so they are rebuilt from sources
    pub preserve_local: bool,
    /// Ordered host sources
    pub sources: Vec<HostSource>,
}

impl SyncTarget {
    /// Create a target with backups and local preservation enabled.
    pub fn new(config_file: impl Into<PathBuf>, sources: Vec<HostSource>) -> Self {
        Self {
            config_file: config_file.into(),
            backup: true,
            preserve_local: true,
            sources,
        }
    }
}
