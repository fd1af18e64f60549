//! Synchronization of host sources into an SSH config file.
//!
//! A sync loads every source, resolves duplicates by priority, merges the
//! result into the parsed config, and replaces the file atomically:
//!
//! ```text
//! sources ─► load ─► stamp ─► sort ─► dedup ─► validate
//!                                                 │
//! config file ─► parse ─────────────────────► merge ─► backup ─► write
//! ```
//!
//! Concurrent syncs against the same file are not locked against each
//! other. Each run replaces the file with a complete rendering of its own
//! view, so the last writer wins and edits made in between are lost.

use crate::backend::{Crypto, default_backend};
use crate::diff::SyncDiff;
use crate::error::{Error, Result};
use crate::hosts::{deduplicate_hosts, sort_by_priority, validate_hosts};
use crate::sshconfig::{Parser, merge_sources, validate_entries, write_document};
use crate::types::{Host, HostSource, HostsFile, ParsedHost, SyncTarget};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp format appended to backup file names.
const BACKUP_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Drives loading, merging and writing for one [`SyncTarget`].
pub struct Syncer {
    target: SyncTarget,
    crypto: Box<dyn Crypto>,
}

impl Syncer {
    /// Create a syncer using the `age` CLI for encrypted sources.
    pub fn new(target: SyncTarget) -> Self {
        Self::with_crypto(target, Box::new(default_backend()))
    }

    /// Create a syncer with a custom encryption backend (useful for testing).
    pub fn with_crypto(target: SyncTarget, crypto: Box<dyn Crypto>) -> Self {
        Self { target, crypto }
    }

    /// The target being synchronized.
    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    /// The encryption backend.
    pub fn crypto(&self) -> &dyn Crypto {
        self.crypto.as_ref()
    }

    /// Load the hosts of a single source, without stamping.
    ///
    /// An encrypted file takes precedence over a plain file, which takes
    /// precedence over inline hosts.
    pub fn load_source(&self, source: &HostSource) -> Result<Vec<Host>> {
        if let Some(encrypted) = &source.encrypted_file {
            let identity = source
                .identity_file
                .as_deref()
                .ok_or_else(|| Error::InvalidSource {
                    name: source.name.clone(),
                    message: "identity_file required for encrypted sources".to_string(),
                })?;
            let plaintext = self
                .crypto
                .decrypt(encrypted, identity)
                .map_err(|e| match e {
                    Error::AgeNotFound => Error::AgeNotFound,
                    other => Error::Decrypt {
                        source_name: source.name.clone(),
                        message: other.to_string(),
                    },
                })?;
            return Ok(HostsFile::from_bytes(&source.name, &plaintext)?.hosts);
        }

        if let Some(file) = &source.file {
            let bytes = std::fs::read(file).map_err(|e| Error::Io {
                path: file.clone(),
                source: e,
            })?;
            return Ok(HostsFile::from_bytes(&source.name, &bytes)?.hosts);
        }

        if source.hosts.is_empty() {
            log::warn!("source {} defines no hosts", source.name);
        }
        Ok(source.hosts.clone())
    }

    /// Load, stamp, sort, deduplicate and validate hosts from all sources.
    pub fn load_hosts(&self) -> Result<Vec<Host>> {
        let loaded: Vec<Vec<Host>> = self
            .target
            .sources
            .par_iter()
            .map(|source| -> Result<Vec<Host>> {
                let hosts = self.load_source(source)?;
                log::debug!("loaded {} host(s) from {}", hosts.len(), source.name);
                Ok(hosts
                    .into_iter()
                    .map(|h| h.with_source(source.name.clone(), source.priority))
                    .collect())
            })
            .collect::<Result<_>>()?;

        let mut hosts: Vec<Host> = loaded.into_iter().flatten().collect();
        sort_by_priority(&mut hosts);
        let hosts = deduplicate_hosts(hosts);
        validate_hosts(&hosts)?;

        Ok(hosts)
    }

    /// Compute the merged config without touching the filesystem.
    pub fn plan(&self) -> Result<SyncPlan> {
        let hosts = self.load_hosts()?;
        let file = Parser::new(self.target.preserve_local).parse_file(&self.target.config_file)?;

        let merged = merge_sources(file.entries.clone(), &hosts);
        validate_entries(&merged)?;
        let rendered = write_document(&file.preamble, &merged);

        Ok(SyncPlan {
            hosts,
            existing: file.entries,
            merged,
            rendered,
            current: file.content,
        })
    }

    /// Back up and rewrite the config file.
    ///
    /// Nothing is written when the rendered config matches the file.
    pub fn sync(&self) -> Result<SyncOutcome> {
        let plan = self.plan()?;
        let path = &self.target.config_file;

        if plan.is_unchanged() {
            log::info!("{} is up to date", path.display());
            return Ok(SyncOutcome::Unchanged {
                hosts: plan.hosts.len(),
            });
        }

        let backup = if self.target.backup {
            create_backup(path)?
        } else {
            None
        };

        write_atomic(path, plan.rendered.as_bytes())?;
        log::info!("wrote {} host(s) to {}", plan.hosts.len(), path.display());

        Ok(SyncOutcome::Written {
            hosts: plan.hosts.len(),
            backup,
        })
    }
}

/// Result of [`Syncer::plan`].
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Desired hosts after dedup, in priority order
    pub hosts: Vec<Host>,
    /// Entries parsed from the current file
    pub existing: Vec<ParsedHost>,
    /// Entries that would be written
    pub merged: Vec<ParsedHost>,
    rendered: String,
    current: Option<String>,
}

impl SyncPlan {
    /// The config text that would be written.
    pub fn render(&self) -> &str {
        &self.rendered
    }

    /// Current file content, `None` if it does not exist.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether writing would leave the file byte-for-byte the same.
    pub fn is_unchanged(&self) -> bool {
        self.current.as_deref() == Some(self.rendered.as_str())
    }

    /// Per-host changes against the file on disk.
    ///
    /// The file is re-read with managed sections kept, so hosts that
    /// disappear from a managed section are reported as removed.
    pub fn diff(&self) -> SyncDiff {
        let on_disk = Parser::new(false).parse_str(self.current.as_deref().unwrap_or_default());
        SyncDiff::compute(&on_disk, &self.merged)
    }
}

/// What [`Syncer::sync`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The config file was replaced
    Written {
        /// Number of desired hosts
        hosts: usize,
        /// Backup of the previous file, if one was made
        backup: Option<PathBuf>,
    },
    /// The config file already matched
    Unchanged {
        /// Number of desired hosts
        hosts: usize,
    },
}

/// `<path>.backup-<timestamp>`
pub fn backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup-{timestamp}"));
    PathBuf::from(name)
}

/// Copy `path` next to itself with a timestamp suffix.
///
/// Returns `None` when there is no file to back up.
pub fn create_backup(path: &Path) -> Result<Option<PathBuf>> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let timestamp = chrono::Local::now().format(BACKUP_TIMESTAMP).to_string();
    let backup = backup_path(path, &timestamp);
    write_atomic(&backup, &content)?;
    log::info!("backed up {} to {}", path.display(), backup.display());

    Ok(Some(backup))
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// The result has mode 0600. A missing parent directory is created with
/// mode 0700. On failure the temp file is removed and `path` is untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        create_private_dir(dir).map_err(write_err)?;
    }

    let mut temp = tempfile::Builder::new()
        .prefix(".ssh-config-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    let temp = temp.into_temp_path();
    set_private_mode(&temp).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_private_mode(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_private_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeKind;
    use tempfile::TempDir;

    /// Treats "ciphertext" as plaintext.
    struct PlainCrypto;

    impl Crypto for PlainCrypto {
        fn is_available(&self) -> bool {
            true
        }

        fn decrypt(&self, ciphertext: &Path, _identity: &Path) -> Result<Vec<u8>> {
            std::fs::read(ciphertext).map_err(|e| Error::Io {
                path: ciphertext.to_path_buf(),
                source: e,
            })
        }

        fn encrypt(&self, plaintext: &Path, output: &Path, _recipients: &[String]) -> Result<()> {
            std::fs::copy(plaintext, output).map(|_| ()).map_err(|e| Error::Io {
                path: plaintext.to_path_buf(),
                source: e,
            })
        }
    }

    struct BrokenCrypto;

    impl Crypto for BrokenCrypto {
        fn is_available(&self) -> bool {
            false
        }

        fn decrypt(&self, ciphertext: &Path, _identity: &Path) -> Result<Vec<u8>> {
            Err(Error::Crypto {
                operation: "decryption",
                path: ciphertext.to_path_buf(),
                message: "no identity matched".to_string(),
            })
        }

        fn encrypt(&self, _plaintext: &Path, _output: &Path, _recipients: &[String]) -> Result<()> {
            Ok(())
        }
    }

    fn syncer(config: PathBuf, sources: Vec<HostSource>) -> Syncer {
        Syncer::with_crypto(SyncTarget::new(config, sources), Box::new(PlainCrypto))
    }

    fn personal() -> HostSource {
        HostSource::inline(
            "personal",
            10,
            vec![
                Host::new("nas", "192.168.1.10").with_user("admin"),
                Host::new("shared", "personal.example.com"),
            ],
        )
    }

    fn work() -> HostSource {
        HostSource::inline(
            "work",
            20,
            vec![Host::new("shared", "work.example.com").with_port(2222)],
        )
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".backup-"))
            .collect()
    }

    fn temp_leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".ssh-config-") && n.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_load_hosts_stamps_and_dedups() {
        let dir = TempDir::new().unwrap();
        let hosts = syncer(dir.path().join("config"), vec![personal(), work()])
            .load_hosts()
            .unwrap();

        let summary: Vec<_> = hosts
            .iter()
            .map(|h| (h.name.as_str(), h.source.as_str(), h.priority))
            .collect();
        assert_eq!(summary, vec![("shared", "work", 20), ("nas", "personal", 10)]);
        assert_eq!(hosts[0].port, 2222);
    }

    #[test]
    fn test_load_hosts_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let bad = HostSource::inline("bad", 0, vec![Host::new("web", "").with_source("x", 0)]);
        let err = syncer(dir.path().join("config"), vec![bad])
            .load_hosts()
            .unwrap_err();
        assert_eq!(err.to_string(), "hostname cannot be empty for host web");
        assert!(err.is_validation());
    }

    #[test]
    fn test_load_plain_file_source() {
        let dir = TempDir::new().unwrap();
        let hosts_file = dir.path().join("hosts.toml");
        std::fs::write(&hosts_file, "[[hosts]]\nname = \"db\"\nhostname = \"10.0.0.5\"\n").unwrap();

        let source = HostSource {
            file: Some(hosts_file),
            ..HostSource::inline("files", 0, Vec::new())
        };
        let hosts = syncer(dir.path().join("config"), vec![source])
            .load_hosts()
            .unwrap();
        assert_eq!(hosts[0].name, "db");
        assert_eq!(hosts[0].source, "files");
    }

    #[test]
    fn test_load_encrypted_source() {
        let dir = TempDir::new().unwrap();
        let encrypted = dir.path().join("hosts.toml.age");
        std::fs::write(&encrypted, "[[hosts]]\nname = \"vault\"\nhostname = \"v.internal\"\n")
            .unwrap();

        let source = HostSource {
            encrypted_file: Some(encrypted),
            identity_file: Some(dir.path().join("key.txt")),
            ..HostSource::inline("secret", 5, Vec::new())
        };
        let hosts = syncer(dir.path().join("config"), vec![source])
            .load_hosts()
            .unwrap();
        assert_eq!(hosts[0].name, "vault");
        assert_eq!(hosts[0].priority, 5);
    }

    #[test]
    fn test_encrypted_source_requires_identity() {
        let dir = TempDir::new().unwrap();
        let source = HostSource {
            encrypted_file: Some(dir.path().join("hosts.toml.age")),
            ..HostSource::inline("secret", 0, Vec::new())
        };
        let err = syncer(dir.path().join("config"), vec![source])
            .load_hosts()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "source secret: identity_file required for encrypted sources"
        );
    }

    #[test]
    fn test_decrypt_failure_names_source() {
        let dir = TempDir::new().unwrap();
        let source = HostSource {
            encrypted_file: Some(dir.path().join("hosts.toml.age")),
            identity_file: Some(dir.path().join("key.txt")),
            ..HostSource::inline("secret", 0, Vec::new())
        };
        let target = SyncTarget::new(dir.path().join("config"), vec![source]);
        let err = Syncer::with_crypto(target, Box::new(BrokenCrypto))
            .load_hosts()
            .unwrap_err();
        assert!(matches!(err, Error::Decrypt { ref source_name, .. } if source_name == "secret"));
    }

    #[test]
    fn test_sync_first_run_creates_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(".ssh").join("config");

        let outcome = syncer(config.clone(), vec![personal()]).sync().unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Written {
                hosts: 2,
                backup: None
            }
        );

        let content = std::fs::read_to_string(&config).unwrap();
        assert!(content.starts_with("# === BEGIN MMDOT MANAGED: personal ==="));
        assert!(content.contains("Host nas\n    Hostname 192.168.1.10\n    User admin\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let file_mode = std::fs::metadata(&config).unwrap().permissions().mode();
            assert_eq!(file_mode & 0o777, 0o600);
            let dir_mode = std::fs::metadata(config.parent().unwrap())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(dir_mode & 0o777, 0o700);
        }
    }

    #[test]
    fn test_sync_preserves_local_and_backs_up() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        let original = "\
# my laptop
Host laptop
    Hostname 10.0.0.2

# === BEGIN MMDOT MANAGED: personal ===
Host stale
    Hostname stale.example.com
# === END MMDOT MANAGED: personal ===
";
        std::fs::write(&config, original).unwrap();

        let outcome = syncer(config.clone(), vec![personal(), work()]).sync().unwrap();
        let SyncOutcome::Written {
            backup: Some(backup),
            ..
        } = outcome
        else {
            panic!("expected a write with backup, got {outcome:?}");
        };

        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        let stamp = name.strip_prefix("config.backup-").unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));

        let content = std::fs::read_to_string(&config).unwrap();
        assert!(content.starts_with("# my laptop\nHost laptop\n    Hostname 10.0.0.2\n\n"));
        assert!(!content.contains("stale"));
        let work_at = content.find("MANAGED: work").unwrap();
        let personal_at = content.find("MANAGED: personal").unwrap();
        assert!(work_at < personal_at);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        std::fs::write(&config, "Host laptop\n    Hostname 10.0.0.2\n").unwrap();
        let syncer = syncer(config.clone(), vec![personal(), work()]);

        syncer.sync().unwrap();
        let first = std::fs::read(&config).unwrap();
        let backups_after_first = backups(dir.path()).len();

        let outcome = syncer.sync().unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged { hosts: 2 });
        assert_eq!(std::fs::read(&config).unwrap(), first);
        assert_eq!(backups(dir.path()).len(), backups_after_first);
    }

    #[test]
    fn test_sync_idempotent_without_preserve_local() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        let mut target = SyncTarget::new(config.clone(), vec![personal(), work()]);
        target.preserve_local = false;
        target.backup = false;
        let syncer = Syncer::with_crypto(target, Box::new(PlainCrypto));

        syncer.sync().unwrap();
        let first = std::fs::read(&config).unwrap();
        assert!(matches!(syncer.sync().unwrap(), SyncOutcome::Unchanged { .. }));
        assert_eq!(std::fs::read(&config).unwrap(), first);
    }

    #[test]
    fn test_sync_rejects_local_collision_without_writing() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        let original = "Host nas\n    Hostname 127.0.0.1\n";
        std::fs::write(&config, original).unwrap();

        let err = syncer(config.clone(), vec![personal()]).sync().unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry { .. }));
        assert_eq!(std::fs::read_to_string(&config).unwrap(), original);
        assert!(backups(dir.path()).is_empty());
    }

    #[test]
    fn test_plan_diff_reports_removed_managed_hosts() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        std::fs::write(
            &config,
            "\
# === BEGIN MMDOT MANAGED: personal ===
Host gone
    Hostname gone.example.com

Host nas
    Hostname 192.168.1.10
    User admin
# === END MMDOT MANAGED: personal ===
",
        )
        .unwrap();

        let plan = syncer(config.clone(), vec![personal()]).plan().unwrap();
        assert!(plan.existing.is_empty());

        let diff = plan.diff();
        let changes: Vec<_> = diff.changes.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            changes,
            vec![("shared", ChangeKind::Added), ("gone", ChangeKind::Removed)]
        );
        assert!(!plan.is_unchanged());
        assert!(plan.render().contains("Host shared"));
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/home/u/.ssh/config"), "20240102030405"),
            PathBuf::from("/home/u/.ssh/config.backup-20240102030405")
        );
    }

    #[test]
    fn test_create_backup_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(create_backup(&dir.path().join("config")).unwrap(), None);
    }

    #[test]
    fn test_write_atomic_replaces_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_failure_leaves_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("config");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = write_atomic(&target, b"new").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert!(target.join("keep").exists());
        assert!(temp_leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_parent_is_file() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("ssh");
        std::fs::write(&parent, "not a dir").unwrap();

        let err = write_atomic(&parent.join("config"), b"new").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(std::fs::read_to_string(&parent).unwrap(), "not a dir");
        assert!(temp_leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_create_backup_unreadable_is_error() {
        let dir = TempDir::new().unwrap();
        let err = create_backup(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_sync_aborts_when_backup_fails() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        let original = "Host laptop\n    Hostname 10.0.0.2\n";
        std::fs::write(&config, original).unwrap();

        // Occupy every backup name the next few seconds could produce.
        let now = chrono::Local::now();
        for offset in 0..10 {
            let stamp = (now + chrono::Duration::seconds(offset))
                .format(BACKUP_TIMESTAMP)
                .to_string();
            let blocker = backup_path(&config, &stamp);
            std::fs::create_dir(&blocker).unwrap();
            std::fs::write(blocker.join("keep"), "x").unwrap();
        }

        let err = syncer(config.clone(), vec![personal()]).sync().unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(std::fs::read_to_string(&config).unwrap(), original);
        assert!(temp_leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_plan_unreadable_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        std::fs::create_dir(&config).unwrap();

        let err = syncer(config.clone(), vec![personal()]).plan().unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if *path == config));
    }

    #[test]
    fn test_sync_rejects_non_utf8_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        let original: &[u8] = b"Host laptop\n    # caf\xe9\n";
        std::fs::write(&config, original).unwrap();

        let err = syncer(config.clone(), vec![personal()]).sync().unwrap_err();
        assert!(matches!(err, Error::Encoding { line: 2, .. }));
        assert_eq!(std::fs::read(&config).unwrap(), original);
    }

    #[test]
    fn test_sync_keeps_global_directives() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        std::fs::write(&config, "Include ~/.ssh/conf.d/*\n\nHost a\n  User x\n").unwrap();
        let syncer = syncer(config.clone(), vec![personal()]);

        syncer.sync().unwrap();
        let content = std::fs::read_to_string(&config).unwrap();
        assert!(content.starts_with("Include ~/.ssh/conf.d/*\n\nHost a\n  User x\n\n"));
        assert!(content.contains("# === BEGIN MMDOT MANAGED: personal ==="));

        assert!(matches!(syncer.sync().unwrap(), SyncOutcome::Unchanged { .. }));
        assert_eq!(std::fs::read_to_string(&config).unwrap(), content);
    }
}
