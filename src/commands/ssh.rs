//! SSH host management commands using sshkit.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use sshkit::{
    ChangeKind, Host, HostSource, HostsFile, SyncDiff, SyncOutcome, Syncer, validate_hosts,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::Context as AppContext;
use crate::cli::SshCommand;
use crate::config;
use crate::progress;
use crate::ui;

pub fn run(ctx: &AppContext, cmd: SshCommand) -> Result<()> {
    let Some(syncer) = load_syncer(&ctx.config)? else {
        ui::info(&format!(
            "No SSH host sources configured in {}",
            ctx.config.display()
        ));
        return Ok(());
    };

    match cmd {
        SshCommand::Sync { dry_run } => sync(ctx, &syncer, dry_run),
        SshCommand::Diff => diff(ctx, &syncer),
        SshCommand::Validate => validate(&syncer),
        SshCommand::List { tags } => list(ctx, &syncer, &tags),
        SshCommand::Encrypt => {
            print_report("Encryption Results:", &encrypt_sources(&syncer));
            Ok(())
        }
        SshCommand::Decrypt => {
            print_report("Decryption Results:", &decrypt_sources(&syncer));
            Ok(())
        }
    }
}

/// Build a syncer from the config, or `None` when no sources are configured.
fn load_syncer(config_path: &Path) -> Result<Option<Syncer>> {
    let target = config::load_target(config_path).context("Failed to load configuration")?;
    if target.sources.is_empty() {
        return Ok(None);
    }
    Ok(Some(Syncer::new(target)))
}

// ============================================================================
// Sync / Diff
// ============================================================================

fn sync(ctx: &AppContext, syncer: &Syncer, dry_run: bool) -> Result<()> {
    let path = syncer.target().config_file.display().to_string();

    if dry_run {
        ui::header("Dry run: showing what would change");
        return diff(ctx, syncer);
    }

    let pb = progress::spinner(&format!("Synchronizing {path}"), ctx.quiet);
    let outcome = match syncer.sync() {
        Ok(outcome) => outcome,
        Err(e) => {
            progress::finish_error(&pb, "Sync failed");
            return Err(e).context("Failed to synchronize SSH hosts");
        }
    };
    progress::finish_clear(&pb);

    match outcome {
        SyncOutcome::Written { hosts, backup } => {
            ui::success(&format!(
                "Synchronized {} to {path}",
                ui::plural(hosts, "host")
            ));
            if let Some(backup) = backup {
                ui::kv("Backup", &backup.display().to_string());
            }
        }
        SyncOutcome::Unchanged { hosts } => {
            ui::success(&format!(
                "{path} is up to date ({})",
                ui::plural(hosts, "host")
            ));
        }
    }

    Ok(())
}

fn diff(ctx: &AppContext, syncer: &Syncer) -> Result<()> {
    let pb = progress::spinner("Loading hosts", ctx.quiet);
    let plan = syncer.plan();
    progress::finish_clear(&pb);
    let plan = plan.context("Failed to compute SSH config changes")?;

    show_diff(&plan.diff());
    Ok(())
}

fn show_diff(diff: &SyncDiff) {
    let sections = [
        (ChangeKind::Added, "Hosts to be added:"),
        (ChangeKind::Modified, "Hosts to be modified:"),
        (ChangeKind::Removed, "Hosts to be removed:"),
    ];

    for (kind, title) in sections {
        let mut changes = diff.of_kind(kind).peekable();
        if changes.peek().is_none() {
            continue;
        }

        ui::section(title);
        for change in changes {
            let label = match kind {
                ChangeKind::Added => format!("{} {}", "+".green(), change.name),
                ChangeKind::Modified => format!("{} {}", "~".yellow(), change.name),
                ChangeKind::Removed => format!("{} {}", "-".red(), change.name),
            };
            let source = if kind == ChangeKind::Removed {
                format!("(was source: {})", change.source)
            } else {
                format!("(source: {})", change.source)
            };
            println!("  {label} {}", source.dimmed());

            if kind == ChangeKind::Modified {
                show_text_diff(&change.before, &change.after);
            }
        }
    }

    println!();
    let summary = diff.summary();
    if summary.total() == 0 {
        ui::info("No changes would be made");
    } else {
        ui::info(&format!("Summary: {summary}"));
    }
}

fn show_text_diff(before: &[String], after: &[String]) {
    let old = lines_to_text(before);
    let new = lines_to_text(after);
    let diff = similar::TextDiff::from_lines(&old, &new);

    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                print!("    {}", format!("- {change}").red());
            }
            similar::ChangeTag::Insert => {
                print!("    {}", format!("+ {change}").green());
            }
            similar::ChangeTag::Equal => {}
        }
    }
}

fn lines_to_text(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

// ============================================================================
// Validate
// ============================================================================

/// One validation result line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Check {
    ok: bool,
    message: String,
}

impl Check {
    fn pass(message: String) -> Self {
        Self { ok: true, message }
    }

    fn fail(message: String) -> Self {
        Self { ok: false, message }
    }
}

fn validate(syncer: &Syncer) -> Result<()> {
    let checks = validation_checks(syncer);

    ui::section("Validation Results:");
    for check in &checks {
        ui::status(check.ok, &check.message);
    }

    let failures = checks.iter().filter(|c| !c.ok).count();
    let passed = checks.len() - failures;

    println!();
    if failures == 0 {
        ui::success("All validations passed");
        Ok(())
    } else {
        ui::error(&format!(
            "{} failed, {passed} passed",
            ui::plural(failures, "validation")
        ));
        bail!("validation failed")
    }
}

fn validation_checks(syncer: &Syncer) -> Vec<Check> {
    let mut checks: Vec<Check> = syncer
        .target()
        .sources
        .iter()
        .map(|source| check_source(syncer, source))
        .collect();

    checks.push(match syncer.load_hosts() {
        Ok(hosts) => Check::pass(format!(
            "Successfully loaded {} total",
            ui::plural(hosts.len(), "host")
        )),
        Err(e) => Check::fail(format!("Failed to load hosts: {e}")),
    });

    checks
}

fn check_source(syncer: &Syncer, source: &HostSource) -> Check {
    let name = &source.name;

    let kind = if let Some(encrypted) = &source.encrypted_file {
        let Some(identity) = &source.identity_file else {
            return Check::fail(format!(
                "Source {name}: identity_file required for encrypted sources"
            ));
        };
        if !encrypted.exists() {
            return Check::fail(format!(
                "Source {name}: encrypted file not found: {}",
                encrypted.display()
            ));
        }
        if let Err(e) = std::fs::File::open(identity) {
            return Check::fail(format!(
                "Source {name}: identity file not readable: {} ({e})",
                identity.display()
            ));
        }
        "encrypted"
    } else if let Some(file) = &source.file {
        if !file.exists() {
            return Check::fail(format!(
                "Source {name}: hosts file not found: {}",
                file.display()
            ));
        }
        "file"
    } else if !source.hosts.is_empty() {
        "inline"
    } else {
        return Check::fail(format!(
            "Source {name}: must specify encrypted_file, file or inline hosts"
        ));
    };

    let hosts = match syncer.load_source(source) {
        Ok(hosts) => hosts,
        Err(e) => return Check::fail(format!("Source {name}: {e}")),
    };

    let stamped: Vec<Host> = hosts
        .into_iter()
        .map(|h| h.with_source(name.clone(), source.priority))
        .collect();
    if let Err(e) = validate_hosts(&stamped) {
        return Check::fail(format!("Source {name}: invalid hosts: {e}"));
    }

    Check::pass(format!(
        "Source {name}: valid {kind} source ({})",
        ui::plural(stamped.len(), "host")
    ))
}

// ============================================================================
// List
// ============================================================================

fn list(ctx: &AppContext, syncer: &Syncer, tags: &[String]) -> Result<()> {
    let pb = progress::spinner("Loading hosts", ctx.quiet);
    let hosts = syncer.load_hosts();
    progress::finish_clear(&pb);
    let hosts = hosts.context("Failed to load hosts")?;

    let hosts = filter_by_tags(hosts, &syncer.target().sources, tags);
    if hosts.is_empty() {
        ui::info("No hosts found in configured sources");
        return Ok(());
    }

    ui::section(&format!("SSH Hosts ({} total):", hosts.len()));
    for host in &hosts {
        ui::item(&format_host(host));
    }

    Ok(())
}

/// Keep hosts whose source carries any of `tags`.
fn filter_by_tags(hosts: Vec<Host>, sources: &[HostSource], tags: &[String]) -> Vec<Host> {
    let allowed: HashSet<&str> = sources
        .iter()
        .filter(|s| s.matches_tags(tags))
        .map(|s| s.name.as_str())
        .collect();

    hosts
        .into_iter()
        .filter(|h| allowed.contains(h.source.as_str()))
        .collect()
}

/// `name -> [user@]hostname[:port] (source: s, priority: p)`
fn format_host(host: &Host) -> String {
    let mut target = match host.user.as_deref().filter(|u| !u.is_empty()) {
        Some(user) => format!("{user}@{}", host.hostname),
        None => host.hostname.clone(),
    };
    if host.port > 0 && host.port != 22 {
        target = format!("{target}:{}", host.port);
    }
    format!(
        "{} -> {target} (source: {}, priority: {})",
        host.name, host.source, host.priority
    )
}

// ============================================================================
// Encrypt / Decrypt
// ============================================================================

/// Outcome of an encrypt or decrypt pass.
#[derive(Debug, Default)]
struct Report {
    warnings: Vec<String>,
    results: Vec<Check>,
    done: usize,
    verb: &'static str,
}

fn print_report(title: &str, report: &Report) {
    if !report.warnings.is_empty() {
        ui::section("Warnings:");
        for warning in &report.warnings {
            ui::warn(warning);
        }
    }

    if !report.results.is_empty() {
        ui::section(title);
        for result in &report.results {
            ui::status(result.ok, &result.message);
        }
    }

    println!();
    if report.done == 0 {
        ui::info(&format!("No files were {}", report.verb));
    } else {
        ui::success(&format!(
            "Successfully {} {}",
            report.verb,
            ui::plural(report.done, "file")
        ));
    }
}

/// `hosts.toml.age` -> `hosts.toml`
fn plaintext_path(encrypted: &Path) -> Option<PathBuf> {
    (encrypted.extension()? == "age").then(|| encrypted.with_extension(""))
}

/// Encrypt each source's plaintext sibling and remove the plaintext.
fn encrypt_sources(syncer: &Syncer) -> Report {
    let mut report = Report {
        verb: "encrypted",
        ..Report::default()
    };

    for source in &syncer.target().sources {
        let name = &source.name;

        if !source.hosts.is_empty() {
            report
                .warnings
                .push(format!("Source {name} uses inline hosts (no file to encrypt)"));
            continue;
        }
        let Some(encrypted) = &source.encrypted_file else {
            log::debug!("Source {name} has no encrypted_file");
            continue;
        };
        if source.recipients.is_empty() {
            report.warnings.push(format!(
                "Source {name} has no recipients configured for encryption"
            ));
            continue;
        }
        let Some(plaintext) = plaintext_path(encrypted) else {
            report.warnings.push(format!(
                "Source {name}: encrypted_file must end in .age: {}",
                encrypted.display()
            ));
            continue;
        };
        if !plaintext.exists() {
            if encrypted.exists() {
                report
                    .warnings
                    .push(format!("Source {name} already encrypted (no source file found)"));
            } else {
                log::debug!("No file found for source {name}: {}", plaintext.display());
            }
            continue;
        }

        let count = match read_hosts_file(name, &plaintext) {
            Ok(0) => {
                log::debug!("Skipping {} with no hosts", plaintext.display());
                continue;
            }
            Ok(count) => count,
            Err(message) => {
                report.results.push(Check::fail(format!("{name} - {message}")));
                continue;
            }
        };

        log::info!(
            "Encrypting {} -> {} ({} hosts)",
            plaintext.display(),
            encrypted.display(),
            count
        );
        if let Err(e) = syncer.crypto().encrypt(&plaintext, encrypted, &source.recipients) {
            report.results.push(Check::fail(format!("{name} - {e}")));
            continue;
        }
        if let Err(e) = std::fs::remove_file(&plaintext) {
            log::error!("Failed to remove {}: {e}", plaintext.display());
            report.results.push(Check::fail(format!(
                "{name} ({}) - failed to remove source file",
                ui::plural(count, "host")
            )));
            continue;
        }

        report.results.push(Check::pass(format!(
            "{name} ({}) - {}",
            ui::plural(count, "host"),
            encrypted.display()
        )));
        report.done += 1;
    }

    report
}

/// Decrypt each encrypted source next to itself and remove the ciphertext.
fn decrypt_sources(syncer: &Syncer) -> Report {
    let mut report = Report {
        verb: "decrypted",
        ..Report::default()
    };

    for source in &syncer.target().sources {
        let name = &source.name;
        let Some(encrypted) = &source.encrypted_file else {
            log::debug!("Source {name} is not encrypted");
            continue;
        };

        if !encrypted.exists() {
            report.warnings.push(format!(
                "Source {name} encrypted file not found: {}",
                encrypted.display()
            ));
            continue;
        }
        let Some(identity) = &source.identity_file else {
            report.warnings.push(format!(
                "Source {name} has no identity file specified for decryption"
            ));
            continue;
        };

        let output = plaintext_path(encrypted).unwrap_or_else(|| {
            let mut path = encrypted.as_os_str().to_os_string();
            path.push(".decrypted");
            PathBuf::from(path)
        });
        log::info!("Decrypting {} -> {}", encrypted.display(), output.display());

        let plaintext = match syncer.crypto().decrypt(encrypted, identity) {
            Ok(bytes) => bytes,
            Err(e) => {
                report
                    .results
                    .push(Check::fail(format!("{name} - failed to decrypt: {e}")));
                continue;
            }
        };
        let count = match HostsFile::from_bytes(name, &plaintext) {
            Ok(file) => file.hosts.len(),
            Err(e) => {
                report
                    .results
                    .push(Check::fail(format!("{name} - decrypted file is not valid: {e}")));
                continue;
            }
        };
        if let Err(e) = sshkit::sync::write_atomic(&output, &plaintext) {
            report.results.push(Check::fail(format!("{name} - {e}")));
            continue;
        }
        if let Err(e) = std::fs::remove_file(encrypted) {
            log::error!("Failed to remove {}: {e}", encrypted.display());
            report.results.push(Check::fail(format!(
                "{name} ({}) - failed to remove encrypted file",
                ui::plural(count, "host")
            )));
            continue;
        }

        report.results.push(Check::pass(format!(
            "{name} ({}) - {}",
            ui::plural(count, "host"),
            output.display()
        )));
        report.done += 1;
    }

    report
}

/// Parse and validate a plaintext hosts file, returning its host count.
fn read_hosts_file(source_name: &str, path: &Path) -> std::result::Result<usize, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let file = HostsFile::from_bytes(source_name, &bytes).map_err(|e| e.to_string())?;
    let stamped: Vec<Host> = file
        .hosts
        .into_iter()
        .map(|h| h.with_source(source_name, 0))
        .collect();
    validate_hosts(&stamped).map_err(|e| format!("invalid hosts: {e}"))?;
    Ok(stamped.len())
}

// ============================================================================
// Tests
// ============================================================================
