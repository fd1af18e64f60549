//! Diff computation between the current and the merged SSH config.

use crate::types::{EntrySource, ParsedHost};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// How a host changes when the merged config is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Host only present in the merged config
    Added,
    /// Host present in both with different lines
    Modified,
    /// Managed host that disappears
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// A single host change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostChange {
    /// Host name
    pub name: String,
    /// Kind of change
    pub kind: ChangeKind,
    /// Tag of the merged entry, or of the removed one
    pub source: EntrySource,
    /// Lines currently on disk
    pub before: Vec<String>,
    /// Lines that will be written
    pub after: Vec<String>,
}

/// Changes a sync would make, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncDiff {
    /// Every change; additions and modifications first, then removals
    pub changes: Vec<HostChange>,
}

impl SyncDiff {
    /// Classify by host name.
    ///
    /// Only managed entries are ever reported as removed.
    pub fn compute(existing: &[ParsedHost], merged: &[ParsedHost]) -> Self {
        let before: HashMap<&str, &ParsedHost> =
            existing.iter().map(|e| (e.name.as_str(), e)).collect();
        let after: HashSet<&str> = merged.iter().map(|e| e.name.as_str()).collect();

        let mut changes = Vec::new();

        for entry in merged {
            match before.get(entry.name.as_str()) {
                None => changes.push(HostChange {
                    name: entry.name.clone(),
                    kind: ChangeKind::Added,
                    source: entry.source.clone(),
                    before: Vec::new(),
                    after: entry.lines.clone(),
                }),
                Some(old) if old.lines != entry.lines => changes.push(HostChange {
                    name: entry.name.clone(),
                    kind: ChangeKind::Modified,
                    source: entry.source.clone(),
                    before: old.lines.clone(),
                    after: entry.lines.clone(),
                }),
                Some(_) => {}
            }
        }

        for entry in existing {
            if !entry.source.is_local() && !after.contains(entry.name.as_str()) {
                changes.push(HostChange {
                    name: entry.name.clone(),
                    kind: ChangeKind::Removed,
                    source: entry.source.clone(),
                    before: entry.lines.clone(),
                    after: Vec::new(),
                });
            }
        }

        Self { changes }
    }

    /// Whether anything would change.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes of one kind.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &HostChange> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }

    /// Count changes per kind.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for change in &self.changes {
            match change.kind {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Modified => summary.modified += 1,
                ChangeKind::Removed => summary.removed += 1,
            }
        }
        summary
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Hosts to add
    pub added: usize,
    /// Hosts to modify
    pub modified: usize,
    /// Managed hosts to remove
    pub removed: usize,
}

impl DiffSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} modified, {} removed",
            self.added, self.modified, self.removed
        )
    }
}
