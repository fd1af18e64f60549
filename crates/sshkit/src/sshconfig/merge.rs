//! Merging desired hosts into parsed config entries.
//!
//! Each source owns exactly one managed section. Merging a source replaces
//! that section wholesale and leaves every other entry where it was, so
//! sources can be folded in one after another.

use crate::error::{Error, Result};
use crate::types::{EntrySource, Host, ParsedHost};
use std::collections::{HashMap, HashSet};

/// Replace the managed section of `source_name` with `desired`.
///
/// For each existing entry, in order:
/// 1. entries of `managed:<source_name>` are dropped;
/// 2. non-local entries whose name is desired are dropped;
/// 3. everything else is retained.
///
/// The desired hosts are appended after the retained entries.
pub fn merge_hosts(
    existing: Vec<ParsedHost>,
    desired: &[Host],
    source_name: &str,
) -> Vec<ParsedHost> {
    let tag = EntrySource::managed(source_name);
    let desired_names: HashSet<&str> = desired.iter().map(|h| h.name.as_str()).collect();

    let mut merged: Vec<ParsedHost> = existing
        .into_iter()
        .filter(|entry| {
            if entry.source == tag {
                return false;
            }
            if !entry.source.is_local() && desired_names.contains(entry.name.as_str()) {
                log::debug!(
                    "host {} from {} superseded by {}",
                    entry.name,
                    entry.source,
                    tag
                );
                return false;
            }
            true
        })
        .collect();

    merged.extend(desired.iter().map(|host| ParsedHost::from_host(host, source_name)));
    merged
}

/// Fold `merge_hosts` over every source present in `desired`.
///
/// Sources are merged in order of first appearance, which for a
/// priority-sorted batch is also the order their sections are written.
pub fn merge_sources(existing: Vec<ParsedHost>, desired: &[Host]) -> Vec<ParsedHost> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_source: HashMap<&str, Vec<Host>> = HashMap::new();

    for host in desired {
        by_source
            .entry(host.source.as_str())
            .or_insert_with(|| {
                order.push(host.source.as_str());
                Vec::new()
            })
            .push(host.clone());
    }

    order.into_iter().fold(existing, |merged, source| {
        let hosts = by_source.get(source).map(Vec::as_slice).unwrap_or_default();
        merge_hosts(merged, hosts, source)
    })
}

/// Reject merged entries that would write the same host name twice.
pub fn validate_entries(entries: &[ParsedHost]) -> Result<()> {
    let mut seen: HashMap<&str, &EntrySource> = HashMap::new();

    for entry in entries {
        if entry.name.is_empty() {
            return Err(Error::Validation("host name cannot be empty".to_string()));
        }
        if let Some(first) = seen.insert(&entry.name, &entry.source) {
            return Err(Error::DuplicateEntry {
                name: entry.name.clone(),
                first: first.to_string(),
                second: entry.source.to_string(),
            });
        }
    }

    Ok(())
}
