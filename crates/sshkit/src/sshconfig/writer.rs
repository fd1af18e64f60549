//! Writer for generating SSH config content.
//!
//! Two layouts are supported:
//! - linear: entries in order, one blank line apart, no markers
//! - grouped: local entries first, then one marked section per source

use super::{BEGIN_MARKER, END_MARKER, MARKER_SUFFIX};
use crate::types::{EntrySource, ParsedHost};
use std::io::{self, Write};

/// Write entries to `out`, stopping at the first write error.
pub fn write_config<W: Write>(
    out: &mut W,
    entries: &[ParsedHost],
    grouped: bool,
) -> io::Result<()> {
    if grouped {
        write_grouped(out, entries)
    } else {
        write_linear(out, entries)
    }
}

/// Render entries to a string.
pub fn write_string(entries: &[ParsedHost], grouped: bool) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_config(&mut buf, entries, grouped);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render a whole file: global directives, a blank line, then grouped entries.
pub fn write_document(preamble: &[String], entries: &[ParsedHost]) -> String {
    let mut out = String::new();
    for line in preamble {
        out.push_str(line);
        out.push('\n');
    }
    if !preamble.is_empty() {
        out.push('\n');
    }
    out.push_str(&write_string(entries, true));
    out
}

fn write_linear<W: Write>(out: &mut W, entries: &[ParsedHost]) -> io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_entry(out, entry)?;
    }
    Ok(())
}

fn write_grouped<W: Write>(out: &mut W, entries: &[ParsedHost]) -> io::Result<()> {
    let mut sections: Vec<(&str, Vec<&ParsedHost>)> = Vec::new();
    let mut local: Vec<&ParsedHost> = Vec::new();

    for entry in entries {
        match &entry.source {
            EntrySource::Local => local.push(entry),
            EntrySource::Managed(name) => {
                match sections.iter_mut().find(|(n, _)| *n == name.as_str()) {
                    Some((_, hosts)) => hosts.push(entry),
                    None => sections.push((name.as_str(), vec![entry])),
                }
            }
        }
    }

    if !local.is_empty() {
        write_block(out, &local)?;
        writeln!(out)?;
    }

    for (name, hosts) in sections {
        writeln!(out, "{BEGIN_MARKER} {name} {MARKER_SUFFIX}")?;
        write_block(out, &hosts)?;
        writeln!(out, "{END_MARKER} {name} {MARKER_SUFFIX}")?;
        writeln!(out)?;
    }

    Ok(())
}

/// Entries separated by single blank lines.
fn write_block<W: Write>(out: &mut W, entries: &[&ParsedHost]) -> io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_entry(out, entry)?;
    }
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, entry: &ParsedHost) -> io::Result<()> {
    for comment in &entry.comments {
        writeln!(out, "{comment}")?;
    }
    for line in &entry.lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
