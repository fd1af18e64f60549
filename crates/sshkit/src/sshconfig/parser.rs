//! Parser for OpenSSH client config files.
//!
//! Splits a config into `Host` blocks tagged by ownership:
//! ```text
//! Host laptop                                  <- local
//!     Hostname 192.168.1.5
//!
//! # === BEGIN MMDOT MANAGED: work ===
//! Host build                                   <- managed:work
//!     Hostname build.corp.example
//! # === END MMDOT MANAGED: work ===
//! ```
//! Untouched blocks keep their exact text so they can be written back
//! unchanged.

use super::{BEGIN_MARKER, END_MARKER, MARKER_SUFFIX};
use crate::error::{Error, Result};
use crate::types::{EntrySource, ParsedHost};
use std::path::Path;

/// A config file split into the parts the merge works on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Raw text, `None` when the file does not exist
    pub content: Option<String>,
    /// Global directives above the first `Host` block or managed section
    pub preamble: Vec<String>,
    /// Host entries in file order
    pub entries: Vec<ParsedHost>,
}

/// Reads SSH config text into ownership-tagged host entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    preserve_local: bool,
}

impl Parser {
    /// Create a parser.
    ///
    /// With `preserve_local` set, the contents of managed sections are
    /// dropped entirely; only local entries are returned.
    pub fn new(preserve_local: bool) -> Self {
        Self { preserve_local }
    }

    /// Read and parse the config at `path`.
    ///
    /// A missing file is a first run and yields an empty [`ConfigFile`].
    pub fn parse_file(&self, path: &Path) -> Result<ConfigFile> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", path.display());
                return Ok(ConfigFile::default());
            }
            Err(e) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let content = decode(path, bytes)?;
        let (preamble, entries) = self.split(&content);
        Ok(ConfigFile {
            content: Some(content),
            preamble,
            entries,
        })
    }

    /// Parse config text into host entries.
    pub fn parse_str(&self, content: &str) -> Vec<ParsedHost> {
        self.split(content).1
    }

    fn split(&self, content: &str) -> (Vec<String>, Vec<ParsedHost>) {
        let mut state = State::default();

        for line in content.lines() {
            let trimmed = line.trim();

            if let Some(name) = marker_name(trimmed, BEGIN_MARKER) {
                state.close();
                state.end_preamble();
                state.section = Some(name.to_string());
                continue;
            }
            if marker_name(trimmed, END_MARKER).is_some() {
                state.close();
                state.section = None;
                continue;
            }

            if state.section.is_some() && self.preserve_local {
                continue;
            }

            if let Some(name) = host_name(trimmed) {
                state.open(name, line);
                continue;
            }

            if let Some(host) = state.current.as_mut() {
                host.lines.push(line.to_string());
            } else if !state.seen_block {
                state.preamble.push(line.to_string());
            } else if trimmed.starts_with('#') {
                state.pending.push(line.to_string());
            } else {
                state.discard(trimmed);
            }
        }

        state.close();
        state.end_preamble();

        if state.dropped > 0 {
            log::warn!(
                "ignored {} line(s) outside any Host block; they will not be written back",
                state.dropped
            );
        }

        (state.preamble, state.entries)
    }
}

/// Decode config bytes, naming the first line that is not UTF-8.
fn decode(path: &Path, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        Error::Encoding {
            path: path.to_path_buf(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
        }
    })
}

#[derive(Default)]
struct State {
    section: Option<String>,
    current: Option<ParsedHost>,
    pending: Vec<String>,
    entries: Vec<ParsedHost>,
    preamble: Vec<String>,
    seen_block: bool,
    dropped: usize,
}

impl State {
    fn tag(&self) -> EntrySource {
        match &self.section {
            Some(name) => EntrySource::managed(name.clone()),
            None => EntrySource::Local,
        }
    }

    /// Start a new entry, moving comments that sit directly above the
    /// `Host` line out of the previous body.
    fn open(&mut self, name: &str, line: &str) {
        let comments = match self.current.as_mut() {
            Some(previous) => take_trailing_comments(&mut previous.lines),
            None if !self.seen_block => take_trailing_comments(&mut self.preamble),
            None => std::mem::take(&mut self.pending),
        };
        self.close();
        self.end_preamble();

        self.current = Some(ParsedHost {
            name: name.to_string(),
            lines: vec![line.to_string()],
            comments,
            source: self.tag(),
        });
    }

    /// Flush the open entry; trailing blank lines are separators.
    fn close(&mut self) {
        if let Some(mut host) = self.current.take() {
            while host.lines.last().is_some_and(|l| l.trim().is_empty()) {
                host.lines.pop();
            }
            self.entries.push(host);
        }
        self.dropped += self.pending.len();
        self.pending.clear();
    }

    /// Close the preamble; surrounding blank lines are separators.
    fn end_preamble(&mut self) {
        if self.seen_block {
            return;
        }
        self.seen_block = true;
        while self.preamble.last().is_some_and(|l| l.trim().is_empty()) {
            self.preamble.pop();
        }
        let leading = self
            .preamble
            .iter()
            .take_while(|l| l.trim().is_empty())
            .count();
        self.preamble.drain(..leading);
    }

    /// A line outside any body breaks the pending comment block.
    fn discard(&mut self, trimmed: &str) {
        self.dropped += self.pending.len();
        self.pending.clear();
        if !trimmed.is_empty() {
            self.dropped += 1;
        }
    }
}

/// Detach the run of unindented comments at the end of a host body.
fn take_trailing_comments(lines: &mut Vec<String>) -> Vec<String> {
    let keep = lines
        .iter()
        .rposition(|l| !l.starts_with('#'))
        .map_or(0, |i| i + 1);
    lines.split_off(keep)
}

/// Extract the section name from a BEGIN/END marker line.
fn marker_name<'a>(trimmed: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = trimmed.strip_prefix(prefix)?.trim();
    let name = rest.strip_suffix(MARKER_SUFFIX).unwrap_or(rest).trim();
    Some(name)
}

/// Match a `Host <patterns>` line; the keyword is case-insensitive.
fn host_name(trimmed: &str) -> Option<&str> {
    let keyword = trimmed.get(..4)?;
    if !keyword.eq_ignore_ascii_case("host") {
        return None;
    }
    let rest = &trimmed[4..];
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '=') {
        return None;
    }
    let name = rest.trim_start().trim_start_matches('=').trim();
    (!name.is_empty()).then_some(name)
}
