//! # sshkit
//!
//! Pure Rust library for keeping managed host sections in an OpenSSH
//! client config.
//!
//! This crate provides functionality for:
//! - Loading prioritized host sources (inline, plain TOML, or age-encrypted)
//! - Parsing an existing config into local and managed entries
//! - Merging desired hosts into their own marked sections
//! - Writing the result atomically, with timestamped backups
//!
//! ## Example
//!
//! ```no_run
//! use sshkit::{Host, HostSource, SyncTarget, Syncer};
//!
//! let source = HostSource::inline(
//!     "personal",
//!     10,
//!     vec![Host::new("nas", "192.168.1.10").with_user("admin")],
//! );
//! let target = SyncTarget::new("/home/me/.ssh/config", vec![source]);
//!
//! let syncer = Syncer::new(target);
//! for change in &syncer.plan().expect("plan failed").diff().changes {
//!     println!("{} {}", change.kind, change.name);
//! }
//! syncer.sync().expect("sync failed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod diff;
pub mod error;
pub mod hosts;
pub mod sshconfig;
pub mod sync;
pub mod types;

pub use diff::{ChangeKind, DiffSummary, HostChange, SyncDiff};
pub use error::{Error, Result};
pub use hosts::{deduplicate_hosts, sort_by_priority, validate_hosts};
pub use sync::{SyncOutcome, SyncPlan, Syncer};
pub use types::{EntrySource, Host, HostSource, HostsFile, ParsedHost, SyncTarget};
