use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "mmdot")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Dotfiles utility for managing SSH hosts across machines", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(
        short,
        long,
        global = true,
        env = ENV_CONFIG_PATH,
        default_value = "mmdot.toml"
    )]
    pub config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage SSH hosts in ~/.ssh/config
    #[command(subcommand)]
    Ssh(SshCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// SSH Commands
// ============================================================================

#[derive(Subcommand)]
pub enum SshCommand {
    /// Write configured hosts into the SSH config
    Sync {
        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show differences between the SSH config and configured hosts
    Diff,

    /// Check host sources for errors
    Validate,

    /// List configured hosts
    List {
        /// Only show hosts from sources with any of these tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Encrypt plaintext hosts files with age
    Encrypt,

    /// Decrypt age-encrypted hosts files
    Decrypt,
}
