//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shadow Folder - Keep directories mirrored from git branches
#[derive(Parser, Debug)]
#[command(name = "shadow-folder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(
        short,
        long,
        global = true,
        env = "SHADOW_FOLDER_CONFIG",
        default_value = "shadow-folder.toml"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start every mirror, run the startup synchronization and exit
    Sync,

    /// Start every mirror and poll the served repositories for changes
    Watch {
        /// Seconds between polls (overrides `server.poll_interval`)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Dispatch git post-receive input read from stdin
    ///
    /// Install as `hooks/post-receive` in a served repository:
    ///   shadow-folder -c /etc/shadow-folder.toml hook my-repo
    Hook {
        /// Repository that received the push
        repository: String,
    },

    /// Resolve every mirror against the server and report
    Check,
}
