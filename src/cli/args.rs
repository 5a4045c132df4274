//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::HistoryFormat;

/// Export TFS version control trees and changeset history
#[derive(Parser, Debug)]
#[command(name = "tfsget")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug logging to stderr (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the project tree at one version
    Copy {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// Render the changeset history of the project path
    History {
        #[command(flatten)]
        conn: ConnectionArgs,

        /// Output format
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = FormatArg::Brief)]
        format: FormatArg,

        /// Md: use the comment when a changeset has no work item
        #[arg(long)]
        comments: bool,
    },

    /// Snapshot every changeset of the project path into C<id> directories
    Backup {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments shared by all server verbs.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Project collection url, e.g. https://tfs.example.com/tfs/DefaultCollection
    #[arg(value_hint = ValueHint::Url)]
    pub server_url: String,

    /// Server path, e.g. $/Project/Main
    pub project_path: String,

    /// Local target directory
    #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
    pub target_path: String,

    /// Version: T, C<id>, <id>, D<date>; history/backup accept a range FROM,TO
    #[arg(id = "ver", short = 'v', long = "ver")]
    pub version: Option<String>,

    /// Login as USER or USER,PASSWORD (prompts for a missing password)
    #[arg(short = 'y', long = "login")]
    pub login: Option<String>,

    /// Print connection details before processing
    #[arg(long)]
    pub verbose: bool,

    /// Suppress per-item lines and table headers
    #[arg(long, conflicts_with = "verbose")]
    pub silent: bool,
}

/// History output format names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Brief,
    Detailed,
    Csv,
    Md,
}

impl From<FormatArg> for HistoryFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Brief => HistoryFormat::Brief,
            FormatArg::Detailed => HistoryFormat::Detailed,
            FormatArg::Csv => HistoryFormat::Csv,
            FormatArg::Md => HistoryFormat::Md,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective config
    Show,

    /// Create config template
    Init,

    /// Show config path
    Path,
}
