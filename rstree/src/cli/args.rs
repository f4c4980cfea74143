//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Convert flat parent/child records into forests and back, and search them
#[derive(Parser, Debug)]
#[command(name = "rstree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    /// Directory holding the local .rstree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a forest from a JSON array of flat records
    Build {
        /// JSON file with flat records ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Parent-key value of the roots, as JSON literal (e.g. 0, null, '"root"')
        #[arg(short, long, allow_hyphen_values = true)]
        root: Option<String>,

        #[command(flatten)]
        keys: KeyArgs,

        /// Field set to true on leaves and false on parents
        #[arg(long)]
        leaf_flag: Option<String>,

        /// Apply children key and leaf flag at every depth, not only to roots
        #[arg(long)]
        forward: bool,

        /// Fail instead of descending past this many levels
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Flatten a JSON forest into pre-order records
    Flatten {
        /// JSON file with a forest ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Field holding children
        #[arg(long)]
        children_key: Option<String>,

        /// Follow the children key at every depth, not only at the roots
        #[arg(long)]
        forward: bool,
    },

    /// Print the first node whose field equals a value
    Find {
        /// JSON file with a forest ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Target value, as JSON literal
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Field to compare (default: current key)
        #[arg(short, long)]
        key: Option<String>,

        /// Field holding children
        #[arg(long)]
        children_key: Option<String>,
    },

    /// Show a JSON forest as text tree
    Show {
        /// JSON file with a forest ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Field used as node label (default: current key)
        #[arg(short, long)]
        label: Option<String>,

        /// Field holding children
        #[arg(long)]
        children_key: Option<String>,
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

/// Field-name overrides for `build`
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Field holding the parent identifier
    #[arg(long)]
    pub parent_key: Option<String>,

    /// Field receiving children
    #[arg(long)]
    pub children_key: Option<String>,

    /// Field holding the node identifier
    #[arg(long)]
    pub current_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
