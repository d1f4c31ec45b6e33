//! CLI definitions for typist.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// typist CLI.
#[derive(Parser)]
#[command(name = "typist")]
#[command(about = "Human-paced typing and snippet pasting into browser tabs")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/typist.toml", global = true, env = "TYPIST_CONFIG")]
    pub config: PathBuf,

    /// Browser debugging endpoint (overrides the config file)
    #[arg(short, long, global = true, env = "TYPIST_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Serve JSON-line requests on stdin/stdout (default)
    Serve,

    /// Type text into a tab at human pace
    Type {
        /// Target tab id (default: the active tab)
        #[arg(long)]
        tab: Option<String>,

        /// Text to type (default: the tab's clipboard)
        #[arg(long)]
        text: Option<String>,

        /// Type the stored snippet at this index instead
        #[arg(long, conflicts_with = "text")]
        snippet: Option<usize>,
    },

    /// Insert text into a tab all at once
    Paste {
        /// Target tab id (default: the active tab)
        #[arg(long)]
        tab: Option<String>,

        /// Text to paste (default: the tab's clipboard)
        #[arg(long)]
        text: Option<String>,

        /// Paste the stored snippet at this index instead
        #[arg(long, conflicts_with = "text")]
        snippet: Option<usize>,
    },

    /// List open browser tabs
    Tabs,

    /// Show the menu built from the stored snippets
    Menu {
        /// Output format (tree, json)
        #[arg(long, default_value = "tree")]
        format: String,
    },

    /// Snippet library commands
    Snippets {
        #[command(subcommand)]
        action: SnippetAction,
    },

    /// Typing speed settings commands
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SnippetAction {
    /// List stored snippets
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Add a snippet to the end of the list
    Add {
        /// Snippet name (shown in the menu)
        name: String,

        /// Snippet content
        content: String,
    },

    /// Remove the snippet at an index
    Remove {
        /// Index as shown by `snippets list`
        index: usize,
    },

    /// Remove every snippet
    Clear,
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Show the stored settings
    Show,

    /// Change typing speed settings
    Set {
        /// Base typing speed in words per minute
        #[arg(long)]
        wpm: Option<u32>,

        /// Minimum extra delay per character (ms)
        #[arg(long)]
        min_delay: Option<u64>,

        /// Maximum extra delay per character (ms)
        #[arg(long)]
        max_delay: Option<u64>,
    },

    /// Restore the default typing speed settings
    Reset,
}
