//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// File format of `results export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Markdown document, one section per result
    Markdown,
    /// Pretty-printed JSON array
    Json,
}

/// CLI arguments for chatlist
#[derive(Parser, Debug)]
#[command(name = "chatlist")]
#[command(author, version, about = "Ask several AI models the same prompt and compare the answers")]
#[command(long_about = r#"
ChatList sends one prompt to every active model at once and shows the answers
side by side. Nothing is stored until you choose which answers to keep.

Configuration files are loaded from (in priority order):
1. CHATLIST_* environment variables
2. --config <path>     Explicit config file
3. ./chatlist.toml     Project-level config
4. ~/.config/chatlist/config.toml   Global config

Example:
  chatlist models add gpt https://api.openai.com/v1/chat/completions --api-id OPENAI_API_KEY
  chatlist ask "What's the best way to handle errors in Rust?" --tag rust
  chatlist ask "Explain lifetimes" --save gpt
  chatlist results export --format markdown --out answers.md
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a prompt to every active model
    Ask(AskArgs),

    /// Manage configured models
    Models {
        #[command(subcommand)]
        action: ModelsCommand,
    },

    /// Browse saved prompts
    Prompts {
        #[command(subcommand)]
        action: PromptsCommand,
    },

    /// Browse, delete and export saved results
    Results {
        #[command(subcommand)]
        action: ResultsCommand,
    },

    /// Read and change dispatch settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The prompt to send
    #[arg(required_unless_present = "prompt_id")]
    pub prompt: Option<String>,

    /// Re-run a saved prompt instead of passing its text
    #[arg(long, value_name = "ID", conflicts_with_all = ["prompt", "tags"])]
    pub prompt_id: Option<i64>,

    /// Tag for the saved prompt (can be specified multiple times)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Save answers: all successful ones, or only the named models
    #[arg(long, value_name = "MODEL", num_args = 0..)]
    pub save: Option<Vec<String>>,

    /// Print the outcome map as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List all models
    List,

    /// Add a model endpoint
    Add {
        /// Unique display name
        name: String,
        /// Chat-completions endpoint URL
        url: String,
        /// Environment variable holding the API key
        #[arg(long, value_name = "ENV_VAR")]
        api_id: String,
        /// Add the model without activating it
        #[arg(long)]
        inactive: bool,
    },

    /// Change fields of a model
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_name = "ENV_VAR")]
        api_id: Option<String>,
    },

    /// Activate or deactivate a model
    Toggle { id: i64 },

    /// Delete a model that has no saved results
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum PromptsCommand {
    /// List saved prompts, newest first
    List,

    /// Save a prompt without sending it
    Add {
        text: String,
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Find prompts by text or tag
    Search { query: String },

    /// Show a prompt with its saved answers
    Show { id: i64 },

    /// Delete a prompt and all of its results
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ResultsCommand {
    /// List saved results, newest first
    List {
        /// Only results of this prompt
        #[arg(long, value_name = "PROMPT_ID")]
        prompt: Option<i64>,
    },

    /// Find results by answer, prompt or model name
    Search { query: String },

    /// Delete one result
    Delete { id: i64 },

    /// Write saved results to a file
    Export {
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ExportFormat,

        /// Destination file
        #[arg(short, long, value_name = "PATH")]
        out: PathBuf,

        /// Only results matching this text
        #[arg(long)]
        query: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// List stored settings
    List,

    /// Show one setting
    Get { key: String },

    /// Insert or replace a setting
    Set { key: String, value: String },
}
