use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for streamed replies
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "nexus")]
#[command(version, about = "Nexus - chat with streaming agents from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Agent stream endpoint
    #[arg(long, global = true, env = "NEXUS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Agent id sent with every message
    #[arg(long, global = true, env = "NEXUS_AGENT_ID")]
    pub agent: Option<String>,

    /// Bearer token for the endpoint
    #[arg(long, global = true, env = "NEXUS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file (defaults to ~/.config/nexus/config.toml)
    #[arg(long, global = true, env = "NEXUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat (default)
    Chat(ChatArgs),

    /// Send one message and stream the reply
    Send(SendArgs),

    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Default)]
pub struct ChatArgs {
    /// Conversation id to attach messages to
    #[arg(long)]
    pub conversation: Option<String>,

    /// Print the agent's reasoning as it streams
    #[arg(long)]
    pub show_thinking: bool,
}

#[derive(Args)]
pub struct SendArgs {
    /// Message text
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,

    /// Conversation id to attach the message to
    #[arg(long)]
    pub conversation: Option<String>,

    /// Print the agent's reasoning as it streams
    #[arg(long)]
    pub show_thinking: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
}
