use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sipconv", about = "Conversation viewer for a SIP messaging client")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a conversation
    Show(ConversationArgs),
    /// Send a text message, then print the conversation
    Send {
        #[command(flatten)]
        conversation: ConversationArgs,
        /// Message text; surrounding whitespace is trimmed
        #[arg(short, long)]
        text: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ConversationArgs {
    /// Local SIP address, e.g. sip:me@example.org
    #[arg(short, long)]
    pub local: String,
    /// Remote SIP address of the peer or conference
    #[arg(short, long)]
    pub remote: String,
}

impl Command {
    pub fn conversation(&self) -> &ConversationArgs {
        match self {
            Self::Show(conversation) | Self::Send { conversation, .. } => conversation,
        }
    }
}
