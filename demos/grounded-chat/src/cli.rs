use clap::{Parser, Subcommand, ValueEnum};

use agents_foundry::ResourceKind;

#[derive(Parser, Debug)]
#[command(
    name = "grounded-chat",
    version,
    about = "Chat with a model that searches the web through Bing-grounded agent runs"
)]
pub struct Cli {
    /// Fixed bearer token for the agent service (default: Azure CLI login)
    #[arg(long, global = true)]
    pub token: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Interactive chat loop (the default)
    Chat {
        /// Skip the canned first question
        #[arg(long)]
        no_seed: bool,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Run one grounded search and print the answer
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Delete every agent and/or thread in the project
    Purge {
        #[arg(value_enum)]
        target: PurgeTarget,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        #[arg(long, default_value_t = agents_foundry::cleanup::DEFAULT_MAX_PAGES)]
        max_pages: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PurgeTarget {
    Agents,
    Threads,
    All,
}

impl PurgeTarget {
    pub fn kinds(self) -> &'static [ResourceKind] {
        match self {
            PurgeTarget::Agents => &[ResourceKind::Agents],
            PurgeTarget::Threads => &[ResourceKind::Threads],
            PurgeTarget::All => &[ResourceKind::Agents, ResourceKind::Threads],
        }
    }
}
