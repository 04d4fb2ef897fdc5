mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use agents_foundry::{
    AzureCliTokenProvider, BingSearchTool, BulkCleanup, CachedTokenProvider, CancellationToken,
    FoundryClient, FoundryConfig, GroundedSearch, StaticTokenProvider, TokenProvider,
};
use agents_runtime::{AzureOpenAiConfig, ChatAgentBuilder, OpenAiChatModel};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, PurgeTarget};

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant. \
Use the bing_search tool whenever a question needs current information from the web, \
and mention the sources it returns.";

const RULE: &str = "----------------------------------------------------------";

fn seed_prompt(today: NaiveDate) -> String {
    let yesterday = today - Duration::days(1);
    format!("tell me yesterday's {} Tesla news", yesterday.format("%Y-%m-%d"))
}

fn token_provider(token: Option<String>) -> Arc<dyn TokenProvider> {
    match token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(CachedTokenProvider::new(AzureCliTokenProvider::default())),
    }
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cleaning up");
            token.cancel();
        }
    });
}

async fn run_chat(
    search: Arc<GroundedSearch>,
    no_seed: bool,
    instructions: Option<String>,
) -> anyhow::Result<()> {
    let model = Arc::new(OpenAiChatModel::azure(AzureOpenAiConfig::from_env()?)?);
    let instructions = instructions.unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());
    let agent = ChatAgentBuilder::new(instructions)
        .with_model(model)
        .with_tool(Arc::new(BingSearchTool::new(search)))
        .build()?;

    println!("{RULE}");
    println!("Type a question, or 'exit' to quit.");

    let stdin = io::stdin();
    let mut pending = (!no_seed).then(|| seed_prompt(Local::now().date_naive()));
    loop {
        let input = match pending.take() {
            Some(seed) => {
                println!("User > {seed}");
                seed
            }
            None => {
                print!("User > ");
                io::stdout().flush().ok();
                let mut line = String::new();
                if stdin.read_line(&mut line)? == 0 {
                    break;
                }
                line.trim().to_string()
            }
        };

        if input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.handle_message(&input).await {
            Ok(reply) => println!("Assistant > {}\n", reply.content.to_text()),
            Err(err) => {
                tracing::error!(error = %err, "chat turn failed");
                println!("Error occurred: {err}\n");
            }
        }
    }
    Ok(())
}

async fn run_search(search: &GroundedSearch, query: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    println!("{RULE}");
    println!("Start Grounding with Bing Search");
    let outcome = search.search_with_cancel(query, &cancel).await?;
    println!("{RULE}");
    println!("{}", outcome.answer);
    println!("{RULE}");
    Ok(())
}

async fn run_purge(
    config: &FoundryConfig,
    tokens: Arc<dyn TokenProvider>,
    target: PurgeTarget,
    yes: bool,
    max_pages: usize,
) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!(
            "purge deletes every {target:?} resource in {}; re-run with --yes to confirm",
            config.endpoint
        );
    }

    let client = Arc::new(FoundryClient::from_config(config, tokens)?);
    let cleanup = BulkCleanup::new(client).with_max_pages(max_pages);
    for &kind in target.kinds() {
        let report = cleanup.purge_all(kind).await?;
        println!(
            "{kind}: deleted {}, failed {}, pages {}",
            report.deleted, report.failed, report.pages
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();
    let config = FoundryConfig::from_env()?;
    let tokens = token_provider(cli.token);

    match cli.command.unwrap_or(Command::Chat {
        no_seed: false,
        instructions: None,
    }) {
        Command::Chat {
            no_seed,
            instructions,
        } => {
            let search = Arc::new(GroundedSearch::from_config(&config, tokens)?);
            run_chat(search, no_seed, instructions).await
        }
        Command::Search { query } => {
            let search = GroundedSearch::from_config(&config, tokens)?;
            run_search(&search, &query.join(" ")).await
        }
        Command::Purge {
            target,
            yes,
            max_pages,
        } => run_purge(&config, tokens, target, yes, max_pages).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_asks_about_the_previous_day() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(seed_prompt(today), "tell me yesterday's 2025-02-28 Tesla news");
    }

    #[tokio::test]
    async fn purge_requires_confirmation() {
        let config = FoundryConfig::new("https://example.invalid", "conn-1");
        let tokens: Arc<dyn TokenProvider> = Arc::new(StaticTokenProvider::new("t"));
        let err = run_purge(&config, tokens, PurgeTarget::All, false, 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }
}
