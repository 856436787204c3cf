use anyhow::{Context, Result};
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ollama_rs::Ollama;
use prettytable::{Cell, Row as PrettyRow, Table};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use newsgate::cycle::CycleRunner;
use newsgate::environment::{Config, LlmBackend};
use newsgate::logging;
use newsgate::monitor::RunStateMonitor;
use newsgate::rss::FeedFetcher;
use newsgate::scoring::{LlmScorer, NullScorer, Scorer};
use newsgate::store::{JsonFileStore, RunState, Store};
use newsgate::{LLMClient, LLMParams};

#[derive(Parser)]
#[clap(name = "newsgate", about = "Fetch, score and keep the news worth reading")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the run switch and run one cycle each time it is turned on (default)
    Run,

    /// Run a single cycle now, ignoring the run switch
    Once,

    /// Show the run switch and stored articles
    Status {
        /// Number of most recent articles to show
        #[clap(short, long, default_value = "20")]
        limit: usize,
    },

    /// Turn the run switch on or off
    Switch {
        #[clap(value_enum)]
        state: SwitchState,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SwitchState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    let store = Arc::new(JsonFileStore::new(&config.status_path, &config.database_path));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            std::fs::create_dir_all(&config.log_dir)
                .with_context(|| format!("creating log dir {}", config.log_dir.display()))?;
            logging::configure_logging(&config.log_dir);
            let runner = build_runner(&config, store.clone())?;
            run_worker(&config, store, runner).await;
        }
        Commands::Once => {
            std::fs::create_dir_all(&config.log_dir)
                .with_context(|| format!("creating log dir {}", config.log_dir.display()))?;
            logging::configure_logging(&config.log_dir);
            let runner = build_runner(&config, store)?;
            match runner.run_cycle().await {
                Ok(report) => info!(
                    "Cycle complete: {} fetched, {} unique, {} qualified",
                    report.fetched, report.merged, report.qualified
                ),
                Err(err) => {
                    error!("Cycle failed, nothing persisted: {}", err);
                    return Err(err.into());
                }
            }
        }
        Commands::Status { limit } => print_status(store.as_ref(), limit).await?,
        Commands::Switch { state } => {
            let is_running = matches!(state, SwitchState::On);
            store.save_run_state(RunState { is_running }).await?;
            println!("Run switch set to {}", on_off(is_running));
        }
    }

    Ok(())
}

fn build_runner(config: &Config, store: Arc<JsonFileStore>) -> Result<CycleRunner> {
    let fetcher = FeedFetcher::new(config.fetch.clone()).context("building HTTP client")?;
    let scorer = build_scorer(config);
    info!(
        "Watching {} feeds; status {}, database {}",
        config.feed_urls.len(),
        config.status_path.display(),
        config.database_path.display()
    );
    Ok(CycleRunner::new(
        store,
        Arc::new(fetcher),
        scorer,
        config.feed_urls.clone(),
    ))
}

fn build_scorer(config: &Config) -> Arc<dyn Scorer> {
    let llm_client = match &config.llm_backend {
        LlmBackend::None => {
            info!("No LLM backend configured; every item scores 0");
            return Arc::new(NullScorer);
        }
        LlmBackend::Ollama { host, port } => {
            info!("Scoring with Ollama at {}:{} using {}", host, port, config.llm_model);
            LLMClient::Ollama(Ollama::new(host.clone(), *port))
        }
        LlmBackend::OpenAI { api_key, base_url } => {
            let mut openai_config = OpenAIConfig::new();
            if let Some(key) = api_key {
                openai_config = openai_config.with_api_key(key);
            }
            if let Some(base) = base_url {
                openai_config = openai_config.with_api_base(base);
            }
            info!("Scoring with OpenAI-compatible API using {}", config.llm_model);
            LLMClient::OpenAI(OpenAIClient::with_config(openai_config))
        }
    };

    Arc::new(LlmScorer::new(
        LLMParams {
            llm_client,
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
        },
        config.score_topic.clone(),
        config.llm_timeout,
    ))
}

async fn run_worker(config: &Config, store: Arc<JsonFileStore>, runner: CycleRunner) {
    let (cancel_tx, cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            error!("Failed to listen for ctrl-c");
        }
        info!("Ctrl-C received, stopping after the current poll");
        let _ = cancel_tx.send(true);
    });

    RunStateMonitor::new(store, runner, config.poll_interval)
        .run(cancel_rx)
        .await;
}

async fn print_status(store: &dyn Store, limit: usize) -> Result<()> {
    let run_state = store.load_run_state().await?;
    let snapshot = store.load_snapshot().await?;

    println!("{}: {}", "Run switch".bright_blue(), on_off(run_state.is_running));
    println!(
        "{}: {}",
        "Last fetch".bright_blue(),
        snapshot
            .last_fetch()
            .map(|dt| format_local(&dt))
            .unwrap_or_else(|| "never".to_string())
    );
    println!("{}: {}", "Articles".bright_blue(), snapshot.articles.len());

    if snapshot.articles.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("Score"),
        Cell::new("Published"),
        Cell::new("Title"),
        Cell::new("Source"),
        Cell::new("Link"),
    ]));

    for article in snapshot.articles.iter().rev().take(limit) {
        let published = newsgate::rss::parse_date(&article.published_at)
            .map(|dt| format_local(&dt))
            .unwrap_or_else(|| article.published_at.clone());
        table.add_row(PrettyRow::new(vec![
            Cell::new(&article.score.to_string()),
            Cell::new(&published),
            Cell::new(&article.title),
            Cell::new(article.source.as_deref().unwrap_or("")),
            Cell::new(&article.link),
        ]));
    }
    table.printstd();
    Ok(())
}

fn format_local(dt: &DateTime<chrono::Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn on_off(is_running: bool) -> colored::ColoredString {
    if is_running {
        "ON".bright_green()
    } else {
        "OFF".bright_red()
    }
}
