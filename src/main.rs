use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use royale_meta::api::{self, state::AppState};
use royale_meta::config::AppConfig;
use royale_meta::fetch::{MatchSource, RoyaleClient};
use royale_meta::ingest::Ingestor;
use royale_meta::models::TimeRange;
use royale_meta::query::QueryEngine;
use royale_meta::storage::DocumentStore;

#[derive(Parser)]
#[command(name = "royale-meta")]
#[command(about = "Clash Royale battle-log collector and card meta analytics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect players and battles from the game API
    Collect {
        /// Clan name to search for (repeatable; replaces the configured list)
        #[arg(long = "clan")]
        clans: Vec<String>,

        /// Collect into memory only and print the report
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Delete every stored player and battle
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Run an analytic against the stored data and print JSON rows
    Query {
        #[command(subcommand)]
        op: QueryOp,
    },
}

#[derive(Subcommand)]
enum QueryOp {
    /// Win and loss share of a card
    VictoryPercentage {
        #[arg(long)]
        card: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Winning decks above a win percentage
    HighWinDecks {
        #[arg(long)]
        min_win_percentage: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Losses whose deck contains every card of a combo
    DefeatsWithCombo {
        /// Comma-separated card names
        #[arg(long, value_delimiter = ',', required = true)]
        combo: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Close victories by lower-rated players using a card
    SpecificVictories {
        #[arg(long)]
        card: String,
        #[arg(long)]
        trophy_diff: f64,
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },

    /// Winning combos of the first N cards
    HighWinCombos {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        combo_size: u32,
        #[arg(long)]
        min_win_percentage: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Win rate of a card before and after a balance update
    WinRateShift {
        #[arg(long)]
        card: String,
        #[arg(long)]
        update_date: NaiveDate,
    },

    /// Cards with a high win rate and a low usage rate
    WinUsageScatter {
        #[arg(long)]
        min_win_rate: f64,
        #[arg(long)]
        max_usage_rate: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Distinct card names
    Cards,

    /// Distinct battle dates
    Dates,
}

fn range(start: NaiveDate, end: NaiveDate) -> Result<TimeRange> {
    if end < start {
        bail!("--end {} is before --start {}", end, start);
    }
    Ok(TimeRange::from_dates(start, end))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_query(engine: &QueryEngine, op: QueryOp) -> Result<()> {
    match op {
        QueryOp::VictoryPercentage { card, start, end } => {
            let row = engine.victory_percentage(&card, &range(start, end)?).await;
            print_json(&vec![row])
        }
        QueryOp::HighWinDecks {
            min_win_percentage,
            start,
            end,
        } => print_json(
            &engine
                .high_win_decks(min_win_percentage, &range(start, end)?)
                .await,
        ),
        QueryOp::DefeatsWithCombo { combo, start, end } => {
            let combo: Vec<String> = combo
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if combo.is_empty() {
                bail!("--combo must name at least one card");
            }
            let row = engine.defeats_with_combo(&combo, &range(start, end)?).await;
            print_json(&vec![row])
        }
        QueryOp::SpecificVictories {
            card,
            trophy_diff,
            start,
            end,
        } => {
            let range = match (start, end) {
                (Some(start), Some(end)) => Some(range(start, end)?),
                _ => None,
            };
            let row = engine
                .specific_victories(&card, trophy_diff, range.as_ref())
                .await;
            print_json(&vec![row])
        }
        QueryOp::HighWinCombos {
            combo_size,
            min_win_percentage,
            start,
            end,
        } => print_json(
            &engine
                .high_win_combos(combo_size as usize, min_win_percentage, &range(start, end)?)
                .await,
        ),
        QueryOp::WinRateShift { card, update_date } => {
            let row = engine.win_rate_shift(&card, update_date).await;
            print_json(&vec![row])
        }
        QueryOp::WinUsageScatter {
            min_win_rate,
            max_usage_rate,
            start,
            end,
        } => print_json(
            &engine
                .win_usage_scatter(min_win_rate, max_usage_rate, &range(start, end)?)
                .await,
        ),
        QueryOp::Cards => print_json(&engine.card_names().await),
        QueryOp::Dates => print_json(&engine.battle_dates().await),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting royale-meta v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Collect { clans, dry_run } => {
            let client_config = config.api.client_config()?;
            let source: Arc<dyn MatchSource> = Arc::new(RoyaleClient::new(client_config)?);

            let store = if dry_run {
                tracing::info!("Dry run: collecting into memory");
                Arc::new(DocumentStore::in_memory())
            } else {
                Arc::new(DocumentStore::open(&config.storage())?)
            };

            let mut ingest_config = config.ingest.ingest_config();
            if !clans.is_empty() {
                ingest_config.clans = clans;
            }

            let ingestor = Ingestor::new(source, store.clone(), ingest_config);
            let report = ingestor.run().await?;
            if !dry_run {
                store.compact().await?;
            }
            print_json(&report)?;
        }
        Commands::Serve { host, port } => {
            let store = Arc::new(DocumentStore::open(&config.storage())?);
            tracing::info!(
                "Loaded {} players and {} battles",
                store.player_count().await,
                store.battle_count().await
            );

            let cors = api::cors_layer(&config.server.cors_origin)
                .with_context(|| format!("invalid cors_origin {}", config.server.cors_origin))?;
            let app = api::build_router(AppState::new(store)).layer(cors);

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("refusing to delete all data without --yes");
            }
            let store = DocumentStore::open(&config.storage())?;
            store.reset().await?;
        }
        Commands::Query { op } => {
            let store = Arc::new(DocumentStore::open(&config.storage())?);
            run_query(&QueryEngine::new(store), op).await?;
        }
    }

    Ok(())
}
