use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};

use football_insights::aggregator::{Aggregator, FixtureSettings, RefreshJob};
use football_insights::api::{self, AppState};
use football_insights::bot::api_client::InsightsApiClient;
use football_insights::bot::telegram::TelegramBot;
use football_insights::config::{self, AppConfig, Secrets};
use football_insights::db::store::Store;
use football_insights::models::{DateRange, FixtureScope};
use football_insights::monitoring::health::HealthState;
use football_insights::monitoring::logger;
use football_insights::provider::api_football::ApiFootballClient;
use football_insights::provider::rate_limit::RequestBudget;
use football_insights::scheduler::{self, DailySchedule};

#[derive(Parser)]
#[command(name = "football-insights", version, about = "Football statistics aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the daily refresh scheduler
    Serve,
    /// Run one refresh batch over the configured leagues and exit
    Refresh {
        #[arg(value_enum)]
        target: RefreshTarget,
        /// First day of the week window (week only)
        #[arg(long, requires = "end_date")]
        start_date: Option<NaiveDate>,
        /// Last day of the week window (week only)
        #[arg(long, requires = "start_date")]
        end_date: Option<NaiveDate>,
    },
    /// Run the Telegram bot against the HTTP API
    Bot,
}

#[derive(Clone, Copy, ValueEnum)]
enum RefreshTarget {
    Standings,
    Today,
    Week,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load()?;

    logger::init_logging(&config.monitoring)?;

    match cli.command {
        Command::Serve => run_server(config, secrets).await,
        Command::Refresh {
            target,
            start_date,
            end_date,
        } => run_refresh(config, secrets, target, start_date, end_date).await,
        Command::Bot => run_bot(config, secrets).await,
    }
}

async fn build_aggregator(config: &AppConfig, secrets: &Secrets) -> Result<Arc<Aggregator>> {
    let api_key = secrets.require_api_football_key()?;
    let budget = Arc::new(RequestBudget::from_config(&config.rate_limit));
    tracing::info!(
        max_requests = budget.capacity(),
        window_s = budget.window().as_secs(),
        "Provider request budget"
    );
    let provider = ApiFootballClient::new(&config.provider, api_key, budget)?;
    let store = Store::new(&config.database.path).await?;

    let timezone: Tz = config
        .provider
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid provider timezone: {e}"))?;
    let settings = FixtureSettings {
        status: Some(config.provider.fixture_status.clone()).filter(|s| !s.is_empty()),
        timezone,
    };

    Ok(Arc::new(Aggregator::new(
        Arc::new(provider),
        Arc::new(store),
        settings,
    )))
}

async fn run_server(config: AppConfig, secrets: Secrets) -> Result<()> {
    tracing::info!(
        bind = %config.server.bind,
        port = config.server.port,
        scheduler = config.scheduler.enabled,
        "Football insights starting"
    );

    let aggregator = build_aggregator(&config, &secrets).await?;
    let health = HealthState::new();
    let state = AppState::new(aggregator.clone(), config.leagues.path.clone(), health.clone());

    let server = api::spawn_server(state, &config.server.bind, config.server.port);

    let scheduler = if config.scheduler.enabled {
        let schedule = DailySchedule::from_config(&config.scheduler)?;
        Some(scheduler::spawn_daily_refresh(
            aggregator,
            schedule,
            config.leagues.path.clone(),
            health,
        ))
    } else {
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    if let Some(handle) = scheduler {
        handle.abort();
    }
    server.abort();

    Ok(())
}

async fn run_refresh(
    config: AppConfig,
    secrets: Secrets,
    target: RefreshTarget,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    let range = match (start_date, end_date) {
        (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
        _ => None,
    };

    let job = match target {
        RefreshTarget::Standings => RefreshJob::Standings,
        RefreshTarget::Today => RefreshJob::Fixtures {
            scope: FixtureScope::Today,
            range: None,
        },
        RefreshTarget::Week => RefreshJob::Fixtures {
            scope: FixtureScope::Week,
            range,
        },
    };
    if range.is_some() && !matches!(target, RefreshTarget::Week) {
        tracing::warn!("--start-date/--end-date only apply to week refreshes; ignored");
    }

    let leagues = config::load_leagues(&config.leagues.path)?;
    let aggregator = build_aggregator(&config, &secrets).await?;

    let report = aggregator.refresh_all_leagues(&leagues, &job).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.succeeded.is_empty() && !report.failed.is_empty() {
        bail!("{job} refresh failed for every league");
    }
    Ok(())
}

async fn run_bot(config: AppConfig, secrets: Secrets) -> Result<()> {
    let token = secrets.require_telegram_bot_token()?;
    let api = InsightsApiClient::new(&config.bot.api_base_url)?;
    let bot = TelegramBot::new(token, config.bot.poll_timeout_seconds)?;

    tracing::info!(api = %config.bot.api_base_url, "Chat bot starting");

    tokio::select! {
        result = bot.run(&api) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
