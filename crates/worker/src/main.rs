use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskterm_core::config::{FeedOptions, Settings};
use riskterm_core::ingest::{provider_from_settings, CachedHistoryProvider, PriceHistoryProvider};
use riskterm_core::scoring::{HedgeConfig, MIN_SESSIONS};

mod cycle;

#[derive(Debug, Parser)]
#[command(name = "riskterm_worker")]
struct Args {
    /// Portfolio dollar beta to size the hedge against.
    #[arg(long, default_value_t = 100_000.0)]
    exposure: f64,

    /// Run a single refresh and exit. Exits non-zero if the cycle failed.
    #[arg(long)]
    once: bool,

    /// Seconds between refreshes. Overrides REFRESH_INTERVAL_SECS.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Sessions of history to request. Overrides HISTORY_WINDOW_SESSIONS.
    #[arg(long)]
    window: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let mut feed = FeedOptions::from_env();
    if let Some(secs) = args.interval_secs.filter(|s| *s > 0) {
        feed.refresh_interval = std::time::Duration::from_secs(secs);
    }
    if let Some(window) = args.window {
        feed.window = window;
    }
    anyhow::ensure!(
        feed.window >= MIN_SESSIONS,
        "window must be at least {MIN_SESSIONS} sessions (got {})",
        feed.window
    );

    let hedge = HedgeConfig::from_env();
    let provider = provider_from_settings(&settings, &feed).context("build price provider failed")?;
    let provider = CachedHistoryProvider::new(provider, feed.cache_ttl);

    tracing::info!(
        provider = provider.provider_name(),
        window = feed.window,
        interval_secs = feed.refresh_interval.as_secs(),
        exposure = args.exposure,
        once = args.once,
        "worker starting"
    );

    if args.once {
        let outcome = cycle::run_cycle(&provider, feed.window, args.exposure, &hedge, chrono::Utc::now()).await;
        emit(&outcome)?;
        anyhow::ensure!(outcome.is_success(), "refresh cycle failed");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(feed.refresh_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = cycle::run_cycle(&provider, feed.window, args.exposure, &hedge, chrono::Utc::now()).await;
                if let Err(err) = emit(&outcome) {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "failed to emit cycle outcome");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

fn emit(outcome: &cycle::CycleOutcome) -> anyhow::Result<()> {
    let line = serde_json::to_string(outcome).context("serialize cycle outcome failed")?;
    println!("{line}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
