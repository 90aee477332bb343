use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use tracing_subscriber::prelude::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_log::LogTracer;
use tracing::subscriber as tracing_subscriber_global;
use anyhow::{Context, Result};
use playlist_oauth_checks as lib;
use lib::api::Clients;
use lib::config::Config;
use lib::retry::RetryPolicy;
use lib::runner::Outcome;
use lib::scenarios::{self, SuiteContext};

#[derive(Parser)]
#[command(name = "playlist-oauth-checks", version)]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the playlist scenarios against the configured service
    Run {
        /// Only run scenarios whose name matches this regex
        #[arg(long)]
        filter: Option<String>,

        /// Override the configured retry bound
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// List the registered scenarios
    List,
    /// Fetch an access token and print its expiry
    Token,
    /// Validate config file and exit
    ConfigValidate,
}

fn init_logging(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    // log -> tracing bridge; logs go to stdout and a daily-rotated file.
    let _ = LogTracer::init();
    let file_appender: RollingFileAppender = tracing_appender::rolling::daily(log_dir, "playlist-checks.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stdout));

    if let Err(e) = tracing_subscriber_global::set_global_default(subscriber) {
        eprintln!("failed to set global tracing subscriber: {}", e);
    }
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config/playlist-checks.toml"));

    if let Commands::ConfigValidate = cli.command {
        match Config::from_path(&config_path) {
            Ok(_) => println!("OK"),
            Err(e) => {
                eprintln!("Config validation failed: {}", e);
                std::process::exit(2);
            }
        }
        return Ok(());
    }

    if let Commands::List = cli.command {
        println!("{}", scenarios::render_listing(&scenarios::all()));
        return Ok(());
    }

    let cfg = Config::from_path(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let _guard = init_logging(&cfg.log_dir);
    let clients = Clients::from_config(&cfg).context("building http clients")?;

    match cli.command {
        Commands::Token => {
            clients.tokens.get_token().await.context("fetching access token")?;
            if let Some(t) = clients.tokens.snapshot().await {
                println!("Token OK, renew after {}", t.expires_at);
            }
        }
        Commands::Run { filter, max_retries } => {
            let mut selected = scenarios::all();
            if let Some(pattern) = filter {
                let re = regex::Regex::new(&pattern)
                    .with_context(|| format!("invalid filter regex '{}'", pattern))?;
                selected.retain(|s| re.is_match(s.name));
            }
            if selected.is_empty() {
                println!("No scenarios selected.");
                return Ok(());
            }

            let policy = RetryPolicy::new(max_retries.unwrap_or(cfg.max_retries));
            let ctx = Arc::new(SuiteContext::new(clients.playlists, cfg));
            let summary = lib::runner::run_scenarios(ctx, selected, policy).await;

            for r in &summary.reports {
                let label = r.label();
                match &r.outcome {
                    Outcome::Passed { attempts } => println!("PASS {} ({} attempt(s))", label, attempts),
                    Outcome::Skipped { reason } => println!("SKIP {}: {}", label, reason),
                    Outcome::Failed { attempts, error } => {
                        let kind = if error.is_auth_failure() { "AUTH" } else { "FAIL" };
                        println!("{} {} ({} attempt(s)): {}", kind, label, attempts, error);
                    }
                    Outcome::Aborted { reason } => println!("FAIL {} (aborted): {}", label, reason),
                }
            }
            println!(
                "run {}: {} passed, {} failed ({} auth), {} skipped",
                summary.run_id,
                summary.passed(),
                summary.failed(),
                summary.auth_failures(),
                summary.skipped()
            );
            if summary.failed() > 0 {
                std::process::exit(1);
            }
        }
        Commands::List | Commands::ConfigValidate => {}
    }

    Ok(())
}
