//! Contrarx service entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contrarx::api::{serve, ApiState, RestApiConfig};
use contrarx::config::Config;
use contrarx::interactions::InteractionEngine;
use contrarx::model::RiskRating;
use contrarx::resolver::DrugResolver;
use contrarx::store::{DrugStore, SqliteStore};
use contrarx::{create_provider, create_source};

/// Contrarx: Drug Interaction Analysis Service
#[derive(Parser, Debug)]
#[command(name = "contrarx")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,
    },
    /// Resolve a drug by name
    Resolve {
        /// Free-text drug name
        name: String,
    },
    /// Resolve two or more drugs and analyze every pair
    Analyze {
        /// Drug names (at least two)
        #[arg(num_args = 2..)]
        names: Vec<String>,
    },
    /// Show store statistics
    Stats,
}

/// Shared service context built from configuration.
struct Context {
    resolver: Arc<DrugResolver>,
    engine: Arc<InteractionEngine>,
    store: Arc<dyn DrugStore>,
}

fn build_context(config: &Config) -> anyhow::Result<Context> {
    let store: Arc<dyn DrugStore> = Arc::new(SqliteStore::open(&config.db_path())?);
    let source = Arc::from(create_source(&config.source)?);
    let provider = Arc::from(create_provider(&config.reasoning)?);

    Ok(Context {
        resolver: Arc::new(DrugResolver::new(store.clone(), source)),
        engine: Arc::new(InteractionEngine::new(store.clone(), provider)),
        store,
    })
}

fn load_config(path: &Option<String>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let is_serve = matches!(args.command, Some(Command::Serve { .. }) | None);
    if !is_serve {
        // Minimal logging for CLI commands
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }

    match args.command {
        Some(Command::Serve { port, json_logs }) => {
            run_server(&args.config, port, json_logs).await
        }
        Some(Command::Resolve { name }) => run_resolve(&args.config, &name, args.json).await,
        Some(Command::Analyze { names }) => run_analyze(&args.config, &names, args.json).await,
        Some(Command::Stats) => run_stats(&args.config, args.json).await,
        None => run_server(&args.config, None, false).await,
    }
}

async fn run_server(
    config_path: &Option<String>,
    port: Option<u16>,
    json_logs: bool,
) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting contrarx v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(config_path)?;
    let context = build_context(&config)?;
    let state = Arc::new(ApiState::new(
        context.resolver,
        context.engine,
        context.store,
    ));

    let rest_config = RestApiConfig {
        enable_cors: config.server.enable_cors,
        ..RestApiConfig::default()
    };
    let port = port.unwrap_or(config.server.http_port);

    serve(state, &rest_config, port).await?;
    Ok(())
}

async fn run_resolve(
    config_path: &Option<String>,
    name: &str,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let context = build_context(&config)?;

    let resolution = context.resolver.resolve(name).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&resolution.drug)?);
        return Ok(());
    }

    let drug = &resolution.drug;
    println!(
        "{} [{}] ({})",
        drug.name,
        drug.category,
        if resolution.hit_cache {
            "cache hit"
        } else {
            "fetched"
        }
    );
    println!("{}", drug.description());
    Ok(())
}

async fn run_analyze(
    config_path: &Option<String>,
    names: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let context = build_context(&config)?;

    let mut drugs = Vec::with_capacity(names.len());
    for name in names {
        drugs.push(context.resolver.resolve(name).await?.drug);
    }

    let mut reports = context.engine.analyze(&drugs).await?;
    // Most severe first for terminal reading.
    reports.sort_by_key(|r| r.rating.severity_rank());

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        let marker = match report.rating {
            RiskRating::Prohibited => "!!",
            RiskRating::Warning => " !",
            RiskRating::Safe => "ok",
            RiskRating::Unknown => " ?",
        };
        println!(
            "[{marker}] {} + {}: {} ({})",
            report.drug1_name,
            report.drug2_name,
            report.summary,
            report.rating.as_str()
        );
        if !report.details.is_empty() {
            println!("     {}", report.details);
        }
    }
    Ok(())
}

async fn run_stats(config_path: &Option<String>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store: Arc<dyn DrugStore> = Arc::new(SqliteStore::open(&config.db_path())?);

    let stats = store.stats().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("drugs:    {}", stats.drug_count);
    println!("verdicts: {}", stats.verdict_count);
    println!("lookups:  {}", stats.lookup_count);
    Ok(())
}
