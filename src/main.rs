//! Geocluster command line entry point

use clap::{Parser, Subcommand};
use geocluster::config::PipelineConfig;
use geocluster::observability::init_default_logging;
use geocluster::Pipeline;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

/// Geospatial order clustering and route enrichment
#[derive(Parser)]
#[command(name = "geocluster")]
#[command(about = "Cluster delivery orders by geo cell and enrich drafted routes")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "GEOCLUSTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load inputs, cluster orders and print the clustered artifact
    Cluster {
        /// Write the artifact to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Cluster, then enrich the route drafts in FILE
    Enrich {
        /// Route set, `{"routes": [...]}` or a bare list
        #[arg(long, value_name = "FILE")]
        routes: PathBuf,
    },
    /// Cluster, record stage outputs and print per-stage fleet metrics
    Summarize {
        /// Stage output to record, as STORE_KEY=FILE (repeatable)
        #[arg(long = "stage", value_name = "KEY=FILE", value_parser = parse_stage_arg)]
        stages: Vec<(String, PathBuf)>,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Cluster { output } => cluster(config, output).await,
        Commands::Enrich { routes } => enrich(config, &routes).await,
        Commands::Summarize { stages } => summarize(config, stages).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> CliResult<PipelineConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_file(path)?)
        }
        None => {
            for path_str in ["geocluster.toml", "config/geocluster.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(PipelineConfig::load_from_file(&path)?);
                }
            }

            Err("No configuration file found. Provide one with -c/--config or create geocluster.toml".into())
        }
    }
}

async fn cluster(config: PipelineConfig, output: Option<PathBuf>) -> CliResult<()> {
    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run_clustering()?;

    info!(
        run_id = %report.run_id,
        issues = report.issues.len(),
        inventory_shortfalls = report.inventory_issues.len(),
        "Clustering complete"
    );

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&report.clustered)?;
            tokio::fs::write(&path, json).await?;
            info!("Clustered artifact written to {}", path.display());
            Ok(())
        }
        None => print_json(&report.clustered),
    }
}

async fn enrich(config: PipelineConfig, routes_path: &Path) -> CliResult<()> {
    let routes = read_json(routes_path).await?;

    let pipeline = Pipeline::new(config)?;
    pipeline.run_clustering()?;

    let outcomes = pipeline.enrich_route_values(&routes)?;
    let enriched: Vec<_> = outcomes.into_iter().map(|outcome| outcome.route).collect();
    print_json(&serde_json::json!({ "routes": enriched }))
}

async fn summarize(config: PipelineConfig, stages: Vec<(String, PathBuf)>) -> CliResult<()> {
    let pipeline = Pipeline::new(config)?;
    pipeline.run_clustering()?;

    for (key, path) in stages {
        let value = read_json(&path).await?;
        pipeline.record_stage(&key, value);
    }

    print_json(&pipeline.collect_metrics())
}

fn handle_config_command(config: &PipelineConfig, show: bool) -> CliResult<()> {
    config.validate()?;
    info!("Configuration is valid");

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    Ok(())
}

async fn read_json(path: &Path) -> CliResult<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_stage_arg(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((key, path)) if !key.is_empty() && !path.is_empty() => {
            Ok((key.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected KEY=FILE, got '{arg}'")),
    }
}
