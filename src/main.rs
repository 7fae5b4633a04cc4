use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use home_data::config::Config;
use home_data::constants::{DEFAULT_CONFIG_PATH, DEFAULT_PROVIDER};
use home_data::logging;
use home_data::metrics;
use home_data::pipeline::NormalizationPipeline;
use home_data::providers::{LocationQuery, ProviderRegistry};
use home_data::schema::FieldSet;
use home_data::server::{self, AppState};

#[derive(Parser)]
#[command(name = "home_data")]
#[command(about = "Normalized home data from third-party real-estate providers")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the home data API
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Look a single home up and print the normalized result as JSON
    Lookup {
        #[arg(long)]
        address: String,
        #[arg(long)]
        zip: String,
        /// Canonical fields to return (comma-separated), e.g. sewer,has_septic
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let registry = Arc::new(ProviderRegistry::from_config(&config)?);
    let pipeline = Arc::new(NormalizationPipeline::from_settings(&config.pipeline));

    match cli.command {
        Commands::Serve { bind } => {
            metrics::init_metrics();
            let bind = bind.unwrap_or(config.server.bind);
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address '{bind}'"))?;
            info!(providers = ?registry.list_providers(), "Starting home data API");
            server::serve(addr, AppState { registry, pipeline }).await?;
        }
        Commands::Lookup {
            address,
            zip,
            fields,
            provider,
        } => {
            let (fields, ignored) = FieldSet::parse_lenient(&fields);
            if !ignored.is_empty() {
                eprintln!("Ignoring unknown fields: {}", ignored.join(", "));
            }
            let adapter = registry.resolve(&provider)?;
            let data = pipeline
                .run(adapter.as_ref(), &LocationQuery::new(address, zip), &fields)
                .await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}
