use std::path::PathBuf;
use std::sync::Arc;

use alloy_provider::{Provider, ProviderBuilder};
use clap::Parser;
use eyre::Result;
use serde::Serialize;

use ethscriptions_indexer::config::Config;
use ethscriptions_indexer::deposit::DepositBuilder;
use ethscriptions_indexer::driver::BlockImporter;
use ethscriptions_indexer::engine::auth::JwtSecret;
use ethscriptions_indexer::engine::EngineApi;
use ethscriptions_indexer::l1::{Prefetcher, RpcL1Source};
use ethscriptions_indexer::telemetry;
use ethscriptions_indexer::validation::{SqliteValidationStore, ValidationStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose)?;
    telemetry::shutdown::register_shutdown();

    let config = Config::load(&cli.config, &cli)?;

    let secret = JwtSecret::from_hex(std::fs::read_to_string(&cli.jwt_secret)?.trim())?;
    let provider = ProviderBuilder::new().on_http(config.l1_rpc_url.parse()?).boxed();
    let l1_tip = provider.get_block_number().await?;
    tracing::info!(target: "ethscriptions_indexer", l1_tip, "connected to L1");

    let source = Arc::new(RpcL1Source::new(provider));
    let prefetcher = Arc::new(Prefetcher::new(
        source,
        config.chain.into(),
        config.esips,
        config.l1_prefetch_forward,
        config.l1_prefetch_threads,
    ));
    let engine = Arc::new(EngineApi::new(&config.l2_engine_url, secret));
    let builder = DepositBuilder::new(config.chain.into());

    std::fs::create_dir_all(&config.data_dir)?;
    let store = Arc::new(SqliteValidationStore::open(&config.data_dir.join("validation.sqlite3"))?);

    let mut importer = BlockImporter::new(prefetcher, engine, builder, config.retry_offset);
    if config.validation_enabled {
        importer = importer.with_validation_store(store.clone() as Arc<dyn ValidationStore>);
    }

    importer.recover().await?;
    tracing::info!(target: "ethscriptions_indexer", next = importer.next_block_to_import(), "recovered import cursor");

    loop {
        match importer.advance().await {
            Ok(imported) => {
                tracing::info!(target: "ethscriptions_indexer", l1_block = imported, "imported block");
            }
            Err(ethscriptions_indexer::driver::ImporterError::NotReady(_)) => {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
            Err(e) => {
                tracing::error!(target: "ethscriptions_indexer", error = %e, "halting import");
                return Err(e.into());
            }
        }
    }
}

/// Command-line configuration, layered on top of any TOML file and
/// environment variables via [Config::load].
#[derive(Parser, Debug, Serialize)]
#[clap(name = "ethscriptions-indexer", about = "Ethscriptions L2 indexer/sequencer")]
struct Cli {
    /// L1 (source chain) RPC URL
    #[clap(long, env = "L1_RPC_URL")]
    l1_rpc_url: Option<String>,
    /// L2 execution engine RPC URL
    #[clap(long, env = "L2_ENGINE_URL")]
    l2_engine_url: Option<String>,
    /// Path to the hex-encoded JWT secret shared with the execution engine
    #[clap(long, env = "JWT_SECRET_PATH")]
    #[serde(skip)]
    jwt_secret: PathBuf,
    /// Reference-feed base URL, consulted only when validation is enabled
    #[clap(long, env = "REFERENCE_FEED_URL")]
    reference_feed_url: Option<String>,
    /// Directory for the validation SQLite database
    #[clap(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Optional TOML config file, layered beneath these flags
    #[clap(long, env = "CONFIG_PATH", default_value = "indexer.toml")]
    #[serde(skip)]
    config: PathBuf,
    /// Enable debug-level logging
    #[clap(long)]
    #[serde(skip)]
    verbose: bool,
}
