use anyhow::{Context, Result};
use anchor_config::{Config, ConfigLoader};
use anchor_core::{instantiate_handler, IssueError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "anchor-issuer")]
#[command(about = "Anchors payload digests on EVM chains", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
	config: PathBuf,

	#[arg(long, env = "ANCHOR_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Issue one transaction carrying the payload as calldata
	Issue {
		/// Hex encoded payload, with or without 0x prefix
		#[arg(long)]
		payload: String,
	},
	/// Compare the issuing balance with the cost of one transaction
	Balance,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match &cli.command {
		Commands::Issue { payload } => issue(&cli, payload).await,
		Commands::Balance => balance(&cli).await,
		Commands::Validate => validate_config(&cli).await,
	}
}

async fn load_config(cli: &Cli) -> Result<Config> {
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn issue(cli: &Cli, payload: &str) -> Result<()> {
	let payload = hex::decode(payload.trim().trim_start_matches("0x"))
		.context("Payload is not valid hex")?;
	let config = load_config(cli).await?;

	let (cancel_tx, cancel_rx) = watch::channel(false);
	tokio::spawn(async move {
		shutdown_signal().await;
		info!("Shutdown signal received, cancelling pending broadcast retries");
		let _ = cancel_tx.send(true);
	});

	let handler = instantiate_handler(&config, Some(cancel_rx))
		.await
		.context("Failed to set up issuer")?;

	let txid = handler
		.issue_transaction(&payload)
		.await
		.context("Failed to issue transaction")?;

	info!("Transaction {} submitted on {}", txid, handler.chain());
	println!("{}", txid);
	Ok(())
}

async fn balance(cli: &Cli) -> Result<()> {
	let config = load_config(cli).await?;
	let handler = instantiate_handler(&config, None)
		.await
		.context("Failed to set up issuer")?;

	match handler.ensure_balance().await {
		Ok(available) => {
			info!(
				"{} holds {} wei, one transaction needs at most {} wei",
				handler.issuing_address(),
				available,
				handler.cost().recommended_max_cost()
			);
			Ok(())
		}
		Err(e @ IssueError::InsufficientFunds { .. }) => {
			warn!("{}", e);
			Err(e.into())
		}
		Err(e) => Err(e).context("Failed to check balance"),
	}
}

async fn validate_config(cli: &Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = load_config(cli).await?;

	info!("Configuration is valid");
	info!("Issuing address: {}", config.issuer.issuing_address);
	info!(
		"Chain: {} (id {})",
		config.issuer.chain,
		config.issuer.chain.chain_id()
	);
	match config.rpc_url(config.issuer.chain) {
		Some(url) => info!("Node endpoint: {}", url),
		None => info!("No node endpoint, using {} only", config.issuer.chain.explorer()),
	}
	if config.gas.gas_price_dynamic {
		info!("Gas price: queried from providers");
	} else {
		info!("Gas price: {} wei", config.gas.gas_price);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			warn!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				warn!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
