//! Command-line entry point for the web3tx signer.
//!
//! Loads a signer from a TOML configuration and signs ledger transactions
//! through EIP-712, printing results as JSON on stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use web3tx_config::Config;
use web3tx_core::{Eip712TxSigner, SignerBuilder, SignerFactories};

mod commands;

/// Command-line arguments for the signer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", global = true)]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Sign a request and print the assembled envelope
	Sign {
		/// JSON file with msgs, fee and memo
		#[arg(short, long)]
		request: PathBuf,
		/// Address paying the fee, defaults to the signer
		#[arg(long)]
		fee_payer: Option<String>,
		/// Write the result here instead of stdout
		#[arg(short, long)]
		output: Option<PathBuf>,
	},
	/// Print the typed data and hash a wallet would sign
	TypedData {
		#[arg(short, long)]
		request: PathBuf,
		#[arg(long)]
		fee_payer: Option<String>,
	},
	/// Print the signer's identity and current account state
	Account,
	/// Recover the signer of a typed-data hash
	Verify {
		#[arg(long)]
		hash: String,
		#[arg(long)]
		signature: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	// stdout carries the JSON result
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let (output, value) = match args.command {
		Command::Verify { hash, signature } => (None, commands::verify(&hash, &signature)?),
		Command::Account => {
			let signer = build_signer(&args.config).await?;
			(None, commands::account(&signer).await?)
		},
		Command::TypedData { request, fee_payer } => {
			let signer = build_signer(&args.config).await?;
			let request = commands::load_request(&request, fee_payer).await?;
			(None, commands::typed_data(&signer, &request).await?)
		},
		Command::Sign {
			request,
			fee_payer,
			output,
		} => {
			let signer = build_signer(&args.config).await?;
			let request = commands::load_request(&request, fee_payer).await?;
			(output, commands::sign(&signer, &request).await?)
		},
	};

	let rendered = serde_json::to_string_pretty(&value)?;
	match output {
		Some(path) => {
			tokio::fs::write(&path, rendered).await?;
			tracing::info!(path = %path.display(), "Wrote signed envelope");
		},
		None => println!("{}", rendered),
	}

	Ok(())
}

async fn build_signer(path: &std::path::Path) -> Result<Eip712TxSigner, Box<dyn std::error::Error>> {
	let config = Config::from_file(path).await?;
	tracing::info!(chain_id = %config.chain.chain_id, "Loaded configuration");

	let signer = SignerBuilder::new(config).build(&SignerFactories::default())?;
	let identity = signer.identity();
	tracing::info!(
		address = %identity.ledger_address,
		evm_address = %identity.evm_address,
		"Signer ready"
	);
	Ok(signer)
}
