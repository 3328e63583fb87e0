//! UPI Fraud Check - Main Entry Point
//!
//! Loads the classifier once, then checks a single transaction, a CSV table,
//! or serves check requests over NATS.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use upi_fraud_check::{
    batch::BatchDataset,
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    feature_encoder::FeatureEncoder,
    models::{inference::InferenceDispatcher, onnx::OnnxClassifier},
    schema::{CategoryFamily, FeatureSchema},
    service, RawTransaction,
};

#[derive(Parser)]
#[command(name = "upi-fraud-check", version, about = "UPI transaction fraud checks")]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, env = "UPI_FRAUD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a single transaction
    Check(CheckArgs),
    /// Check every row of a CSV table already in feature-vector shape
    Batch {
        /// Input CSV
        input: PathBuf,
        /// Write the annotated table here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Serve check requests over NATS
    Serve,
    /// Print the accepted values of every categorical field
    Domains,
    /// Print the feature columns in classifier order
    Schema,
}

#[derive(Args)]
struct CheckArgs {
    /// Transaction amount (INR, 0-500000)
    #[arg(long)]
    amount: f64,
    /// Transaction year (2000-2100)
    #[arg(long)]
    year: i32,
    /// Transaction month (1-12)
    #[arg(long)]
    month: u32,
    #[arg(long)]
    transaction_type: String,
    #[arg(long)]
    payment_gateway: String,
    #[arg(long)]
    transaction_state: String,
    #[arg(long)]
    merchant_category: String,
}

impl From<CheckArgs> for RawTransaction {
    fn from(args: CheckArgs) -> Self {
        RawTransaction {
            amount: args.amount,
            year: args.year,
            month: args.month,
            transaction_type: args.transaction_type,
            payment_gateway: args.payment_gateway,
            transaction_state: args.transaction_state,
            merchant_category: args.merchant_category,
        }
    }
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive(format!("upi_fraud_check={}", config.level).parse()?),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Load the classifier once and inject it into the dispatcher
fn build_dispatcher(config: &AppConfig) -> Result<InferenceDispatcher> {
    let classifier = OnnxClassifier::from_config(&config.model).context("Failed to load classifier")?;
    let encoder = FeatureEncoder::new(config.encoding.unknown_category);
    Ok(InferenceDispatcher::new(Arc::new(classifier), encoder))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Domains => {
            for family in CategoryFamily::ALL {
                println!("{family}:");
                for member in family.members() {
                    println!("  {member}");
                }
            }
            return Ok(());
        }
        Command::Schema => {
            let schema = FeatureSchema::upi();
            println!("# {} ({} columns)", schema.version(), schema.len());
            for column in schema.columns() {
                println!("{column}");
            }
            return Ok(());
        }
        _ => {}
    }

    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let dispatcher = build_dispatcher(&config)?;

    match cli.command {
        Command::Check(args) => {
            let tx = RawTransaction::from(args);
            tx.validate()?;
            let verdict = dispatcher.check_one(&tx)?;
            println!("{verdict}");
        }
        Command::Batch { input, output } => {
            let dataset = BatchDataset::from_csv_path(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let checked = dispatcher.check_batch(dataset)?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    checked.write_csv(file)?;
                    info!(path = %path.display(), "Annotated table written");
                }
                None => checked.write_csv(io::stdout().lock())?,
            }

            let summary = checked.summary();
            eprintln!(
                "{} rows checked: {} fraudulent, {} safe",
                summary.rows, summary.fraudulent, summary.safe
            );
        }
        Command::Serve => service::serve(&config, dispatcher).await?,
        Command::Domains | Command::Schema => unreachable!("handled before config load"),
    }

    Ok(())
}
