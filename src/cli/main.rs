use anyhow::Context;
use clap::{Parser, Subcommand};
use disaster_response::{
    config::Config,
    ml::train_model,
    processing::DatasetProcessor,
    state::SqliteStore,
    telemetry,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dr-cli")]
#[command(about = "Disaster response data and model tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, clean and store the message and category CSV files
    Process {
        #[arg(value_name = "MESSAGES_CSV")]
        messages: PathBuf,

        #[arg(value_name = "CATEGORIES_CSV")]
        categories: PathBuf,

        #[arg(value_name = "DATABASE_PATH")]
        database: PathBuf,

        /// Destination table (replaced if it exists)
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Train the classifier from a stored table and save it
    Train {
        #[arg(value_name = "DATABASE_PATH")]
        database: PathBuf,

        #[arg(value_name = "MODEL_PATH")]
        model: PathBuf,

        #[arg(short, long)]
        table: Option<String>,

        /// Fraction of rows held out for evaluation
        #[arg(long)]
        test_size: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    telemetry::init_tracing(&config.observability)?;
    if let Err(e) = disaster_response::metrics::init_metrics() {
        tracing::warn!("Failed to initialize metrics: {}", e);
    }

    match cli.command {
        Commands::Process {
            messages,
            categories,
            database,
            table,
        } => {
            let table = table.unwrap_or_else(|| config.data.table_name.clone());
            let store = SqliteStore::open(&database)
                .with_context(|| format!("opening database {}", database.display()))?;

            let mut processor = DatasetProcessor::new(Box::new(store), table);
            let summary = processor
                .process(&messages, &categories)
                .context("processing failed")?;

            println!(
                "Cleaned data saved to database: {} (table {})",
                database.display(),
                summary.table_name
            );
            println!(
                "Rows: {} in, {} out ({} exact duplicates, {} repeated ids removed)",
                summary.report.input_rows,
                summary.rows,
                summary.report.exact_duplicates_removed,
                summary.report.duplicate_ids_removed
            );
            println!("Categories: {}", summary.categories.len());
            if !summary.report.dropped_categories.is_empty() {
                println!(
                    "Dropped categories without positives: {}",
                    summary.report.dropped_categories.join(", ")
                );
            }
        }

        Commands::Train {
            database,
            model,
            table,
            test_size,
            seed,
        } => {
            let table = table.unwrap_or_else(|| config.data.table_name.clone());
            let mut training = config.training.clone();
            if let Some(test_size) = test_size {
                training.test_size = test_size;
            }
            if let Some(seed) = seed {
                training.seed = seed;
            }

            let store = SqliteStore::open_read_only(&database)
                .with_context(|| format!("opening database {}", database.display()))?;
            let outcome =
                train_model(&store, &table, &model, &training).context("training failed")?;

            println!(
                "Trained on {} rows, evaluated on {} rows",
                outcome.train_rows, outcome.test_rows
            );
            println!();
            print!("{}", outcome.metrics.report());
            println!();
            println!("Trained model saved: {}", model.display());
        }
    }

    Ok(())
}
