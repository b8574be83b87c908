use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session::{
    dataset::{decode_image, CsvFile, ItemSource},
    export::ratings_csv,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Operator commands for the content review ratings store")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://ratings.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every stored rating as CSV.
    Export {
        /// Destination file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print every stored rating, one per line.
    List,
    /// Load a dataset file, report how many items are still unrated and list
    /// items whose image cannot be decoded.
    CheckDataset { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Export { out } => {
            let records = storage.fetch_ratings().await?;
            let csv = ratings_csv(&records)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    info!(path = %path.display(), records = records.len(), "ratings exported");
                    println!("exported {} ratings to {}", records.len(), path.display());
                }
                None => print!("{csv}"),
            }
        }
        Command::List => {
            for record in storage.fetch_ratings().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.item, record.rating, record.timestamp, record.description
                );
            }
        }
        Command::CheckDataset { path } => {
            let items = CsvFile::new(&path).load().await?;
            let rated = storage.rated_item_ids().await?;
            let unrated = items.iter().filter(|item| !rated.contains(&item.id)).count();
            println!(
                "{}: {} items, {} rated, {} unrated",
                path.display(),
                items.len(),
                items.len() - unrated,
                unrated
            );
            for item in &items {
                if let Err(err) = decode_image(item) {
                    println!("  {err}");
                }
            }
        }
    }

    Ok(())
}
