use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use landcost_core::{Category, ComputingMethod, CostService};
use landcost_data::{EstimateExporter, IndicatorLoader};
use landcost_db_sqlite::SqliteRepository;

/// Load indicator values from CSV and recalculate, or export the estimate table.
#[derive(Parser, Debug)]
#[command(name = "landcost-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database (bare path, `:memory:` or a `sqlite:` URL)
    #[arg(short, long, default_value = "landcost.db", global = true)]
    database: String,

    /// Run database migrations before doing anything else
    #[arg(short, long, default_value_t = false, global = true)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long, global = true)]
    seeds: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply indicator values from a CSV file and recalculate each category.
    ///
    /// Columns: category, serial_number, indicator_name (optional), value.
    Load {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Category-1 computing method: 1 direct totals, 2 itemized
        #[arg(long, default_value_t = 1)]
        method: i32,
    },
    /// Write estimate lines as CSV.
    Export {
        /// Only this category (1-4); all lines when omitted
        #[arg(short, long)]
        category: Option<i32>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        eprintln!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        eprintln!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        eprintln!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        eprintln!("Seeds complete.");
    }

    match args.command {
        Command::Load { file, method } => {
            let Some(method) = ComputingMethod::from_id(method) else {
                bail!("computing method must be 1 or 2, got {method}");
            };

            let reader =
                File::open(&file).with_context(|| format!("Failed to open: {}", file.display()))?;
            let records = IndicatorLoader::parse(reader)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            println!("Parsed {} records from CSV", records.len());

            let service = CostService::new(Arc::new(repo));
            let reports = IndicatorLoader::load(&service, &records, method)
                .await
                .context("Failed to apply indicator values")?;

            for report in &reports {
                println!(
                    "Category {} ({}): {} updates, subtotal {}",
                    report.category,
                    report.category.label(),
                    report.updates.len(),
                    report.subtotal.round_dp(2)
                );
            }
            if let Some(last) = reports.last() {
                println!("Grand total: {}", last.grand_total.round_dp(2));
            }
        }
        Command::Export { category, output } => {
            let category = category
                .map(|id| Category::from_id(id).with_context(|| format!("Invalid category: {id}")))
                .transpose()?;

            let written = match &output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create: {}", path.display()))?;
                    EstimateExporter::export(&repo, category, file).await?
                }
                None => EstimateExporter::export(&repo, category, io::stdout().lock()).await?,
            };
            eprintln!("Exported {written} estimate lines.");
        }
    }

    Ok(())
}
