//! PathCORE-T CLI: import a dataset into RocksDB and inspect it offline

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use pathcore::model::EdgeName;
use pathcore::report::{edge_export, write_csv};
use pathcore::{load_dataset, PathcoreStore, PersistentStore};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pathcore-cli", version, about = "PathCORE-T demo data CLI")]
struct Cli {
    /// RocksDB directory
    #[arg(long, default_value = "./pathcore_data", global = true, env = "PATHCORE_DATA")]
    data: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a dataset directory into the store
    Load {
        /// Directory holding genes.pcl and the other collection files
        #[arg(long)]
        dataset: PathBuf,
    },
    /// Show collection counts
    Stats,
    /// Print the CSV export of an edge
    Edge {
        /// Edge as `pw0&pw1`
        edge: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Load { dataset } => run_load(&cli.data, dataset, &cli.format),
        Commands::Stats => run_stats(&cli.data, &cli.format),
        Commands::Edge { edge } => run_edge(&cli.data, edge),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn open_store(data: &Path) -> anyhow::Result<PersistentStore> {
    PersistentStore::open(data).with_context(|| format!("opening store at {}", data.display()))
}

fn print_statistics(store: &dyn PathcoreStore, format: &OutputFormat) -> anyhow::Result<()> {
    let statistics = store.statistics()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Collection", "Documents"]);
            let rows = [
                ("pathways", statistics.pathways),
                ("genes", statistics.genes),
                ("sample_annotations", statistics.sample_annotations),
                ("pathcore_edge_data", statistics.pathcore_edge_data),
                ("network_edges", statistics.network_edges),
                ("network_nodes", statistics.network_nodes),
            ];
            for (name, count) in rows {
                table.add_row(vec![name.to_string(), count.to_string()]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

fn run_load(data: &Path, dataset_dir: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let dataset = load_dataset(dataset_dir)
        .with_context(|| format!("loading dataset from {}", dataset_dir.display()))?;
    let store = open_store(data)?;
    store.import(&dataset)?;
    store.flush()?;
    eprintln!("Imported {} into {}", dataset_dir.display(), store.path());
    print_statistics(&store, format)
}

fn run_stats(data: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let store = open_store(data)?;
    print_statistics(&store, format)
}

fn run_edge(data: &Path, edge: &str) -> anyhow::Result<()> {
    let store = open_store(data)?;
    let edge_name = EdgeName::parse(edge)?;
    let export = edge_export(&store, &edge_name)?;
    write_csv(&export.rows, std::io::stdout().lock())?;
    eprintln!("{} rows ({})", export.rows.len(), export.file_name);
    Ok(())
}
