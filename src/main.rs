use anyhow::Context;
use clap::Parser;
use pathcore::{
    load_dataset, AppState, HttpServer, MemoryStore, PathcoreStore, PersistentStore, ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pathcore", version, about = "PathCORE-T demo server")]
struct Args {
    /// YAML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    address: Option<String>,

    /// Port
    #[arg(long, short)]
    port: Option<u16>,

    /// RocksDB directory with imported collections
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory served under /static
    #[arg(long = "static")]
    static_path: Option<PathBuf>,

    /// Serve a dataset directory from memory instead of RocksDB
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Maximum number of live sessions
    #[arg(long)]
    session_capacity: Option<usize>,
}

impl Args {
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_yaml_file(path)?,
            None => ServerConfig::default(),
        };
        config.apply_env()?;

        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(static_path) = &self.static_path {
            config.static_path = static_path.clone();
        }
        if let Some(capacity) = self.session_capacity {
            config.session_capacity = capacity;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = args.server_config()?;

    info!("PathCORE-T demo server v{}", pathcore::version());

    let store: Arc<dyn PathcoreStore> = match &args.dataset {
        Some(dir) => {
            let dataset = load_dataset(dir)
                .with_context(|| format!("loading dataset from {}", dir.display()))?;
            info!("Serving dataset {} from memory", dir.display());
            Arc::new(MemoryStore::from_dataset(dataset))
        }
        None => Arc::new(
            PersistentStore::open(&config.data_path)
                .with_context(|| format!("opening store at {}", config.data_path.display()))?,
        ),
    };

    let statistics = store.statistics()?;
    info!(
        "Collections: {} pathways, {} genes, {} annotations, {} edges",
        statistics.pathways,
        statistics.genes,
        statistics.sample_annotations,
        statistics.pathcore_edge_data
    );

    let server = HttpServer::new(AppState::new(store, config));
    server.start().await?;

    Ok(())
}
