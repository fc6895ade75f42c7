use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use olap_ingest::engine::core::wal::{ColumnPositionMap, WalFileReader, WalManager, WalRecord};
use olap_ingest::engine::core::write::LocalTabletWriterFactory;
use olap_ingest::engine::replay::WalReplayer;
use olap_ingest::engine::schema::SchemaDescriptor;
use olap_ingest::engine::sink::{RuntimeState, SinkDescriptor};
use olap_ingest::logging;
use olap_ingest::shared::config::CONFIG;
use tracing::info;

#[derive(Parser)]
#[command(name = "olap_ingest")]
#[command(about = "Group-commit WAL tools for table loads", long_about = None)]
struct Args {
    /// WAL directory. Defaults to `wal.dir` from the configuration
    #[arg(long, global = true)]
    wal_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a WAL through a table sink into tablet files
    Replay {
        #[arg(long)]
        wal_id: i64,

        /// Sink descriptor (JSON)
        #[arg(long)]
        descriptor: PathBuf,

        /// Schema the WAL batches are read as (JSON)
        #[arg(long)]
        source_schema: PathBuf,

        /// Directory the tablet files are written to
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the column header and record count of a WAL
    Inspect {
        #[arg(long)]
        wal_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init()?;

    let wal_dir = args
        .wal_dir
        .unwrap_or_else(|| PathBuf::from(&CONFIG.wal.dir));
    let wal_manager = Arc::new(WalManager::open(&wal_dir)?);

    match args.command {
        Command::Replay {
            wal_id,
            descriptor,
            source_schema,
            out,
        } => {
            let descriptor = SinkDescriptor::from_file(&descriptor)
                .with_context(|| format!("reading descriptor {}", descriptor.display()))?;
            let schema_text = std::fs::read_to_string(&source_schema)
                .with_context(|| format!("reading source schema {}", source_schema.display()))?;
            let source_schema: SchemaDescriptor = serde_json::from_str(&schema_text)?;

            let factory = Arc::new(LocalTabletWriterFactory::new(&out)?);
            let state = RuntimeState::new(descriptor.load_id.clone(), wal_manager, factory)
                .with_wal_id(wal_id)
                .with_configured_options();

            let stats = WalReplayer::new(state, descriptor, Arc::new(source_schema))
                .with_configured_options()
                .replay()
                .await?;
            info!(target: "olap_ingest::main", wal_id, batches = stats.batches, rows = stats.rows, "Replay finished");
            println!("replayed {} batches, {} rows", stats.batches, stats.rows);
        }
        Command::Inspect { wal_id } => {
            let path = wal_manager.get_wal_path(wal_id)?;
            let mut reader = WalFileReader::open(&path)?;
            let header = reader.read_header()?;
            let map = ColumnPositionMap::parse(&header)?;

            let mut records = 0u64;
            while let WalRecord::Block(_) = reader.read_block()? {
                records += 1;
            }
            println!("{}: columns {:?}, {} records", path.display(), map.col_ids(), records);
        }
    }

    Ok(())
}
