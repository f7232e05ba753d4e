//! Aurora — seeds the chunk store at startup, then runs one maintenance command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use aurora_core::AuroraConfig;
use aurora_ingest::{BootstrapLoader, Chunker, Ingester, ReaderKind};
use aurora_store::{Document, SqliteStore};
use cli::Command;

fn resolve_data_dir() -> PathBuf {
    std::env::var("AURORA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(Command::Help) => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = AuroraConfig::from_env(&data_dir)?;
    let store = SqliteStore::open(&config.data_paths.vectordb)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let chunker = Chunker::from_settings(&config.chunking)?;
    let ingester = Ingester::new(&store, chunker)
        .with_pdf_pages_per_document(config.pdf_pages_per_document);

    // Seeding must finish before any command touches the store.
    BootstrapLoader::new(&config.data_paths.documents, config.bootstrap_extension.as_str())
        .run(&ingester)
        .context("bootstrap failed")?;
    info!("Store ready");

    run(command, &ingester, &store)
}

fn run(
    command: Command,
    ingester: &Ingester<'_, SqliteStore>,
    store: &SqliteStore,
) -> anyhow::Result<()> {
    match command {
        Command::Stats => print_json(&serde_json::to_value(store.stats()?)?),
        Command::List { page_size, offset } => {
            let page = ingester.list_page(page_size, offset)?;
            print_json(&serde_json::to_value(&page)?);
        }
        Command::Get { id } => {
            let doc = ingester.get_by_id(&id)?;
            print_json(&serde_json::to_value(&doc)?);
        }
        Command::Ingest { path } => {
            let bytes = read_file(&path)?;
            let kind = ReaderKind::for_path(&path);
            let chunks = ingester
                .ingest_from_reader(&bytes, kind)
                .with_context(|| format!("ingesting {}", path.display()))?;
            let ids: Vec<&str> = chunks.iter().filter_map(Document::id).collect();
            print_json(&serde_json::json!({ "chunks": ids.len(), "ids": ids }));
        }
        Command::Replace { id, path } => {
            let bytes = read_file(&path)?;
            let text = String::from_utf8(bytes)
                .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
            let doc = ingester.replace(&id, Document::new(text))?;
            print_json(&serde_json::to_value(&doc)?);
        }
        Command::Delete { id } => {
            let removed = ingester.delete(&id)?;
            print_json(&serde_json::json!({ "id": id, "removed": removed }));
        }
        Command::Help => println!("{}", cli::USAGE),
    }
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
