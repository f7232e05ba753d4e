//! Command-line parsing for the `aurora` binary.

use std::path::PathBuf;

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub const USAGE: &str = "\
Aurora — document ingestion store

Usage: aurora [command]

Commands:
  (none)                   Seed the store if empty and print statistics
  list [page-size] [offset]
                           List stored chunks
  get <id>                 Show one chunk
  ingest <file>            Ingest a pdf, docx, markdown or text file
  replace <id> <file>      Replace a chunk with the contents of a text file
  delete <id>              Delete every chunk stored under an id
  help                     Show this help message

Environment:
  AURORA_DATA_DIR          Data directory (default: data)
  AURORA_DOCUMENTS_DIR     Bootstrap seed directory (default: <data>/documents)
  AURORA_BOOTSTRAP_EXT     Seed file extension (default: md)
  AURORA_CHUNK_TOKENS      Tokens per chunk (default: 800)
  AURORA_CHUNK_OVERLAP     Token overlap between chunks (default: 0)
  AURORA_PDF_PAGES_PER_DOCUMENT
                           PDF pages per raw document (default: 1)
  RUST_LOG                 Log filter (default: info)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    List { page_size: usize, offset: usize },
    Get { id: String },
    Ingest { path: PathBuf },
    Replace { id: String, path: PathBuf },
    Delete { id: String },
    Help,
}

impl Command {
    /// Parse the arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some(name) = args.first() else {
            return Ok(Self::Stats);
        };
        let rest = &args[1..];

        match name.as_str() {
            "list" | "ls" => Ok(Self::List {
                page_size: number_arg(rest.first(), "page-size")?.unwrap_or(DEFAULT_PAGE_SIZE),
                offset: number_arg(rest.get(1), "offset")?.unwrap_or(0),
            }),
            "get" => Ok(Self::Get {
                id: required(rest, 0, "id")?,
            }),
            "ingest" => Ok(Self::Ingest {
                path: PathBuf::from(required(rest, 0, "file")?),
            }),
            "replace" => Ok(Self::Replace {
                id: required(rest, 0, "id")?,
                path: PathBuf::from(required(rest, 1, "file")?),
            }),
            "delete" | "rm" => Ok(Self::Delete {
                id: required(rest, 0, "id")?,
            }),
            "help" | "--help" | "-h" => Ok(Self::Help),
            other => Err(format!(
                "Unknown command: {}. Use 'aurora help' for usage.",
                other
            )),
        }
    }
}

fn required(args: &[String], index: usize, name: &str) -> Result<String, String> {
    args.get(index)
        .cloned()
        .ok_or_else(|| format!("Missing argument <{}>", name))
}

fn number_arg(arg: Option<&String>, name: &str) -> Result<Option<usize>, String> {
    arg.map(|raw| {
        raw.parse()
            .map_err(|_| format!("<{}> must be a non-negative integer, got {:?}", name, raw))
    })
    .transpose()
}
