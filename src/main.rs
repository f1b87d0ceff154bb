//! literate-diff - split a diff into annotated chunks and share the narrative
//!
//! A thin front-end over the library: each command opens a session, applies
//! one change, and saves before exiting.

mod config;
mod export;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use literate_diff::debounce::SystemClock;
use literate_diff::remote::{HttpFetcher, HttpStore};
use literate_diff::share;
use literate_diff::source::SourceAcquirer;
use literate_diff::storage::{self, SqliteStore};
use literate_diff::{Session, Store};

use crate::config::{Backend, Config};
use crate::export::{export, ExportFormat};

type CliSession = Session<Box<dyn Store>, SystemClock>;

#[derive(Parser)]
#[command(name = "literate-diff")]
#[command(about = "Split a diff into reorderable, annotated chunks")]
#[command(version)]
struct Cli {
    /// Storage backend (default from config: sqlite)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Base URL of the REST backend
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Read the diff from a file
    #[arg(short, long, conflicts_with = "pr")]
    file: Option<PathBuf>,

    /// Fetch the diff of a pull request
    #[arg(long)]
    pr: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new literate diff (reads stdin without --file or --pr)
    New {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Replace the content of an existing literate diff
    Replace {
        id: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show chunks in narrative order (ID may also be a share path)
    Show { id: String },

    /// Move the chunk at one position to another (positions start at 1)
    Move { id: String, from: usize, to: usize },

    /// Describe the chunk at a position
    Describe {
        id: String,
        position: usize,
        text: String,
    },

    /// Export as markdown (md) or json
    Export {
        id: String,

        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List diffs held in the SQLite database
    List,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load()?.with_overrides(cli.backend, cli.db, cli.api_url);

    match cli.command {
        Commands::New { source } => cmd_new(&config, &source),
        Commands::Replace { id, source } => cmd_replace(&config, &id, &source),
        Commands::Show { id } => cmd_show(&config, &id),
        Commands::Move { id, from, to } => cmd_move(&config, &id, from, to),
        Commands::Describe { id, position, text } => cmd_describe(&config, &id, position, &text),
        Commands::Export { id, format, output } => cmd_export(&config, &id, &format, output),
        Commands::List => cmd_list(&config),
    }
}

fn sqlite_path(config: &Config) -> Result<PathBuf> {
    match config.db_path {
        Some(ref path) => Ok(path.clone()),
        None => SqliteStore::default_path().context("Failed to locate database"),
    }
}

fn open_store(config: &Config) -> Result<Box<dyn Store>> {
    match config.backend {
        Backend::Sqlite => {
            let path = sqlite_path(config)?;
            let store = SqliteStore::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(store))
        }
        Backend::Http => Ok(Box::new(HttpStore::new(&config.api_url))),
    }
}

/// Accepts either a bare id or a share path like `<prefix>/<id>`
fn resolve_id<'a>(prefix: &str, arg: &'a str) -> &'a str {
    if arg.starts_with('/') {
        share::id_from_path(prefix, arg).unwrap_or(arg)
    } else {
        arg
    }
}

fn open_session(config: &Config, id: &str) -> Result<CliSession> {
    let id = resolve_id(&config.share_prefix, id);
    let store = open_store(config)?;
    Session::open(store, SystemClock, config.debounce_window(), id)
        .with_context(|| format!("Failed to load diff {}", id))
}

/// Loads the requested diff into the session. Returns the number of chunks.
fn load_source(config: &Config, session: &mut CliSession, source: &SourceArgs) -> Result<usize> {
    let acquirer = SourceAcquirer::new(HttpFetcher::new(config.diff_proxy.as_deref()));

    if let Some(ref url) = source.pr {
        return session
            .load_pull_request(&acquirer, url)
            .with_context(|| format!("Failed to fetch diff for {}", url));
    }

    let text = match source.file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read diff from stdin")?;
            text
        }
    };

    Ok(session.set_from_raw(&acquirer.from_pasted_text(&text)))
}

fn save(config: &Config, session: &mut CliSession) -> Result<()> {
    session.flush().context("Failed to save diff")?;
    if let Some(path) = session.share_path(&config.share_prefix) {
        println!("{}", path);
    }
    Ok(())
}

fn to_index(position: usize) -> Result<usize> {
    position.checked_sub(1).context("Positions start at 1")
}

fn cmd_new(config: &Config, source: &SourceArgs) -> Result<()> {
    let mut session = Session::new(open_store(config)?, SystemClock, config.debounce_window());

    if load_source(config, &mut session, source)? == 0 {
        bail!("No hunks found in the diff");
    }

    save(config, &mut session)
}

fn cmd_replace(config: &Config, id: &str, source: &SourceArgs) -> Result<()> {
    let mut session = open_session(config, id)?;

    if load_source(config, &mut session, source)? == 0 {
        bail!("No hunks found in the diff; {} left unchanged", id);
    }

    save(config, &mut session)
}

fn cmd_show(config: &Config, id: &str) -> Result<()> {
    let session = open_session(config, id)?;
    let sequence = session.sequence();

    if sequence.is_empty() {
        println!("No chunks in {}", id);
        return Ok(());
    }

    for (position, unit) in sequence.units().iter().enumerate() {
        let header = unit
            .raw_chunk()
            .map(|c| c.content.as_str())
            .unwrap_or_default();
        println!(
            "{:>3}. {} #{} {}",
            position + 1,
            unit.file_pair.label(),
            unit.chunk_index,
            header
        );
        if !unit.description.is_empty() {
            println!("     {}", unit.description);
        }
    }

    Ok(())
}

fn cmd_move(config: &Config, id: &str, from: usize, to: usize) -> Result<()> {
    let mut session = open_session(config, id)?;
    session.reorder(to_index(from)?, to_index(to)?)?;
    save(config, &mut session)
}

fn cmd_describe(config: &Config, id: &str, position: usize, text: &str) -> Result<()> {
    let mut session = open_session(config, id)?;

    let index = to_index(position)?;
    let (file_pair, chunk_index) = match session.sequence().units().get(index) {
        Some(unit) => (unit.file_pair.clone(), unit.chunk_index),
        None => bail!(
            "No chunk at position {} ({} chunks)",
            position,
            session.sequence().len()
        ),
    };

    session.set_description(&file_pair, chunk_index, text)?;
    save(config, &mut session)
}

fn cmd_export(config: &Config, id: &str, format: &str, output: Option<PathBuf>) -> Result<()> {
    let export_format =
        ExportFormat::from_str(format).context("Invalid format. Use: markdown (md) or json")?;

    let session = open_session(config, id)?;
    let content = export(session.sequence(), export_format)?;

    if let Some(path) = output {
        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
        println!("Exported to {}", path.display());
    } else {
        print!("{}", content);
    }

    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    if config.backend != Backend::Sqlite {
        bail!("Listing is only available for the sqlite backend");
    }

    let path = sqlite_path(config)?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let diffs = store.list()?;

    if diffs.is_empty() {
        println!("No diffs found");
        return Ok(());
    }

    let now = storage::now_secs();
    for diff in diffs {
        println!(
            "{}  {} chunks  created {}, updated {}",
            diff.id,
            diff.chunk_count,
            format_age(now - diff.created_at),
            format_age(now - diff.updated_at)
        );
    }

    Ok(())
}

/// Coarse relative age for listings
fn format_age(secs: i64) -> String {
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_id() {
        let prefix = share::DEFAULT_PREFIX;
        assert_eq!(resolve_id(prefix, "abc123"), "abc123");
        assert_eq!(resolve_id(prefix, "/literate-diffs/abc123"), "abc123");
        assert_eq!(resolve_id(prefix, "/"), "/");

        // multi-segment prefix from config
        let prefix = "/team/literate-diffs";
        assert_eq!(resolve_id(prefix, "/team/literate-diffs/abc"), "abc");
        assert_eq!(resolve_id(prefix, "/literate-diffs/abc"), "/literate-diffs/abc");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-5), "just now");
        assert_eq!(format_age(59), "just now");
        assert_eq!(format_age(60 * 5), "5m ago");
        assert_eq!(format_age(3600 * 2 + 10), "2h ago");
        assert_eq!(format_age(86400 * 3), "3d ago");
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1).unwrap(), 0);
        assert!(to_index(0).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["literate-diff", "--backend", "http", "move", "x", "3", "1"])
            .unwrap();
        assert_eq!(cli.backend, Some(Backend::Http));
        assert!(matches!(cli.command, Commands::Move { from: 3, to: 1, .. }));

        assert!(Cli::try_parse_from(["literate-diff", "new", "--file", "a", "--pr", "b"]).is_err());
    }
}
