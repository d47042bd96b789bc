use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use jwl_playlist::utils::{AppConfig, load_file_config};
use jwl_playlist::{
    DiscoveryError, Document, Session, export_playlist, find_playlist, import_playlist,
    list_playlists,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// List, export and import JW Library playlists.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the JW Library database (userData.db).
    /// Auto-detected if omitted.
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/jwl-playlist/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log every stage of the export or import.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List playlists.
    #[command(visible_alias = "ls")]
    List,

    /// Export a playlist to a JSON document.
    #[command(visible_alias = "exp")]
    Export {
        /// Playlist name or number to save.
        #[arg(short, long, value_name = "ID|NAME")]
        playlist: Option<String>,

        /// File to save to. Prints to stdout if omitted.
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Indent the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Import a playlist from a JSON document.
    #[command(visible_alias = "imp")]
    Import {
        /// File to read from. Reads stdin if omitted.
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// The database to work on, or `None` after telling the user why there isn't one.
fn locate_database(config: &AppConfig) -> Result<Option<PathBuf>> {
    match config.database_path() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.downcast_ref::<DiscoveryError>().is_some() => {
            eprintln!("{e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn run_list(config: &AppConfig) -> Result<()> {
    let Some(db_path) = locate_database(config)? else {
        return Ok(());
    };
    let session = Session::open_read_only(&db_path)?;
    let playlists = list_playlists(&session)?;

    println!("Found {} playlist(s).", playlists.len());
    if !playlists.is_empty() {
        println!("\nID\tName");
        for p in &playlists {
            println!("{}\t{}", p.id, p.name);
        }
        println!();
    }
    Ok(())
}

fn run_export(
    config: &AppConfig,
    playlist: Option<&str>,
    file: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let Some(db_path) = locate_database(config)? else {
        return Ok(());
    };
    let session = Session::open_read_only(&db_path)?;
    let playlists = list_playlists(&session)?;

    let Some(found) = playlist.and_then(|q| find_playlist(&playlists, q)) else {
        eprintln!("Could not find your playlist.");
        return Ok(());
    };
    let doc = export_playlist(&session, found.id);
    drop(session);

    match file {
        Some(path) => doc.write_to_path(&path, pretty)?,
        None => {
            let mut out = io::stdout().lock();
            doc.to_writer(&mut out, pretty)?;
            writeln!(out).wrap_err("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn run_import(config: &AppConfig, file: Option<PathBuf>) -> Result<()> {
    // Parse before touching the database so a bad document changes nothing.
    let doc = match &file {
        Some(path) => Document::from_path(path)?,
        None => Document::from_reader(io::stdin().lock())?,
    };

    let Some(db_path) = locate_database(config)? else {
        return Ok(());
    };
    let session = Session::open(&db_path)?;
    let report = import_playlist(&session, doc)?;

    println!("{report}");
    if report.failed() > 0 {
        eprintln!(
            "{} row(s) could not be imported; see the log above.",
            report.failed()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // CLI > config file > defaults
    let file_cfg = load_file_config(cli.config.as_deref())?;
    let config = AppConfig::resolve(cli.db, file_cfg);

    match cli.command {
        Command::List => run_list(&config),
        Command::Export {
            playlist,
            file,
            pretty,
        } => run_export(&config, playlist.as_deref(), file, pretty),
        Command::Import { file } => run_import(&config, file),
    }
}
