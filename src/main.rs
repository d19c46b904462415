//! Upstow - upload files, URLs or text to object storage
//!
//! Prints the resulting key and URL as JSON.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use upstow::{config::Config, storage::ObjectStorage};

/// Upstow - upload content to object storage
#[derive(Parser, Debug)]
#[command(name = "upstow")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "upstow.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Explicit storage key (ignored when auto paths are enabled)
    #[arg(short, long)]
    key: Option<String>,

    /// Give up after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file
    PutFile { path: PathBuf },
    /// Download a URL and upload its content
    PutUrl { url: String },
    /// Upload text given on the command line
    PutStr { content: String },
    /// Upload everything read from stdin
    PutStdin,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Upstow v{}", upstow::VERSION);

    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    let storage = ObjectStorage::from_config(&config).await?;

    let mut upload = storage.upload();
    if let Some(key) = args.key {
        upload = upload.path_key(key);
    }
    if let Some(secs) = args.timeout {
        upload = upload.timeout(Duration::from_secs(secs));
    }

    let result = match args.command {
        Command::PutFile { path } => upload.put_file(path).await?,
        Command::PutUrl { url } => upload.put_net_file(&url).await?,
        Command::PutStr { content } => upload.put_str(&content).await?,
        Command::PutStdin => upload.put_reader(tokio::io::stdin()).await?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
