use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tidysheet::http::{create_router, AppState};
use tidysheet::ServiceConfig;
use tidysheet_core::outputs::OutputPreference;
use tidysheet_core::pipeline::{clean_upload, UploadRequest};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Spreadsheet and CSV cleaning service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the cleaning API server
    Serve(ServeArgs),
    /// Clean a local file without starting a server
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Bind host (overrides TIDYSHEET_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// File to clean (.csv, .xlsx or .xls)
    input: PathBuf,
    /// Where to write the cleaned file; defaults to cleaned.<ext> next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write a workbook even when the input is CSV
    #[arg(long)]
    xlsx: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Clean(args) => clean_file(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = ServiceConfig::from_env().context("invalid service configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let address = config.bind_address();
    info!(
        max_upload_mb = config.max_upload_mb,
        free_limit_per_day = config.free_limit_per_day,
        timeout_secs = config.request_timeout.as_secs(),
        "starting tidysheet API server"
    );

    let router = create_router(AppState::new(config));
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}

fn clean_file(args: CleanArgs) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let file_name = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .context("input path has no usable file name")?;

    let preference = if args.xlsx {
        OutputPreference::Spreadsheet
    } else {
        OutputPreference::MatchInput
    };
    let output = clean_upload(
        UploadRequest {
            file_name,
            bytes: &bytes,
        },
        preference,
    )
    .with_context(|| format!("failed to clean {}", args.input.display()))?;

    let destination = args.output.unwrap_or_else(|| {
        args.input
            .parent()
            .map(|dir| dir.join(&output.suggested_file_name))
            .unwrap_or_else(|| PathBuf::from(&output.suggested_file_name))
    });
    std::fs::write(&destination, &output.bytes)
        .with_context(|| format!("failed to write {}", destination.display()))?;

    println!(
        "Wrote {} ({} rows, {} columns)",
        destination.display(),
        output.summary.row_count,
        output.summary.column_count
    );
    Ok(())
}
