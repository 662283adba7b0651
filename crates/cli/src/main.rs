//! ByteGenie CLI - Command-line interface for the ByteGenie API

use anyhow::{Context, Result};
use bytegenie_sdk::{
    ByteGenieClient, CalcMode, ClientConfig, ResponseEnvelope, TaskMode, DEFAULT_API_URL,
    DEFAULT_SECRETS_FILE,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "bytegenie_cli=info,bytegenie_sdk=warn,bytegenie_core=warn";

#[derive(Parser)]
#[command(name = "bytegenie")]
#[command(about = "ByteGenie API CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Execute endpoint URL
    #[arg(long, env = "BYTEGENIE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// JSON file holding BYTE_GENIE_KEY
    #[arg(long, env = "BYTEGENIE_SECRETS_FILE", default_value = DEFAULT_SECRETS_FILE)]
    secrets_file: String,

    /// Task mode (sync, async)
    #[arg(long, env = "BYTEGENIE_TASK_MODE", default_value = "async")]
    task_mode: TaskMode,

    /// Calculation mode (sync, async, parallel)
    #[arg(long, env = "BYTEGENIE_CALC_MODE", default_value = "async")]
    calc_mode: CalcMode,

    /// Per-call timeout in seconds
    #[arg(long, env = "BYTEGENIE_TIMEOUT_SECS", default_value = "900")]
    timeout_secs: u64,

    /// Recompute the task output even if it already exists
    #[arg(long)]
    overwrite: bool,

    /// If the task was queued, wait this many seconds and read its output file
    #[arg(long)]
    wait_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Slugify text
    Slugify {
        /// Text to slugify
        text: String,
    },

    /// Upload local files
    Upload {
        /// File to upload (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Owner of the upload (default: USERNAME from the secrets file)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// List the files of a document
    ListDocFiles {
        /// Document name
        doc_name: String,

        /// File pattern to match
        #[arg(default_value = "*")]
        file_pattern: String,
    },

    /// Check whether a server-side file exists
    CheckFile {
        /// Server-side file path
        path: String,
    },

    /// Read a server-side file
    ReadFile {
        /// Server-side file path
        path: String,

        /// Add the file path to the returned data
        #[arg(long)]
        add_file: bool,
    },

    /// Run any remote function
    Exec {
        /// Function name (e.g., extract_text)
        func: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[derive(Tabled)]
struct TaskRow {
    status: String,
    output_file: String,
    start_time: String,
}

impl From<&ResponseEnvelope> for TaskRow {
    fn from(resp: &ResponseEnvelope) -> Self {
        Self {
            status: resp.status().to_string(),
            output_file: resp.output_file().unwrap_or("-").to_string(),
            start_time: resp
                .start_time()
                .map(|t| t.as_str().map(str::to_string).unwrap_or_else(|| t.to_string()))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("BYTEGENIE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn read_uploads(files: &[PathBuf]) -> Result<(Vec<String>, Vec<String>)> {
    let mut contents = Vec::with_capacity(files.len());
    let mut filenames = Vec::with_capacity(files.len());
    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file: {}", path.display()))?;
        contents.push(content);
        filenames.push(name);
    }
    Ok((contents, filenames))
}

fn print_response(resp: &ResponseEnvelope, data: Option<&serde_json::Value>) -> Result<()> {
    if let Some(error) = resp.error() {
        println!("{} {}", "✗ Request failed:".red().bold(), error);
        anyhow::bail!("ByteGenie call failed");
    }

    let status = resp.status();
    let headline = format!("Task {}", status);
    match status {
        "scheduled" | "pending" | "running" => println!("{}", headline.yellow().bold()),
        "error" | "failed" => println!("{}", headline.red().bold()),
        _ => println!("{}", headline.green().bold()),
    }
    println!();
    println!("{}", Table::new(vec![TaskRow::from(resp)]));

    match data {
        Some(data) => {
            println!();
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        None => println!("{}", "No data returned".yellow()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = ClientConfig::default()
        .with_api_url(cli.api_url)
        .with_secrets_file(cli.secrets_file)
        .with_task_mode(cli.task_mode)
        .with_calc_mode(cli.calc_mode)
        .with_overwrite(cli.overwrite)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let client = ByteGenieClient::new(config).context("Failed to create client")?;

    if client.api_key().is_empty() {
        println!("{}", "⚠ No BYTE_GENIE_KEY found; calling without an API key".yellow());
    }

    let resp = match cli.command {
        Commands::Slugify { text } => client.slugify(&text, None).await,

        Commands::Upload { files, username } => {
            let (contents, filenames) = read_uploads(&files)?;
            info!(count = filenames.len(), "Uploading files");
            client
                .upload_data(contents, filenames, username.as_deref(), None)
                .await
        }

        Commands::ListDocFiles {
            doc_name,
            file_pattern,
        } => client.list_doc_files(&doc_name, &file_pattern, None).await,

        Commands::CheckFile { path } => client.check_file_exists(&path, None).await,

        Commands::ReadFile { path, add_file } => {
            client.read_file(&path, add_file.then_some(true), None).await
        }

        Commands::Exec { func, args } => {
            let args: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            client.execute(&func, args, None).await
        }
    };

    let polled = match cli.wait_secs {
        Some(secs) if resp.data().is_none() && resp.output_file().is_some() => {
            println!(
                "{}",
                format!("Waiting {}s for {}...", secs, resp.output_file().unwrap_or_default())
                    .cyan()
            );
            tokio::time::sleep(Duration::from_secs(secs)).await;
            resp.read_output_data(&client).await
        }
        _ => None,
    };

    print_response(&resp, polled.as_ref().or(resp.data()))
}
