//!
//! sheetsync binary
//! ----------------
//! Menu surface for the sync flows: `commit` publishes the sheet JSON on a new
//! branch, `dispatch` hands it to a workflow, `export` writes it out for
//! download and `preview` shows the records as a table.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use sheetsync::cli::render_records;
use sheetsync::credentials::{CredentialStore, EnvCredentials, FileCredentials};
use sheetsync::git::GitHubConnector;
use sheetsync::sheet::open_workbook;
use sheetsync::{SyncConfig, SyncError, SyncOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "sheetsync", version, about = "Publish a spreadsheet sheet as JSON to a GitHub repository")]
struct Cli {
    /// JSON config file (defaults < file < SHEETSYNC_* env < flags)
    #[arg(long, global = true, env = "SHEETSYNC_CONFIG")]
    config: Option<PathBuf>,
    /// Workbook file (.xlsx/.xls/.ods) or directory of <sheet>.csv files
    #[arg(long, global = true, env = "SHEETSYNC_WORKBOOK", default_value = "workbook.xlsx")]
    workbook: PathBuf,
    /// Sheet to read
    #[arg(long, global = true)]
    sheet: Option<String>,
    /// Column span, e.g. A:C
    #[arg(long, global = true)]
    range: Option<String>,
    /// JSON file of credential properties; the environment is used otherwise
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Commit the sheet JSON to a new branch
    Commit,
    /// Trigger the configured workflow with the sheet JSON as input
    Dispatch,
    /// Write the sheet JSON to a file or stdout
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the sheet records as a table
    Preview,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    // .env first so SHEETSYNC_* values in it take part in config resolution
    let env_credentials = EnvCredentials::with_dotenv();

    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    config.apply_env();
    if let Some(sheet) = &cli.sheet {
        config.sheet_name = sheet.clone();
    }
    if let Some(range) = &cli.range {
        config.columns = range.clone();
    }

    let credentials: Box<dyn CredentialStore> = match &cli.credentials {
        Some(path) => Box::new(FileCredentials::load(path)?),
        None => Box::new(env_credentials),
    };
    let workbook = open_workbook(&cli.workbook)
        .with_context(|| format!("cannot open workbook {}", cli.workbook.display()))?;
    let connector = GitHubConnector::from_config(&config);

    info!(
        target: "sheetsync",
        "sheetsync starting: command={:?} workbook='{}' sheet='{}' columns={}",
        cli.command, cli.workbook.display(), config.sheet_name, config.columns
    );

    let orchestrator = SyncOrchestrator::new(config, workbook, credentials, connector);
    if let Err(e) = run(&orchestrator, &cli.command).await {
        error!(target: "sheetsync", code = e.code_str(), "{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run<W, C>(orchestrator: &SyncOrchestrator<W, C, GitHubConnector>, command: &Command) -> Result<(), SyncError>
where
    W: sheetsync::sheet::Workbook,
    C: CredentialStore,
{
    match command {
        Command::Commit => {
            orchestrator.config().validate_remote().map_err(|e| SyncError::Config(e.to_string()))?;
            let outcome = orchestrator.commit().await?;
            info!(
                target: "sheetsync",
                "committed {} records as {} on {} ({})",
                outcome.records, outcome.file_name, outcome.branch, outcome.commit_sha
            );
        }
        Command::Dispatch => {
            orchestrator.config().validate_remote().map_err(|e| SyncError::Config(e.to_string()))?;
            orchestrator.dispatch().await?;
        }
        Command::Export { out } => {
            let json = orchestrator.generate_for_download()?;
            match out {
                Some(path) => {
                    fs::write(path, &json).map_err(|e| SyncError::Output { path: path.clone(), source: e })?;
                    info!(target: "sheetsync", "wrote {} bytes to {}", json.len(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Preview => {
            let records = orchestrator.load_records()?;
            match render_records(&records) {
                Some(table) => println!("{}", table),
                None => println!("(no records)"),
            }
        }
    }
    Ok(())
}
