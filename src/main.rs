// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use file_intake::report::print_summary;
use file_intake::utils::logging::{format_success, format_warning};
use file_intake::{
    ContinuationBatch, FileKind, FileScanner, IntakeConfiguration, IntakeOrchestrator,
    IntakeProgressView, IntakeSnapshot, SignatureValidator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Extra time allowed for an armed auto-advance to fire before giving up on it.
const AUTO_ADVANCE_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "file_intake")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Validate and stage files before processing", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", env = "FILE_INTAKE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate files and report whether they may continue to processing
    Check {
        /// Files or directories to admit, in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, value_enum)]
        kind: Option<FileKind>,

        #[arg(long, value_name = "NUM")]
        capacity: Option<usize>,

        /// Continue automatically once the gate opens, after this many milliseconds
        #[arg(long, value_name = "MS")]
        auto_advance: Option<u64>,

        #[arg(long)]
        no_progress: bool,
    },

    /// Print the effective configuration as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    file_intake::utils::logging::init_logger(cli.color, cli.verbose);

    let config =
        IntakeConfiguration::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Check {
            paths,
            kind,
            capacity,
            auto_advance,
            no_progress,
        } => {
            let mut config = config;
            if let Some(kind) = kind {
                config.file_kind = kind;
            }
            if let Some(capacity) = capacity {
                config.capacity = capacity;
            }
            if let Some(delay_ms) = auto_advance {
                config.auto_advance.enabled = true;
                config.auto_advance.delay_ms = delay_ms;
            }
            if no_progress {
                config.progress.disabled = true;
            }
            config.validate().context("Invalid configuration")?;

            cmd_check(config, &paths, cli.color).await?;
        }
        Commands::ShowConfig => {
            cmd_show_config(&config)?;
        }
    }

    Ok(())
}

async fn cmd_check(config: IntakeConfiguration, paths: &[PathBuf], colored: bool) -> Result<()> {
    info!(
        "Checking {} input(s) as {} (capacity {})",
        paths.len(),
        config.file_kind.label(),
        config.capacity
    );

    let scanner = FileScanner::new(config.file_kind);
    let files = scanner.load(paths).await.context("Failed to read input files")?;
    if files.is_empty() {
        bail!("No {} files found", config.file_kind.label());
    }

    let labels = config.labels();
    let auto_advance = config.auto_advance.enabled;
    let auto_delay = config.auto_advance.delay();
    let validator = Arc::new(SignatureValidator::new(config.file_kind));

    let (sender, mut continuations) = mpsc::unbounded_channel::<ContinuationBatch>();
    let intake = IntakeOrchestrator::new(config, validator, move |batch| {
        if sender.send(batch).is_err() {
            debug!("Continuation receiver already closed");
        }
    })?;

    let mut updates = intake.subscribe();
    let outcome = intake.add_files(files);
    if let Some(notice) = &outcome.notice {
        warn!("{}", notice);
    }

    let snapshot = watch_until_settled(&mut updates, labels.clone(), colored).await?;

    let batch = if auto_advance && snapshot.verdict.allowed {
        debug!("Waiting for auto-advance");
        match tokio::time::timeout(auto_delay + AUTO_ADVANCE_GRACE, continuations.recv()).await {
            Ok(Some(batch)) => Some(batch),
            _ => None,
        }
    } else if snapshot.verdict.allowed {
        Some(intake.proceed()?)
    } else {
        None
    };

    let snapshot = intake.snapshot();
    print_summary(&snapshot, &labels);
    intake.dispose();

    match batch {
        Some(batch) => {
            println!(
                "{}",
                format_success(&format!("{} file(s) ready for processing", batch.files.len()))
            );
            Ok(())
        }
        None => {
            let reason = snapshot
                .verdict
                .reason_text()
                .unwrap_or_else(|| "auto-advance did not fire".to_string());
            eprintln!("{}", format_warning(&reason));
            bail!("Cannot continue: {}", reason)
        }
    }
}

async fn watch_until_settled(
    updates: &mut tokio::sync::watch::Receiver<IntakeSnapshot>,
    labels: file_intake::DisplayLabels,
    colored: bool,
) -> Result<IntakeSnapshot> {
    let mut view = IntakeProgressView::new(labels, colored);

    loop {
        let snapshot = updates.borrow_and_update().clone();
        view.render(&snapshot);

        if snapshot.all_settled() {
            view.finish();
            return Ok(snapshot);
        }

        updates
            .changed()
            .await
            .context("Intake session ended unexpectedly")?;
    }
}

fn cmd_show_config(config: &IntakeConfiguration) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}
