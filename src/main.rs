use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use activity_intake::dataset::Dataset;
use activity_intake::outcome::{Outcome, RunResults};
use activity_intake::parser::Form;
use activity_intake::record::ActivityRecord;
use activity_intake::schema::SchemaValidator;
use activity_intake::settings::Settings;
use activity_intake::{maintenance, pipeline};

#[derive(Parser)]
#[command(name = "activity_intake", about = "Activity submission intake for the activity dataset")]
struct Cli {
    /// Settings file (default: ./intake.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one issue event: parse, validate, dedupe, append
    Ingest {
        /// Event payload (default: $GITHUB_EVENT_PATH)
        #[arg(long)]
        event: Option<PathBuf>,
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Run-results file for `result`/`message` (default: $GITHUB_OUTPUT, else stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build and validate a record from an issue body without touching the dataset
    Parse {
        body: PathBuf,
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Report dataset invariant violations
    Check {
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Fill missing record ids from name and city
    BackfillIds {
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());

    match cli.command {
        Commands::Ingest {
            event,
            dataset,
            schema,
            output,
        } => {
            let results = RunResults::new(output.or_else(|| env_path("GITHUB_OUTPUT")));

            // Every failure from here on is reported as an outcome, never raised.
            let outcome = match (settings, event.or_else(|| env_path("GITHUB_EVENT_PATH"))) {
                (Err(e), _) => Outcome::Error {
                    message: e.to_string(),
                },
                (Ok(_), None) => Outcome::Error {
                    message: "no event payload: pass --event or set GITHUB_EVENT_PATH".to_string(),
                },
                (Ok(mut settings), Some(path)) => {
                    override_path(&mut settings.dataset_path, dataset);
                    override_path(&mut settings.schema_path, schema);
                    pipeline::run_event(&path, &settings)
                }
            };
            info!(result = outcome.code(), "{}", outcome.message());
            results.report(&outcome).context("Failed to report run results")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Parse { body, schema } => {
            let mut settings = settings.context("Failed to load settings")?;
            override_path(&mut settings.schema_path, schema);
            let text = std::fs::read_to_string(&body)
                .with_context(|| format!("Failed to read {}", body.display()))?;
            let record = ActivityRecord::build(&Form::parse(&text), &settings.build_rules());
            println!("{}", serde_json::to_string_pretty(&record)?);

            let validation = SchemaValidator::load(&settings.schema_path)?.validate(&record);
            if validation.ok {
                println!("\nValid.");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("\n{} violation(s):", validation.errors.len());
                for e in &validation.errors {
                    println!("  {}", e);
                }
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Check { dataset } => {
            let mut settings = settings.context("Failed to load settings")?;
            override_path(&mut settings.dataset_path, dataset);
            let ds = Dataset::load(&settings.dataset_path)?;
            let findings = maintenance::audit(&ds, &settings.dedup_rules());
            if findings.is_empty() {
                println!("{} records, no violations.", ds.len());
                return Ok(ExitCode::SUCCESS);
            }
            for f in &findings {
                println!("{}", f);
            }
            println!("\n{} records, {} violation(s).", ds.len(), findings.len());
            Ok(ExitCode::FAILURE)
        }
        Commands::BackfillIds { dataset } => {
            let mut settings = settings.context("Failed to load settings")?;
            override_path(&mut settings.dataset_path, dataset);
            let mut ds = Dataset::load(&settings.dataset_path)?;
            let filled = maintenance::backfill_ids(&mut ds);
            if filled == 0 {
                println!("All {} records already have ids.", ds.len());
                return Ok(ExitCode::SUCCESS);
            }
            ds.persist(&settings.dataset_path)?;
            println!("IDs added where missing: {} of {} records.", filled, ds.len());
            if maintenance::audit(&ds, &settings.dedup_rules())
                .iter()
                .any(|f| matches!(f, maintenance::Finding::DuplicateId { .. }))
            {
                warn!("dataset now contains duplicate ids; run `check` for details");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
