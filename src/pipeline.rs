use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{error, info, warn};

use crate::dataset::Dataset;
use crate::dedup::{self, Resolution};
use crate::error::IntakeError;
use crate::event::IssueEvent;
use crate::outcome::Outcome;
use crate::parser::Form;
use crate::record::ActivityRecord;
use crate::schema::SchemaValidator;
use crate::settings::Settings;

/// Process one issue event end to end. Never fails and never panics outward:
/// every unexpected failure becomes `Outcome::Error`.
pub fn run_event(event_path: &Path, settings: &Settings) -> Outcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| try_run_event(event_path, settings)));
    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("run failed: {}", e);
            Outcome::Error {
                message: e.to_string(),
            }
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unexpected internal failure".to_string());
            error!("run panicked: {}", message);
            Outcome::Error { message }
        }
    }
}

fn try_run_event(event_path: &Path, settings: &Settings) -> Result<Outcome, IntakeError> {
    let event = IssueEvent::load(event_path)?;
    let Some(issue) = event.submission(&settings.submission_label) else {
        info!("not a '{}' issue, skipping", settings.submission_label);
        return Ok(Outcome::Ignored {
            reason: format!("Not an '{}' issue.", settings.submission_label),
        });
    };

    info!(issue = ?issue.number, "processing submission");
    ingest(issue.body(), settings)
}

/// parse → build → validate → dedupe → persist for one submission body.
/// The dataset file is only written when the outcome is `Created`.
pub fn ingest(body: &str, settings: &Settings) -> Result<Outcome, IntakeError> {
    let record = ActivityRecord::build(&Form::parse(body), &settings.build_rules());

    let schema = SchemaValidator::load(&settings.schema_path)?;
    let validation = schema.validate(&record);
    if !validation.ok {
        warn!(violations = validation.errors.len(), "submission invalid: {}", validation.summary());
        return Ok(Outcome::Invalid(validation));
    }

    let dataset = Dataset::load(&settings.dataset_path)?;
    match dedup::resolve(&record, dataset, &settings.dedup_rules()) {
        Resolution::Duplicate(reason) => {
            info!("duplicate: {}", reason);
            Ok(Outcome::Duplicate(reason))
        }
        Resolution::Created(dataset) => {
            dataset.persist(&settings.dataset_path)?;
            info!(id = %record.id, records = dataset.len(), "prepared entry: {}", record.label());
            Ok(Outcome::Created(record))
        }
    }
}
