use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::dedup::DuplicateReason;
use crate::error::IntakeError;
use crate::record::ActivityRecord;
use crate::schema::Validation;

/// Terminal result of one pipeline run. Only `Created` has mutated the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ignored { reason: String },
    Invalid(Validation),
    Duplicate(DuplicateReason),
    Created(ActivityRecord),
    Error { message: String },
}

impl Outcome {
    /// The `result` code reported to the calling automation.
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Ignored { .. } => "ignored",
            Outcome::Invalid(_) => "invalid",
            Outcome::Duplicate(_) => "duplicate",
            Outcome::Created(_) => "created",
            Outcome::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Ignored { reason } => reason.clone(),
            Outcome::Invalid(validation) => validation.summary(),
            Outcome::Duplicate(reason) => reason.to_string(),
            Outcome::Created(record) => format!("Added {} in {}.", record.name, record.city),
            Outcome::Error { message } => message.clone(),
        }
    }
}

/// Where `result` and `message` go: appended to a run-results file in
/// `key=value` form, or printed to stdout when no file is configured.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    path: Option<PathBuf>,
}

const DELIMITER: &str = "ACTIVITY_INTAKE_EOF";

impl RunResults {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn report(&self, outcome: &Outcome) -> Result<(), IntakeError> {
        let text = format!(
            "{}{}",
            encode("result", outcome.code()),
            encode("message", &outcome.message())
        );

        match &self.path {
            Some(path) => OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| f.write_all(text.as_bytes()))
                .map_err(|source| IntakeError::Output {
                    path: path.clone(),
                    source,
                }),
            None => {
                print!("{}", text);
                Ok(())
            }
        }
    }
}

/// One output entry. Multi-line values use the `key<<DELIMITER` form with a
/// delimiter that does not occur in the value.
fn encode(key: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{}={}\n", key, value);
    }
    let mut delimiter = DELIMITER.to_string();
    let mut n = 0;
    while value.contains(&delimiter) {
        n += 1;
        delimiter = format!("{}_{}", DELIMITER, n);
    }
    format!("{}<<{}\n{}\n{}\n", key, delimiter, value, delimiter)
}
