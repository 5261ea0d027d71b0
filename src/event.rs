use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::IntakeError;

/// The slice of an issue-tracker event the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueEvent {
    #[serde(default)]
    pub issue: Option<Issue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub labels: Option<Vec<IssueLabel>>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Labels arrive as `{"name": ...}` objects; bare strings are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IssueLabel {
    Named { name: String },
    Plain(String),
}

impl IssueLabel {
    pub fn name(&self) -> &str {
        match self {
            IssueLabel::Named { name } | IssueLabel::Plain(name) => name,
        }
    }
}

impl IssueEvent {
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let raw = fs::read_to_string(path).map_err(|e| IntakeError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|source| IntakeError::EventFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The issue, if it carries `label` (exact match).
    pub fn submission(&self, label: &str) -> Option<&Issue> {
        self.issue.as_ref().filter(|issue| issue.has_label(label))
    }
}

impl Issue {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels
            .iter()
            .flatten()
            .any(|l| l.name() == label)
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}
