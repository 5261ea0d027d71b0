use std::fs;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::IntakeError;
use crate::record::ActivityRecord;

/// One structural violation, addressed by JSON pointer (`/name`, `/age_range/1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub ok: bool,
    pub errors: Vec<ErrorDetail>,
}

impl Validation {
    /// All violations on one line, `; `-separated.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ErrorDetail::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Compiled form of the external activity schema document.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let raw = fs::read_to_string(path).map_err(|e| IntakeError::io(path, e))?;
        let schema: Value =
            serde_json::from_str(&raw).map_err(|source| IntakeError::SchemaFormat {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(&schema).map_err(|reason| IntakeError::SchemaCompile {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_value(schema: &Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
        Ok(Self { validator })
    }

    /// Check `record` and collect every violation, not just the first.
    pub fn validate(&self, record: &ActivityRecord) -> Validation {
        let instance = match serde_json::to_value(record) {
            Ok(v) => v,
            Err(e) => {
                return Validation {
                    ok: false,
                    errors: vec![ErrorDetail {
                        path: String::new(),
                        message: e.to_string(),
                    }],
                }
            }
        };

        let errors: Vec<ErrorDetail> = self
            .validator
            .iter_errors(&instance)
            .map(|e| ErrorDetail {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        Validation {
            ok: errors.is_empty(),
            errors,
        }
    }
}
