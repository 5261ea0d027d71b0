use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::dedup::DedupRules;
use crate::error::IntakeError;
use crate::record::BuildRules;

const ENV_PREFIX: &str = "INTAKE";
const DEFAULT_CONFIG_FILE: &str = "intake";

/// Runtime settings: built-in defaults, then `intake.toml` (optional), then
/// `INTAKE_*` environment variables. CLI flags override on top.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub dataset_path: PathBuf,
    pub schema_path: PathBuf,
    /// Issue label that marks an activity submission.
    pub submission_label: String,
    pub fuzzy_threshold: f64,
    pub natural_keyword: String,
    pub default_age_min: i64,
    pub default_age_max: i64,
    pub default_drive_min: i64,
}

impl Settings {
    /// Load settings. With `file` the given file must exist; without it an
    /// `intake.toml` in the working directory is used when present.
    pub fn load(file: Option<&Path>) -> Result<Self, IntakeError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("dataset_path", "data/activities.json")
            .and_then(|b| b.set_default("schema_path", "data/activity.schema.json"))
            .and_then(|b| b.set_default("submission_label", "add-activity"))
            .and_then(|b| b.set_default("fuzzy_threshold", 0.90))
            .and_then(|b| b.set_default("natural_keyword", "natural"))
            .and_then(|b| b.set_default("default_age_min", 0))
            .and_then(|b| b.set_default("default_age_max", 14))
            .and_then(|b| b.set_default("default_drive_min", 0))
            .map_err(config_error)?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(config_error)?;

        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), IntakeError> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(IntakeError::Configuration(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.submission_label.trim().is_empty() {
            return Err(IntakeError::Configuration(
                "submission_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_rules(&self) -> BuildRules {
        BuildRules {
            default_age_min: self.default_age_min,
            default_age_max: self.default_age_max,
            default_drive_min: self.default_drive_min,
            natural_keyword: self.natural_keyword.clone(),
        }
    }

    pub fn dedup_rules(&self) -> DedupRules {
        DedupRules {
            fuzzy_threshold: self.fuzzy_threshold,
        }
    }
}

fn config_error(e: config::ConfigError) -> IntakeError {
    IntakeError::Configuration(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(
            &path,
            "fuzzy_threshold = 0.95\nnatural_keyword = \"forest\"\ndataset_path = \"elsewhere.json\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.fuzzy_threshold, 0.95);
        assert_eq!(settings.dataset_path, PathBuf::from("elsewhere.json"));
        assert_eq!(settings.schema_path, PathBuf::from("data/activity.schema.json"));
        assert_eq!(settings.build_rules().natural_keyword, "forest");
        assert_eq!(settings.build_rules().default_age_max, 14);
        assert_eq!(settings.dedup_rules().fuzzy_threshold, 0.95);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(&path, "fuzzy_threshold = 1.5\n").unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(IntakeError::Configuration(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        // No other test reads default_drive_min, so the variable cannot leak
        // into tests running alongside.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(&path, "default_drive_min = 10\n").unwrap();

        std::env::set_var("INTAKE_DEFAULT_DRIVE_MIN", "25");
        let settings = Settings::load(Some(&path));
        std::env::remove_var("INTAKE_DEFAULT_DRIVE_MIN");

        let settings = settings.unwrap();
        assert_eq!(settings.default_drive_min, 25);
        assert_eq!(settings.build_rules().default_drive_min, 25);
    }

    #[test]
    fn missing_explicit_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
