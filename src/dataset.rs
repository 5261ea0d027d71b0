use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::IntakeError;
use crate::record::ActivityRecord;

/// The canonical activity list. Passed by value through the pipeline; there
/// is no shared handle and no locking, so callers must not run two writers
/// against the same file at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ActivityRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    /// Read and parse the whole file. Any failure here aborts the run before
    /// anything is mutated.
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let raw = fs::read_to_string(path).map_err(|e| IntakeError::io(path, e))?;
        let records: Vec<ActivityRecord> =
            serde_json::from_str(&raw).map_err(|source| IntakeError::DatasetFormat {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), records = records.len(), "dataset loaded");
        Ok(Self { records })
    }

    /// Write the whole dataset to `path` atomically: the JSON goes to a
    /// temporary file in the same directory which then replaces `path`. On
    /// failure the previous file is left as it was.
    pub fn persist(&self, path: &Path) -> Result<(), IntakeError> {
        let mut json = serde_json::to_string_pretty(&self.records).map_err(IntakeError::Encode)?;
        json.push('\n');

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| IntakeError::io(dir, e))?;
        // The temp file is created private; keep the replaced file's mode.
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| IntakeError::io(tmp.path(), e))?;
        }
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| IntakeError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| IntakeError::io(path, e.error))?;

        debug!(path = %path.display(), records = self.records.len(), "dataset written");
        Ok(())
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [ActivityRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append without re-sorting; see [`Dataset::sort`].
    pub fn push(&mut self, record: ActivityRecord) {
        self.records.push(record);
    }

    /// Stable sort by (city, district, name).
    pub fn sort(&mut self) {
        self.records.sort_by(compare_records);
    }

    pub fn is_sorted(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| compare_records(&w[0], &w[1]) != Ordering::Greater)
    }
}

/// Dataset order: city, then district, then name, all compared
/// case-insensitively. Only records equal on the whole lowercased triple are
/// ordered by exact text, so "taipei" and "Taipei" sort together but never
/// compare equal.
pub fn compare_records(a: &ActivityRecord, b: &ActivityRecord) -> Ordering {
    sort_key(a, str::to_lowercase)
        .cmp(&sort_key(b, str::to_lowercase))
        .then_with(|| sort_key(a, str::to_string).cmp(&sort_key(b, str::to_string)))
}

fn sort_key(r: &ActivityRecord, fold: fn(&str) -> String) -> (String, String, String) {
    (fold(&r.city), fold(&r.district), fold(&r.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn rec(name: &str, city: &str, district: &str) -> ActivityRecord {
        ActivityRecord {
            name: name.into(),
            city: city.into(),
            district: district.into(),
            ..ActivityRecord::default()
        }
    }

    #[test]
    fn load_sample_dataset() {
        let ds = Dataset::load(Path::new("data/activities.json")).unwrap();
        assert!(!ds.is_empty());
        assert!(ds.is_sorted());
        assert!(ds.records().iter().all(|r| !r.name.is_empty()));
    }

    #[test]
    fn sort_by_city_district_name() {
        let mut ds = Dataset::new(vec![
            rec("Zoo", "Taipei", "Wenshan"),
            rec("Aquarium", "Taipei", "Wenshan"),
            rec("Farm", "Hsinchu", "East"),
            rec("Museum", "taipei", "Daan"),
        ]);
        ds.sort();
        let names: Vec<&str> = ds.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Farm", "Museum", "Aquarium", "Zoo"]);
        assert!(ds.is_sorted());
    }

    #[test]
    fn case_variants_of_a_city_sort_by_district() {
        let mut ds = Dataset::new(vec![
            rec("Zoo", "TAIPEI", "Wenshan"),
            rec("Museum", "taipei", "Daan"),
            rec("Library", "Taipei", "Beitou"),
        ]);
        ds.sort();
        let names: Vec<&str> = ds.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Library", "Museum", "Zoo"]);

        let mut ties = Dataset::new(vec![rec("Park", "taipei", "Daan"), rec("Park", "Taipei", "Daan")]);
        ties.sort();
        assert_eq!(ties.records()[0].city, "Taipei");
        assert!(compare_records(&ties.records()[0], &ties.records()[1]).is_lt());
    }

    #[cfg(unix)]
    #[test]
    fn persist_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        Dataset::new(vec![rec("A", "B", "")]).persist(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn persist_round_trips_and_keeps_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.json");
        fs::write(
            &path,
            r#"[{"name":"Old Park","city":"Taoyuan","cost_ntd":"free"}]"#,
        )
        .unwrap();

        let mut ds = Dataset::load(&path).unwrap();
        ds.push(rec("New Park", "Hsinchu", ""));
        ds.sort();
        ds.persist(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\""));
        assert!(text.ends_with("]\n"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["name"], "New Park");
        assert_eq!(value[1]["cost_ntd"], "free");
        assert_eq!(Dataset::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn failed_persist_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.json");
        fs::write(&path, "[]").unwrap();

        let ds = Dataset::new(vec![rec("A", "B", "")]);
        let missing_dir = dir.path().join("nope").join("activities.json");
        assert!(ds.persist(&missing_dir).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unreadable_or_malformed_dataset() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::load(&dir.path().join("absent.json")),
            Err(IntakeError::Io { .. })
        ));
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"name":"not an array"}"#).unwrap();
        assert!(matches!(
            Dataset::load(&path),
            Err(IntakeError::DatasetFormat { .. })
        ));
    }
}
