use std::collections::HashMap;
use std::fmt;

use crate::dataset::Dataset;
use crate::dedup::{similarity, DedupRules};
use crate::normalize::{self, normalize};

/// A dataset invariant violation found by [`audit`]. Reported, never fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Unsorted { position: usize },
    DuplicateKey { key: String, names: Vec<String> },
    DuplicateMapLink { link: String, names: Vec<String> },
    DuplicateId { id: String, names: Vec<String> },
    Similar { first: String, second: String, score: f64 },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Unsorted { position } => {
                write!(f, "record {} is out of (city, district, name) order", position)
            }
            Finding::DuplicateKey { key, names } => {
                write!(f, "duplicate key '{}': {}", key, names.join("; "))
            }
            Finding::DuplicateMapLink { link, names } => {
                write!(f, "duplicate map link '{}': {}", link, names.join("; "))
            }
            Finding::DuplicateId { id, names } => {
                write!(f, "duplicate id '{}': {}", id, names.join("; "))
            }
            Finding::Similar { first, second, score } => {
                write!(f, "similar records ({:.3}): {} / {}", score, first, second)
            }
        }
    }
}

/// Check every dataset invariant and list the violations.
pub fn audit(dataset: &Dataset, rules: &DedupRules) -> Vec<Finding> {
    let records = dataset.records();
    let mut findings = Vec::new();

    if let Some(i) = records
        .windows(2)
        .position(|w| crate::dataset::compare_records(&w[0], &w[1]).is_gt())
    {
        findings.push(Finding::Unsorted { position: i + 1 });
    }

    for (key, names) in groups(records.iter().map(|r| (r.dedup_key(), r.label()))) {
        findings.push(Finding::DuplicateKey { key, names });
    }

    let links = records
        .iter()
        .filter(|r| !r.map_link.trim().is_empty())
        .map(|r| (r.map_link.trim().to_string(), r.label()));
    for (link, names) in groups(links) {
        findings.push(Finding::DuplicateMapLink { link, names });
    }

    let ids = records
        .iter()
        .filter(|r| !r.id.is_empty())
        .map(|r| (r.id.clone(), r.label()));
    for (id, names) in groups(ids) {
        findings.push(Finding::DuplicateId { id, names });
    }

    let texts: Vec<String> = records
        .iter()
        .map(|r| normalize(&format!("{} {}", r.name, r.city)))
        .collect();
    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            // Exact-key pairs are already reported above.
            if records[i].dedup_key() == records[j].dedup_key() {
                continue;
            }
            let score = similarity::jaro_winkler(&texts[i], &texts[j]);
            if score >= rules.fuzzy_threshold {
                findings.push(Finding::Similar {
                    first: records[i].label(),
                    second: records[j].label(),
                    score,
                });
            }
        }
    }

    findings
}

/// Keys seen more than once, in first-seen order, with every owner.
fn groups(items: impl Iterator<Item = (String, String)>) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut owners: HashMap<String, Vec<String>> = HashMap::new();
    for (key, name) in items {
        let entry = owners.entry(key.clone()).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(name);
    }
    order
        .into_iter()
        .filter_map(|key| {
            let names = owners.remove(&key)?;
            (names.len() > 1).then_some((key, names))
        })
        .collect()
}

/// Give every record without an `id` the slug of its name and city.
/// Existing ids are never changed. Returns how many were filled.
pub fn backfill_ids(dataset: &mut Dataset) -> usize {
    let mut filled = 0;
    for record in dataset.records_mut() {
        if record.id.trim().is_empty() {
            record.id = normalize::slug(&record.name, &record.city);
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ActivityRecord;
    use std::path::Path;

    fn rec(name: &str, city: &str, id: &str, map_link: &str) -> ActivityRecord {
        ActivityRecord {
            name: name.into(),
            city: city.into(),
            id: id.into(),
            map_link: map_link.into(),
            ..ActivityRecord::default()
        }
    }

    #[test]
    fn sample_dataset_is_clean() {
        let ds = Dataset::load(Path::new("data/activities.json")).unwrap();
        let findings = audit(&ds, &DedupRules::default());
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn reports_each_violation() {
        let ds = Dataset::new(vec![
            rec("Zoo", "Taipei", "shared", "https://maps/1"),
            rec("Aquarium", "Keelung", "shared", "https://maps/1"),
            rec("zoo", "TAIPEI", "zoo-taipei", ""),
        ]);
        let findings = audit(&ds, &DedupRules::default());
        assert!(findings.contains(&Finding::Unsorted { position: 1 }));
        assert!(findings.iter().any(|f| matches!(f, Finding::DuplicateKey { key, .. } if key == "zoo|taipei")));
        assert!(findings.iter().any(|f| matches!(f, Finding::DuplicateMapLink { names, .. } if names.len() == 2)));
        assert!(findings.iter().any(|f| matches!(f, Finding::DuplicateId { id, .. } if id == "shared")));
    }

    #[test]
    fn reports_similar_pairs() {
        let ds = Dataset::new(vec![
            rec("Sunshine Playground", "Taoyuan", "", ""),
            rec("Sunshyne Playgrund", "Taoyuan", "", ""),
        ]);
        let findings = audit(&ds, &DedupRules::default());
        assert!(findings.iter().any(|f| matches!(f, Finding::Similar { .. })));
    }

    #[test]
    fn backfill_fills_only_missing_ids() {
        let mut ds = Dataset::new(vec![
            rec("Sunshine Playground", "Taoyuan", "", ""),
            rec("Zoo", "Taipei", "custom-id", ""),
        ]);
        assert_eq!(backfill_ids(&mut ds), 1);
        assert_eq!(ds.records()[0].id, "sunshine-playground-taoyuan");
        assert_eq!(ds.records()[1].id, "custom-id");
        assert_eq!(backfill_ids(&mut ds), 0);
    }
}
