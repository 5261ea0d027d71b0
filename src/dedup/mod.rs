pub mod similarity;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::dataset::Dataset;
use crate::normalize::normalize;
use crate::record::ActivityRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupRules {
    /// Inclusive Jaro-Winkler score at which two name+city strings count as
    /// the same activity.
    pub fuzzy_threshold: f64,
}

impl Default for DedupRules {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.90,
        }
    }
}

/// Why a candidate was rejected, with the existing record(s) it collides with.
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateReason {
    ExactKey { existing: ActivityRecord },
    SameMapLink { existing: ActivityRecord },
    Similar { matches: Vec<SimilarMatch> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarMatch {
    pub existing: ActivityRecord,
    pub score: f64,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::ExactKey { existing } => write!(
                f,
                "Exact duplicate of \"{}\" in {}.",
                existing.name, existing.city
            ),
            DuplicateReason::SameMapLink { existing } => write!(
                f,
                "Duplicate: same Google Maps link as \"{}\" in {}.",
                existing.name, existing.city
            ),
            DuplicateReason::Similar { matches } => {
                let names: Vec<String> = matches.iter().map(|m| m.existing.label()).collect();
                write!(f, "Possible duplicate(s): {}", names.join("; "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The candidate was appended; the dataset is re-sorted and ready to persist.
    Created(Dataset),
    Duplicate(DuplicateReason),
}

/// Run the three duplicate checks in order, stopping at the first that
/// matches: normalized name+city key, identical map link, then fuzzy
/// name+city similarity against every record. Only when all three pass is the
/// candidate appended.
pub fn resolve(candidate: &ActivityRecord, mut dataset: Dataset, rules: &DedupRules) -> Resolution {
    if let Some(existing) = find_exact_key(candidate, &dataset) {
        debug!(existing = %existing.label(), "exact key match");
        return Resolution::Duplicate(DuplicateReason::ExactKey {
            existing: existing.clone(),
        });
    }

    if let Some(existing) = find_same_map_link(candidate, &dataset) {
        debug!(existing = %existing.label(), "map link match");
        return Resolution::Duplicate(DuplicateReason::SameMapLink {
            existing: existing.clone(),
        });
    }

    let matches = find_similar(candidate, &dataset, rules.fuzzy_threshold);
    if !matches.is_empty() {
        debug!(count = matches.len(), "fuzzy matches");
        return Resolution::Duplicate(DuplicateReason::Similar { matches });
    }

    dataset.push(candidate.clone());
    dataset.sort();
    Resolution::Created(dataset)
}

fn find_exact_key<'a>(candidate: &ActivityRecord, dataset: &'a Dataset) -> Option<&'a ActivityRecord> {
    let mut by_key: HashMap<String, &ActivityRecord> = HashMap::with_capacity(dataset.len());
    for record in dataset.records() {
        by_key.entry(record.dedup_key()).or_insert(record);
    }
    by_key.get(&candidate.dedup_key()).copied()
}

fn find_same_map_link<'a>(
    candidate: &ActivityRecord,
    dataset: &'a Dataset,
) -> Option<&'a ActivityRecord> {
    let link = candidate.map_link.trim();
    if link.is_empty() {
        return None;
    }
    dataset.records().iter().find(|r| r.map_link.trim() == link)
}

fn find_similar(candidate: &ActivityRecord, dataset: &Dataset, threshold: f64) -> Vec<SimilarMatch> {
    let target = fuzzy_text(candidate);
    dataset
        .records()
        .iter()
        .filter_map(|r| {
            let score = similarity::jaro_winkler(&target, &fuzzy_text(r));
            (score >= threshold).then(|| SimilarMatch {
                existing: r.clone(),
                score,
            })
        })
        .collect()
}

/// Normalized `name city`, the string fuzzy matching compares.
fn fuzzy_text(record: &ActivityRecord) -> String {
    normalize(&format!("{} {}", record.name, record.city))
}
