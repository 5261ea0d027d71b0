use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::normalize;
use crate::parser::Form;

static LEADING_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

/// Issue-form labels, as they appear in the submission template.
pub mod labels {
    pub const NAME: &str = "Activity name";
    pub const REGION: &str = "Region/County";
    pub const CITY: &str = "City";
    pub const DISTRICT: &str = "District/Area";
    pub const INDOOR_OUTDOOR: &str = "Indoor / Outdoor";
    pub const CATEGORIES: &str = "Categories (select at least one)";
    pub const FEATURES: &str = "Features";
    pub const TAGS: &str = "Tags (comma separated)";
    pub const COST_RANGE: &str = "Cost Range (NTD)";
    pub const AGE_MIN: &str = "Minimum Recommended Age";
    pub const AGE_MAX: &str = "Maximum Recommended Age";
    pub const DESCRIPTION: &str = "Description";
    pub const WEBSITE: &str = "Official Website (optional)";
    pub const MAP_LINK: &str = "Google Maps Link";
    pub const DRIVE_TIME: &str = "Drive Time (minutes from Zhongli)";
    pub const ADDRESS_EN: &str = "Full Address (English)";
    pub const ADDRESS_QUERY: &str = "Map Search Query";
}

/// One entry of the activity dataset.
///
/// Every field tolerates being absent or `null` on load so older entries
/// still deserialize; fields this type does not know are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub region: String,
    #[serde(default, deserialize_with = "nullable")]
    pub city: String,
    #[serde(default, deserialize_with = "nullable")]
    pub district: String,
    #[serde(default, deserialize_with = "nullable")]
    pub indoor_outdoor: String,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub cost_range: String,
    #[serde(default, deserialize_with = "nullable")]
    pub age_range: AgeRange,
    #[serde(default, deserialize_with = "nullable")]
    pub natural: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub desc: String,
    #[serde(default, deserialize_with = "nullable")]
    pub website: String,
    #[serde(default, deserialize_with = "nullable")]
    pub map_link: String,
    #[serde(default, deserialize_with = "nullable")]
    pub drive_min: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub address_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address_query: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inclusive recommended ages, serialized as `[min, max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange(pub i64, pub i64);

impl AgeRange {
    pub fn min(&self) -> i64 {
        self.0
    }

    pub fn max(&self) -> i64 {
        self.1
    }
}

/// Defaults and keywords applied while building a record from a form.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRules {
    pub default_age_min: i64,
    pub default_age_max: i64,
    pub default_drive_min: i64,
    /// A selected feature containing this text (any case) marks the
    /// activity as natural.
    pub natural_keyword: String,
}

impl Default for BuildRules {
    fn default() -> Self {
        Self {
            default_age_min: 0,
            default_age_max: 14,
            default_drive_min: 0,
            natural_keyword: "natural".to_string(),
        }
    }
}

impl ActivityRecord {
    /// Assemble a record from a parsed issue form. Never fails: missing
    /// optional fields take their defaults and an empty name is left for
    /// schema validation to reject.
    pub fn build(form: &Form, rules: &BuildRules) -> Self {
        let name = form.field(labels::NAME);
        let city = form.field(labels::CITY);
        let features = form.checked(labels::FEATURES);
        let keyword = rules.natural_keyword.to_lowercase();

        Self {
            id: normalize::slug(&name, &city),
            region: form.field(labels::REGION),
            district: form.field(labels::DISTRICT),
            indoor_outdoor: form.field(labels::INDOOR_OUTDOOR),
            categories: form.checked(labels::CATEGORIES),
            tags: split_tags(&form.field(labels::TAGS)),
            cost_range: form.field(labels::COST_RANGE),
            age_range: AgeRange(
                parse_int_or(&form.field(labels::AGE_MIN), rules.default_age_min),
                parse_int_or(&form.field(labels::AGE_MAX), rules.default_age_max),
            ),
            natural: !keyword.is_empty()
                && features.iter().any(|f| f.to_lowercase().contains(&keyword)),
            desc: form.field(labels::DESCRIPTION),
            website: form.field(labels::WEBSITE),
            map_link: form.field(labels::MAP_LINK),
            drive_min: parse_int_or(&form.field(labels::DRIVE_TIME), rules.default_drive_min),
            address_en: form.field(labels::ADDRESS_EN),
            address_query: form.field(labels::ADDRESS_QUERY),
            name,
            city,
            extra: Map::new(),
        }
    }

    pub fn dedup_key(&self) -> String {
        normalize::dedup_key(&self.name, &self.city)
    }

    /// `Name (City)`, used in duplicate messages.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.city)
    }
}

/// Comma-separated tags, trimmed, empties dropped.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Leading integer of `raw` ("12 years" → 12). Unparsable text and zero
/// both fall back to `default`.
fn parse_int_or(raw: &str, default: i64) -> i64 {
    LEADING_INT_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<i64>().ok())
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
