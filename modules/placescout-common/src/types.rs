use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a business observation came from.
///
/// Reconciliation trusts sources in the order of `Source::DEFAULT_PRIORITY`:
/// structured map listings first, LLM research last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    MapsListing,
    PlaceDetails,
    ReviewSite,
    LocalPack,
    LlmDiscovery,
    LlmAmenities,
    LlmCapacity,
    LlmPricing,
}

impl Source {
    /// Default trust ordering, highest first.
    pub const DEFAULT_PRIORITY: [Source; 8] = [
        Source::MapsListing,
        Source::PlaceDetails,
        Source::ReviewSite,
        Source::LocalPack,
        Source::LlmDiscovery,
        Source::LlmAmenities,
        Source::LlmCapacity,
        Source::LlmPricing,
    ];
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::MapsListing => write!(f, "maps_listing"),
            Source::PlaceDetails => write!(f, "place_details"),
            Source::ReviewSite => write!(f, "review_site"),
            Source::LocalPack => write!(f, "local_pack"),
            Source::LlmDiscovery => write!(f, "llm_discovery"),
            Source::LlmAmenities => write!(f, "llm_amenities"),
            Source::LlmCapacity => write!(f, "llm_capacity"),
            Source::LlmPricing => write!(f, "llm_pricing"),
        }
    }
}

/// One value in a record's open-ended field map.
///
/// Sources disagree on shape as much as on content, so the variants carry the
/// three shapes reconciliation distinguishes: scalars, set-like lists, and
/// structured sub-records (kept as raw JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Structured(serde_json::Value),
}

impl FieldValue {
    /// Empty values are discarded before reconciliation.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            FieldValue::Structured(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::String(s) => s.trim().is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.values().all(|v| v.is_null()),
                _ => false,
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// One business observation from one source. Immutable once built; the merge
/// engine consumes a batch of these and never hands them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source: Source,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Open-ended per-source fields. BTreeMap keeps iteration (and therefore
    /// every downstream ordering decision) deterministic.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new(source: Source, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            address: None,
            phone: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Final deduplicated business record, one per match cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub name: String,
    pub fields: BTreeMap<String, FieldValue>,
    /// Distinct sources that contributed; a downstream confidence signal.
    pub source_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_values() {
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert!(FieldValue::List(vec!["".into(), " ".into()]).is_empty());
        assert!(FieldValue::Structured(serde_json::Value::Null).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::Text("Spa".into()).is_empty());
    }

    #[test]
    fn field_value_deserializes_untagged() {
        let v: FieldValue = serde_json::from_str("\"open 9-5\"").unwrap();
        assert_eq!(v, FieldValue::Text("open 9-5".into()));

        let v: FieldValue = serde_json::from_str("4.5").unwrap();
        assert_eq!(v, FieldValue::Number(4.5));

        let v: FieldValue = serde_json::from_str("[\"wifi\", \"parking\"]").unwrap();
        assert_eq!(v, FieldValue::List(vec!["wifi".into(), "parking".into()]));
    }

    #[test]
    fn record_builder_sets_fields() {
        let record = RawRecord::new(Source::MapsListing, "Tattva Spa")
            .with_address("12 MG Road")
            .with_field("rating", 4.5);
        assert_eq!(record.address.as_deref(), Some("12 MG Road"));
        assert_eq!(record.fields.get("rating"), Some(&FieldValue::Number(4.5)));
    }
}
