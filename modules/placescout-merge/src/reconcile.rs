use std::collections::HashSet;

use placescout_common::{FieldValue, Source};

#[derive(PartialEq, Eq, Clone, Copy)]
enum Shape {
    Scalar,
    Set,
    Structured,
}

fn shape_of(value: &FieldValue) -> Shape {
    match value {
        FieldValue::Text(_) | FieldValue::Number(_) => Shape::Scalar,
        FieldValue::List(_) => Shape::Set,
        FieldValue::Structured(_) => Shape::Structured,
    }
}

/// Pick or combine a final value for one field from every candidate the
/// cluster's members supplied, in member order.
///
/// - Empty candidates are dropped first; all empty means the field is absent
///   from the canonical record.
/// - Scalars: highest-priority source wins, first seen breaks ties.
/// - Lists: union of all candidates, deduplicated case-insensitively, first
///   occurrence keeps its casing and position.
/// - Structured values: the candidate with the most non-empty entries wins,
///   priority then first seen on ties.
/// - Mixed shapes across sources are unreconcilable: the highest-priority
///   source's raw value is kept unchanged.
///
/// Never fails.
pub fn reconcile(
    candidates: &[(Source, FieldValue)],
    rank: impl Fn(Source) -> usize,
) -> Option<FieldValue> {
    let present: Vec<(usize, Source, &FieldValue)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, (_, value))| !value.is_empty())
        .map(|(order, (source, value))| (order, *source, value))
        .collect();

    if present.is_empty() {
        return None;
    }

    let first_shape = shape_of(present[0].2);
    if present.iter().any(|(_, _, v)| shape_of(v) != first_shape) {
        return Some(pick_by_priority(&present, &rank));
    }

    match first_shape {
        Shape::Scalar => Some(pick_by_priority(&present, &rank)),
        Shape::Set => Some(union_lists(&present)),
        Shape::Structured => Some(pick_most_complete(&present, &rank)),
    }
}

fn pick_by_priority(
    present: &[(usize, Source, &FieldValue)],
    rank: &impl Fn(Source) -> usize,
) -> FieldValue {
    present
        .iter()
        .min_by_key(|(order, source, _)| (rank(*source), *order))
        .map(|(_, _, value)| (*value).clone())
        .expect("present is non-empty")
}

fn union_lists(present: &[(usize, Source, &FieldValue)]) -> FieldValue {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<String> = Vec::new();
    for (_, _, value) in present {
        if let FieldValue::List(items) = value {
            for item in items {
                let trimmed = item.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if seen.insert(trimmed.to_lowercase()) {
                    merged.push(trimmed.to_string());
                }
            }
        }
    }
    FieldValue::List(merged)
}

fn pick_most_complete(
    present: &[(usize, Source, &FieldValue)],
    rank: &impl Fn(Source) -> usize,
) -> FieldValue {
    present
        .iter()
        .min_by_key(|(order, source, value)| {
            // Negated completeness so the usual min-pick keeps priority and
            // first-seen as the tie-breakers.
            let completeness = match value {
                FieldValue::Structured(v) => structured_completeness(v),
                _ => 0,
            };
            (usize::MAX - completeness, rank(*source), *order)
        })
        .map(|(_, _, value)| (*value).clone())
        .expect("present is non-empty")
}

/// Count of non-empty entries in a structured value.
fn structured_completeness(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Null => 0,
        serde_json::Value::Object(map) => map
            .values()
            .filter(|v| !v.is_null() && v.as_str().map(|s| !s.trim().is_empty()).unwrap_or(true))
            .count(),
        serde_json::Value::Array(items) => items.len(),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rank(source: Source) -> usize {
        Source::DEFAULT_PRIORITY
            .iter()
            .position(|s| *s == source)
            .unwrap_or(Source::DEFAULT_PRIORITY.len())
    }

    #[test]
    fn all_empty_yields_none() {
        let candidates = vec![
            (Source::MapsListing, FieldValue::Text("  ".into())),
            (Source::ReviewSite, FieldValue::List(vec![])),
        ];
        assert_eq!(reconcile(&candidates, rank), None);
    }

    #[test]
    fn scalar_prefers_higher_priority_source() {
        let candidates = vec![
            (Source::LlmPricing, FieldValue::Text("₹2000".into())),
            (Source::MapsListing, FieldValue::Text("₹₹".into())),
        ];
        assert_eq!(
            reconcile(&candidates, rank),
            Some(FieldValue::Text("₹₹".into()))
        );
    }

    #[test]
    fn scalar_tie_keeps_first_seen() {
        let candidates = vec![
            (Source::ReviewSite, FieldValue::Number(4.2)),
            (Source::ReviewSite, FieldValue::Number(4.6)),
        ];
        assert_eq!(reconcile(&candidates, rank), Some(FieldValue::Number(4.2)));
    }

    #[test]
    fn lists_union_case_insensitively() {
        let candidates = vec![
            (Source::MapsListing, FieldValue::List(vec!["wifi".into()])),
            (
                Source::LlmAmenities,
                FieldValue::List(vec!["WiFi".into(), "Parking".into()]),
            ),
            (Source::ReviewSite, FieldValue::List(vec![])),
        ];
        assert_eq!(
            reconcile(&candidates, rank),
            Some(FieldValue::List(vec!["wifi".into(), "Parking".into()]))
        );
    }

    #[test]
    fn structured_prefers_most_complete() {
        let sparse = json!({"monday": "9-5", "tuesday": null});
        let full = json!({"monday": "9-5", "tuesday": "9-5", "sunday": "closed"});
        let candidates = vec![
            (Source::MapsListing, FieldValue::Structured(sparse)),
            (Source::LlmPricing, FieldValue::Structured(full.clone())),
        ];
        assert_eq!(
            reconcile(&candidates, rank),
            Some(FieldValue::Structured(full))
        );
    }

    #[test]
    fn mixed_shapes_fall_back_to_priority_raw() {
        let candidates = vec![
            (Source::LlmAmenities, FieldValue::List(vec!["sauna".into()])),
            (Source::ReviewSite, FieldValue::Text("sauna, pool".into())),
        ];
        assert_eq!(
            reconcile(&candidates, rank),
            Some(FieldValue::Text("sauna, pool".into()))
        );
    }
}
