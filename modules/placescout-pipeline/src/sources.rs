//! Conversion from per-source API payloads into `RawRecord`s.
//!
//! Each source keeps its own shape quirks here so the merge core only ever
//! sees the shared record model.

use placescout_common::{FieldValue, RawRecord, Source};
use serp_client::{LocalPlace, MapsPlace, PlaceDetails, YelpBusiness};

/// Review snippets are trimmed to this many characters per review.
const REVIEW_SNIPPET_CHARS: usize = 150;

/// Keys LLM research records use for the business name, checked in order.
const NAME_KEYS: &[&str] = &[
    "Name",
    "name",
    "Business Name",
    "business_name",
    "Title",
    "title",
];

const ADDRESS_KEYS: &[&str] = &["Address", "address", "Full Address", "full_address"];
const PHONE_KEYS: &[&str] = &["Phone", "phone"];

pub fn from_maps_place(place: &MapsPlace) -> RawRecord {
    let mut record = RawRecord::new(Source::MapsListing, place.title.clone());
    record.address = place.address.clone();
    record.phone = place.phone.clone();

    set_text(&mut record, "website", place.website.as_deref());
    set_number(&mut record, "rating", place.rating);
    set_number(&mut record, "reviews_count", place.reviews.map(|r| r as f64));
    set_text(&mut record, "category", place.place_type.as_deref());
    set_text(&mut record, "description", place.description.as_deref());
    set_text(&mut record, "price_level", place.price.as_deref());

    let hours = place.operating_hours.as_ref().or(place.hours.as_ref());
    if let Some(hours) = hours.and_then(flatten_hours) {
        record.fields.insert("hours".into(), FieldValue::Text(hours));
    }

    if let Some(gps) = place.gps_coordinates {
        record
            .fields
            .insert("latitude".into(), FieldValue::Number(gps.latitude));
        record
            .fields
            .insert("longitude".into(), FieldValue::Number(gps.longitude));
    }

    if let Some(options) = place.service_options.as_ref().map(truthy_keys) {
        if !options.is_empty() {
            record
                .fields
                .insert("service_options".into(), FieldValue::List(options));
        }
    }

    let tags = value_strings(&place.extensions);
    if !tags.is_empty() {
        record.fields.insert("tags".into(), FieldValue::List(tags));
    }

    record
}

pub fn from_place_details(details: &PlaceDetails) -> RawRecord {
    let mut record = RawRecord::new(Source::PlaceDetails, details.title.clone());
    record.address = details.address.clone();
    record.phone = details.phone.clone();

    set_text(&mut record, "website", details.website.as_deref());
    set_number(&mut record, "rating", details.rating);
    set_number(
        &mut record,
        "reviews_count",
        details.reviews.map(|r| r as f64),
    );
    set_text(&mut record, "category", details.place_type.as_deref());
    set_text(&mut record, "description", details.description.as_deref());
    set_text(&mut record, "price_level", details.price.as_deref());
    set_text(&mut record, "plus_code", details.plus_code.as_deref());

    let hours = details.operating_hours.as_ref().or(details.hours.as_ref());
    if let Some(hours) = hours.and_then(flatten_hours) {
        record.fields.insert("hours".into(), FieldValue::Text(hours));
    }

    if let Some(amenities) = details.amenities.as_ref().map(listify) {
        if !amenities.is_empty() {
            record
                .fields
                .insert("amenities".into(), FieldValue::List(amenities));
        }
    }

    if let Some(options) = details.service_options.as_ref().map(truthy_keys) {
        if !options.is_empty() {
            record
                .fields
                .insert("service_options".into(), FieldValue::List(options));
        }
    }

    let tags = value_strings(&details.extensions);
    if !tags.is_empty() {
        record.fields.insert("tags".into(), FieldValue::List(tags));
    }

    // Popular times stay structured; reconciliation picks the most complete.
    if let Some(popular) = &details.popular_times {
        if !popular.is_null() {
            record
                .fields
                .insert("popular_times".into(), FieldValue::Structured(popular.clone()));
        }
    }

    if let Some(reviews) = &details.user_reviews {
        let snippets: Vec<String> = reviews
            .most_relevant
            .iter()
            .filter_map(|r| r.snippet.as_deref().or(r.text.as_deref()))
            .map(|s| s.chars().take(REVIEW_SNIPPET_CHARS).collect())
            .filter(|s: &String| !s.is_empty())
            .take(3)
            .collect();
        if !snippets.is_empty() {
            record
                .fields
                .insert("top_reviews".into(), FieldValue::List(snippets));
        }
    }

    record
}

pub fn from_local_place(place: &LocalPlace) -> RawRecord {
    let mut record = RawRecord::new(Source::LocalPack, place.title.clone());
    record.address = place.address.clone();
    record.phone = place.phone.clone();

    set_text(&mut record, "website", place.website.as_deref());
    set_number(&mut record, "rating", place.rating);
    set_number(&mut record, "reviews_count", place.reviews.map(|r| r as f64));
    set_text(&mut record, "category", place.place_type.as_deref());
    set_text(&mut record, "hours", place.hours.as_deref());

    record
}

pub fn from_yelp(business: &YelpBusiness) -> RawRecord {
    let mut record = RawRecord::new(Source::ReviewSite, business.title.clone());
    record.address = business
        .neighborhood
        .clone()
        .or_else(|| business.address.clone());
    record.phone = business.phone.clone();

    set_text(&mut record, "website", business.link.as_deref());
    set_number(&mut record, "rating", business.rating);
    set_number(
        &mut record,
        "reviews_count",
        business.reviews.map(|r| r as f64),
    );
    set_text(&mut record, "price_level", business.price_range.as_deref());
    set_text(&mut record, "yelp_snippet", business.snippet.as_deref());

    if let Some(categories) = &business.categories {
        let list = listify(categories);
        if !list.is_empty() {
            record.fields.insert("category".into(), FieldValue::Text(list.join(", ")));
        }
    }

    record
}

/// Map one loosely-shaped LLM research record onto the shared model. A record
/// with no recognizable name still comes through; the merge engine degrades
/// it to a singleton rather than losing the data.
pub fn from_research(
    map: &serde_json::Map<String, serde_json::Value>,
    source: Source,
) -> RawRecord {
    let name = take_first_string(map, NAME_KEYS).unwrap_or_default();
    let mut record = RawRecord::new(source, name);
    record.address = take_first_string(map, ADDRESS_KEYS);
    record.phone = take_first_string(map, PHONE_KEYS);

    for (key, value) in map {
        if NAME_KEYS.contains(&key.as_str())
            || ADDRESS_KEYS.contains(&key.as_str())
            || PHONE_KEYS.contains(&key.as_str())
        {
            continue;
        }
        if let Some(field) = to_field_value(value) {
            record.fields.insert(field_name(key), field);
        }
    }

    record
}

// --- Helpers ---

fn set_text(record: &mut RawRecord, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            record
                .fields
                .insert(field.to_string(), FieldValue::Text(value.to_string()));
        }
    }
}

fn set_number(record: &mut RawRecord, field: &str, value: Option<f64>) {
    if let Some(value) = value {
        record
            .fields
            .insert(field.to_string(), FieldValue::Number(value));
    }
}

/// Hours arrive as a weekday map, a list of rows, or a plain string.
fn flatten_hours(value: &serde_json::Value) -> Option<String> {
    let flat = match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(day, times)| format!("{day}: {}", scalar_string(times)))
            .collect::<Vec<_>>()
            .join("; "),
        serde_json::Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Vec<_>>()
            .join("; "),
        other => scalar_string(other),
    };
    (!flat.trim().is_empty()).then_some(flat)
}

/// Keys of an object whose values are `true` ("dine_in": true → "dine_in").
fn truthy_keys(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .filter(|(_, v)| v.as_bool() == Some(true))
            .map(|(k, _)| k.clone())
            .collect(),
        _ => listify(value),
    }
}

/// Coerce a loose value into a list of display strings.
fn listify(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .filter(|s| !s.is_empty())
            .collect(),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", scalar_string(v)))
            .collect(),
        serde_json::Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn value_strings(values: &[serde_json::Value]) -> Vec<String> {
    values
        .iter()
        .map(scalar_string)
        .filter(|s| !s.is_empty())
        .collect()
}

fn scalar_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn take_first_string(
    map: &serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn to_field_value(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && trimmed != "null")
                .then(|| FieldValue::Text(trimmed.to_string()))
        }
        serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
        serde_json::Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
        serde_json::Value::Array(_) => {
            let items = listify(value);
            (!items.is_empty()).then_some(FieldValue::List(items))
        }
        serde_json::Value::Object(_) => Some(FieldValue::Structured(value.clone())),
    }
}

/// "Price Range" → "price_range".
fn field_name(key: &str) -> String {
    key.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_place_conversion_carries_core_fields() {
        let place: MapsPlace = serde_json::from_value(json!({
            "title": "Tattva Spa",
            "address": "12 MG Road",
            "phone": "+91 98765 43210",
            "rating": 4.5,
            "reviews": 120,
            "type": "Spa",
            "gps_coordinates": {"latitude": 17.4, "longitude": 78.4},
            "service_options": {"onsite_services": true, "delivery": false}
        }))
        .unwrap();

        let record = from_maps_place(&place);
        assert_eq!(record.source, Source::MapsListing);
        assert_eq!(record.name, "Tattva Spa");
        assert_eq!(record.address.as_deref(), Some("12 MG Road"));
        assert_eq!(record.fields.get("rating"), Some(&FieldValue::Number(4.5)));
        assert_eq!(
            record.fields.get("service_options"),
            Some(&FieldValue::List(vec!["onsite_services".into()]))
        );
    }

    #[test]
    fn hours_flatten_from_weekday_map() {
        let hours = json!({"monday": "9-5", "tuesday": "9-5"});
        assert_eq!(flatten_hours(&hours).as_deref(), Some("monday: 9-5; tuesday: 9-5"));
    }

    #[test]
    fn research_record_maps_name_and_fields() {
        let map = json!({
            "Name": "Aura Day Spa",
            "Address": "45 Park Street",
            "Phone": null,
            "Rating": 4.2,
            "Price Range": "₹₹",
            "Amenities": ["Sauna", "Pool"]
        });
        let serde_json::Value::Object(map) = map else {
            unreachable!()
        };

        let record = from_research(&map, Source::LlmDiscovery);
        assert_eq!(record.name, "Aura Day Spa");
        assert_eq!(record.address.as_deref(), Some("45 Park Street"));
        assert!(record.phone.is_none());
        assert_eq!(record.fields.get("rating"), Some(&FieldValue::Number(4.2)));
        assert_eq!(
            record.fields.get("price_range"),
            Some(&FieldValue::Text("₹₹".into()))
        );
        assert_eq!(
            record.fields.get("amenities"),
            Some(&FieldValue::List(vec!["Sauna".into(), "Pool".into()]))
        );
    }

    #[test]
    fn nameless_research_record_survives_conversion() {
        let serde_json::Value::Object(map) = json!({"Rating": 3.0}) else {
            unreachable!()
        };
        let record = from_research(&map, Source::LlmAmenities);
        assert_eq!(record.name, "");
        assert_eq!(record.fields.get("rating"), Some(&FieldValue::Number(3.0)));
    }
}
