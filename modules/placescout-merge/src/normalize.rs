use placescout_common::RawRecord;

/// Canonical comparable form of a record's identifying fields.
///
/// A pure function of the record: same identifying fields in, same key out,
/// no external state. Missing fields become empty keys, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    pub name_key: String,
    pub address_key: String,
    pub phone_key: String,
}

/// Street-type abbreviations expanded during address normalization, so
/// "12 M.G. Rd" and "12 MG Road" compare on equal footing.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("rd", "road"),
    ("st", "street"),
    ("ave", "avenue"),
    ("av", "avenue"),
    ("blvd", "boulevard"),
    ("dr", "drive"),
    ("ln", "lane"),
    ("hwy", "highway"),
    ("pl", "place"),
    ("sq", "square"),
    ("ctr", "center"),
    ("mkt", "market"),
    ("nr", "near"),
    ("opp", "opposite"),
];

/// Phone keys keep at most this many trailing digits, which drops country
/// codes without needing to know which country the listing is in.
const PHONE_SIGNIFICANT_DIGITS: usize = 10;

pub fn normalize(record: &RawRecord) -> NormalizedKey {
    NormalizedKey {
        name_key: name_key(&record.name),
        address_key: record.address.as_deref().map(address_key).unwrap_or_default(),
        phone_key: record.phone.as_deref().map(phone_key).unwrap_or_default(),
    }
}

/// Lowercase, punctuation stripped, whitespace collapsed. Common suffix words
/// ("spa", "wellness", "the") are retained; the scorer down-weights them via
/// token overlap instead of deleting information here.
fn name_key(raw: &str) -> String {
    fold_to_tokens(raw).join(" ")
}

/// Like `name_key`, plus street-type abbreviation expansion. The first token
/// survives unchanged when numeric so the scorer can anchor on street number.
fn address_key(raw: &str) -> String {
    fold_to_tokens(raw)
        .into_iter()
        .map(|token| {
            STREET_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == token)
                .map(|(_, full)| full.to_string())
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digits only, trimmed to the last `PHONE_SIGNIFICANT_DIGITS`.
fn phone_key(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > PHONE_SIGNIFICANT_DIGITS {
        digits[digits.len() - PHONE_SIGNIFICANT_DIGITS..].to_string()
    } else {
        digits
    }
}

fn fold_to_tokens(raw: &str) -> Vec<String> {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use placescout_common::{RawRecord, Source};

    fn record(name: &str, address: Option<&str>, phone: Option<&str>) -> RawRecord {
        let mut r = RawRecord::new(Source::MapsListing, name);
        r.address = address.map(str::to_string);
        r.phone = phone.map(str::to_string);
        r
    }

    #[test]
    fn name_key_strips_punctuation_and_case() {
        let key = normalize(&record("  The Tattva — Wellness, Spa!  ", None, None));
        assert_eq!(key.name_key, "the tattva wellness spa");
    }

    #[test]
    fn address_key_expands_abbreviations() {
        let key = normalize(&record("x", Some("12 M.G. Rd"), None));
        assert_eq!(key.address_key, "12 m g road");

        let key = normalize(&record("x", Some("12 MG Road"), None));
        assert_eq!(key.address_key, "12 mg road");
    }

    #[test]
    fn phone_key_keeps_last_ten_digits() {
        let key = normalize(&record("x", None, Some("+91 98765-43210")));
        assert_eq!(key.phone_key, "9876543210");

        let key = normalize(&record("x", None, Some("(040) 2345 678")));
        assert_eq!(key.phone_key, "0402345678");
    }

    #[test]
    fn missing_fields_yield_empty_keys() {
        let key = normalize(&record("", None, None));
        assert_eq!(key.name_key, "");
        assert_eq!(key.address_key, "");
        assert_eq!(key.phone_key, "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(&record("Café  Blue-Bird", Some("45, Park St."), Some("+1 212 555 0100")));
        let again = normalize(&record(&once.name_key, Some(&once.address_key), Some(&once.phone_key)));
        assert_eq!(once, again);
    }
}
