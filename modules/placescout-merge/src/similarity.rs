use std::collections::BTreeSet;

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::normalize::NormalizedKey;

const NAME_WEIGHT: f64 = 0.5;
const ADDRESS_WEIGHT: f64 = 0.3;
const PHONE_WEIGHT: f64 = 0.2;

/// Pairwise match score between two normalized records, in [0, 1]. Symmetric.
///
/// Weighted blend of name, address, and phone sub-scores. A signal absent on
/// either side has its weight redistributed proportionally across the present
/// sub-scores: an unknown phone is not a mismatched phone.
///
/// Name is the non-negotiable anchor: an empty name key on either side scores
/// 0 regardless of the other signals.
pub fn score(a: &NormalizedKey, b: &NormalizedKey) -> f64 {
    if a.name_key.is_empty() || b.name_key.is_empty() {
        return 0.0;
    }

    let mut weighted = NAME_WEIGHT * name_similarity(&a.name_key, &b.name_key);
    let mut total_weight = NAME_WEIGHT;

    if !a.address_key.is_empty() && !b.address_key.is_empty() {
        weighted += ADDRESS_WEIGHT * address_similarity(&a.address_key, &b.address_key);
        total_weight += ADDRESS_WEIGHT;
    }

    if !a.phone_key.is_empty() && !b.phone_key.is_empty() {
        let phone = if a.phone_key == b.phone_key { 1.0 } else { 0.0 };
        weighted += PHONE_WEIGHT * phone;
        total_weight += PHONE_WEIGHT;
    }

    (weighted / total_weight).clamp(0.0, 1.0)
}

/// Token-set containment averaged with an edit ratio over sorted tokens.
///
/// Containment (intersection over the smaller set) rather than Jaccard, so a
/// name that is a subset of the other ("Tattva Spa" vs "Tattva Wellness Spa")
/// reads as the same business with suffix words added, not as a weaker match.
/// Sorting before the edit ratio makes "Wellness Spa Tattva" and
/// "Tattva Wellness Spa" compare as reorderings, not rewrites.
fn name_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection = tokens_a.intersection(&tokens_b).count();
    let smaller = tokens_a.len().min(tokens_b.len());
    let containment = if smaller == 0 {
        0.0
    } else {
        intersection as f64 / smaller as f64
    };

    let sorted_a = tokens_a.into_iter().collect::<Vec<_>>().join(" ");
    let sorted_b = tokens_b.into_iter().collect::<Vec<_>>().join(" ");
    let edit = normalized_levenshtein(&sorted_a, &sorted_b);

    (containment + edit) / 2.0
}

/// Street number is a hard anchor: when both sides have one and they differ,
/// the addresses cannot be the same place no matter how similar the street
/// names read. Otherwise the remainder is compared fuzzily.
fn address_similarity(a: &str, b: &str) -> f64 {
    let (number_a, rest_a) = split_street_number(a);
    let (number_b, rest_b) = split_street_number(b);

    match (number_a, number_b) {
        (Some(x), Some(y)) if x != y => 0.0,
        (Some(_), Some(_)) => jaro_winkler(rest_a, rest_b),
        _ => jaro_winkler(a, b),
    }
}

/// Split a leading all-digit token off an address key.
fn split_street_number(key: &str) -> (Option<&str>, &str) {
    match key.split_once(' ') {
        Some((first, rest)) if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) => {
            (Some(first), rest)
        }
        None if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) => (Some(key), ""),
        _ => (None, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, address: &str, phone: &str) -> NormalizedKey {
        NormalizedKey {
            name_key: name.to_string(),
            address_key: address.to_string(),
            phone_key: phone.to_string(),
        }
    }

    #[test]
    fn identical_keys_score_one() {
        let a = key("tattva spa", "12 mg road", "9876543210");
        assert!((score(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_symmetric() {
        let a = key("tattva spa", "12 mg road", "9876543210");
        let b = key("tattva wellness spa", "12 m g road", "");
        assert_eq!(score(&a, &b), score(&b, &a));
    }

    #[test]
    fn empty_name_scores_zero() {
        let a = key("", "12 mg road", "9876543210");
        let b = key("tattva spa", "12 mg road", "9876543210");
        assert_eq!(score(&a, &b), 0.0);
        assert_eq!(score(&b, &a), 0.0);
    }

    #[test]
    fn street_number_mismatch_zeroes_address() {
        let a = key("tattva spa", "12 mg road", "");
        let b = key("tattva spa", "14 mg road", "");
        // name 1.0 * 0.5, address 0.0 * 0.3, phone absent
        let expected = 0.5 / 0.8;
        assert!((score(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn absent_phone_redistributes_weight() {
        let a = key("tattva spa", "12 mg road", "");
        let b = key("tattva spa", "12 mg road", "9876543210");
        // Identical name and address, phone unknown on one side: still 1.0.
        assert!((score(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_phone_counts_against() {
        let a = key("tattva spa", "", "9876543210");
        let b = key("tattva spa", "", "1234567890");
        let expected = 0.5 / 0.7;
        assert!((score(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn reordered_name_tokens_score_high() {
        let a = key("wellness spa tattva", "", "");
        let b = key("tattva wellness spa", "", "");
        assert!((score(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_names_score_low() {
        let a = key("tattva wellness spa", "", "");
        let b = key("blue lotus salon", "", "");
        assert!(score(&a, &b) < 0.5);
    }
}
