use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use placescout_common::RawRecord;

use crate::engine::Bucketing;
use crate::normalize::NormalizedKey;
use crate::similarity;

/// Partition record indices into match clusters.
///
/// Records sharing a locality bucket are scored pairwise; scores at or above
/// the threshold create an edge, and clusters are the connected components of
/// that graph. A matches B and B matches C lands all three in one cluster even
/// when A and C score below threshold directly: recall over precision, kept
/// deliberately.
///
/// Records with an empty name key are never bucketed or scored; each becomes
/// its own singleton cluster.
///
/// Returned clusters hold member indices in ascending input order and are
/// themselves ordered by their earliest-seen member.
pub(crate) fn cluster(
    records: &[RawRecord],
    keys: &[NormalizedKey],
    threshold: f64,
    bucketing: &Bucketing,
) -> Vec<Vec<usize>> {
    let n = records.len();
    let mut union_find = UnionFind::<usize>::new(n);

    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for i in 0..n {
        if keys[i].name_key.is_empty() {
            continue;
        }
        buckets
            .entry(bucket_key(bucketing, &records[i], &keys[i]))
            .or_default()
            .push(i);
    }

    for members in buckets.values() {
        for (pos, &i) in members.iter().enumerate() {
            for &j in &members[pos + 1..] {
                if similarity::score(&keys[i], &keys[j]) >= threshold {
                    union_find.union(i, j);
                }
            }
        }
    }

    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut root_order: Vec<usize> = Vec::new();
    for i in 0..n {
        let root = union_find.find(i);
        let members = by_root.entry(root).or_default();
        if members.is_empty() {
            root_order.push(root);
        }
        members.push(i);
    }

    root_order
        .into_iter()
        .map(|root| by_root.remove(&root).expect("root recorded with members"))
        .collect()
}

fn bucket_key(bucketing: &Bucketing, record: &RawRecord, key: &NormalizedKey) -> String {
    match bucketing {
        Bucketing::None => String::new(),
        Bucketing::NameKeyPrefix { len } => key.name_key.chars().take(*len).collect(),
        Bucketing::Custom(f) => f(record, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use placescout_common::Source;

    fn records(names: &[&str]) -> Vec<RawRecord> {
        names
            .iter()
            .map(|n| RawRecord::new(Source::MapsListing, *n))
            .collect()
    }

    fn keys(records: &[RawRecord]) -> Vec<NormalizedKey> {
        records.iter().map(normalize::normalize).collect()
    }

    #[test]
    fn transitive_matches_form_one_cluster() {
        // A~B and B~C chain into {A, B, C} by connected components.
        let recs = records(&[
            "Tattva Spa",
            "Tattva Wellness Spa",
            "Tattva Wellness Spa & Salon",
        ]);
        let ks = keys(&recs);
        let clusters = cluster(&recs, &ks, 0.75, &Bucketing::None);
        assert_eq!(clusters, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn empty_names_stay_singleton() {
        let recs = records(&["Tattva Spa", "", "Tattva Spa"]);
        let ks = keys(&recs);
        let clusters = cluster(&recs, &ks, 0.75, &Bucketing::None);
        assert_eq!(clusters, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn records_in_different_buckets_are_never_compared() {
        // "The " pushes the pair into different prefix buckets; full pairwise
        // comparison would merge them.
        let recs = records(&["The Tattva Spa", "Tattva Spa"]);
        let ks = keys(&recs);

        let unbucketed = cluster(&recs, &ks, 0.75, &Bucketing::None);
        assert_eq!(unbucketed, vec![vec![0, 1]]);

        let bucketed = cluster(&recs, &ks, 0.75, &Bucketing::NameKeyPrefix { len: 3 });
        assert_eq!(bucketed.len(), 2);
    }

    #[test]
    fn cluster_order_follows_first_appearance() {
        let recs = records(&["Zen Den", "Aura Spa", "Zen Den Wellness"]);
        let ks = keys(&recs);
        let clusters = cluster(&recs, &ks, 0.6, &Bucketing::None);
        assert_eq!(clusters, vec![vec![0, 2], vec![1]]);
    }
}
