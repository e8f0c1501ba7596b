use std::collections::{BTreeMap, HashMap, HashSet};

use placescout_common::{CanonicalRecord, FieldValue, RawRecord, Source};
use tracing::{debug, info};

use crate::cluster;
use crate::error::MergeError;
use crate::normalize::{self, NormalizedKey};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.75;

/// Locality pre-filter limiting pairwise comparisons. Records in different
/// buckets are never compared, so the bucket key must be coarse enough that
/// true duplicates land together.
#[derive(Debug, Clone, Copy)]
pub enum Bucketing {
    /// Full pairwise comparison. Fine for small inputs.
    None,
    /// Bucket by the first `len` characters of the name key.
    NameKeyPrefix { len: usize },
    /// Caller-supplied key, e.g. a city slug carried in the record's fields.
    Custom(fn(&RawRecord, &NormalizedKey) -> String),
}

impl Default for Bucketing {
    fn default() -> Self {
        Bucketing::NameKeyPrefix { len: 3 }
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Pairwise score at or above this merges two records (inclusive).
    pub match_threshold: f64,
    /// Trust ordering for field reconciliation, highest first. Sources not
    /// listed rank below every listed one.
    pub source_priority: Vec<Source>,
    pub bucketing: Bucketing,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            source_priority: Source::DEFAULT_PRIORITY.to_vec(),
            bucketing: Bucketing::default(),
        }
    }
}

/// Clusters raw records across sources and reduces each cluster to one
/// canonical record.
///
/// Synchronous, in-memory, no I/O. Clustering needs the whole batch before it
/// can emit anything, so the caller gathers every source first and hands the
/// batch over in one call.
pub struct MergeEngine {
    config: MergeConfig,
    ranks: HashMap<Source, usize>,
}

impl MergeEngine {
    /// Validates configuration up front, the only fatal path in this crate.
    pub fn new(config: MergeConfig) -> Result<Self, MergeError> {
        if !(0.0..=1.0).contains(&config.match_threshold) {
            return Err(MergeError::InvalidThreshold(config.match_threshold));
        }
        if config.source_priority.is_empty() {
            return Err(MergeError::EmptyPriority);
        }

        let mut ranks = HashMap::new();
        for (position, source) in config.source_priority.iter().enumerate() {
            ranks.entry(*source).or_insert(position);
        }

        Ok(Self { config, ranks })
    }

    fn rank(&self, source: Source) -> usize {
        self.ranks
            .get(&source)
            .copied()
            .unwrap_or(self.config.source_priority.len())
    }

    /// Merge a batch of raw records into canonical records, one per cluster.
    ///
    /// Infallible: malformed records (empty name) degrade to singleton
    /// clusters, and an empty batch produces an empty output. Output order is
    /// the first-appearance order of each cluster's earliest member.
    pub fn merge(&self, records: Vec<RawRecord>) -> Vec<CanonicalRecord> {
        if records.is_empty() {
            return Vec::new();
        }

        let keys: Vec<NormalizedKey> = records.iter().map(normalize::normalize).collect();
        let clusters = cluster::cluster(
            &records,
            &keys,
            self.config.match_threshold,
            &self.config.bucketing,
        );

        let merged = clusters.len() != records.len();
        let canonical: Vec<CanonicalRecord> = clusters
            .iter()
            .map(|members| self.reduce_cluster(&records, &keys, members))
            .collect();

        info!(
            input = records.len(),
            clusters = canonical.len(),
            deduplicated = merged,
            "Merged records into canonical set"
        );
        canonical
    }

    fn reduce_cluster(
        &self,
        records: &[RawRecord],
        keys: &[NormalizedKey],
        members: &[usize],
    ) -> CanonicalRecord {
        // Representative name: longest name key wins, source priority breaks
        // ties, first seen breaks the rest.
        let mut best = members[0];
        for &candidate in &members[1..] {
            let len = keys[candidate].name_key.chars().count();
            let best_len = keys[best].name_key.chars().count();
            if len > best_len
                || (len == best_len
                    && self.rank(records[candidate].source) < self.rank(records[best].source))
            {
                best = candidate;
            }
        }
        let name = records[best].name.clone();

        // Gather every candidate value per field, member order preserved.
        // Address and phone join the open field map so they reconcile under
        // the same policy as everything else.
        let mut candidates: BTreeMap<String, Vec<(Source, FieldValue)>> = BTreeMap::new();
        for &index in members {
            let record = &records[index];
            if let Some(address) = &record.address {
                candidates
                    .entry("address".to_string())
                    .or_default()
                    .push((record.source, FieldValue::Text(address.clone())));
            }
            if let Some(phone) = &record.phone {
                candidates
                    .entry("phone".to_string())
                    .or_default()
                    .push((record.source, FieldValue::Text(phone.clone())));
            }
            for (field, value) in &record.fields {
                candidates
                    .entry(field.clone())
                    .or_default()
                    .push((record.source, value.clone()));
            }
        }

        let mut fields = BTreeMap::new();
        for (field, values) in candidates {
            if let Some(value) = crate::reconcile::reconcile(&values, |s| self.rank(s)) {
                fields.insert(field, value);
            }
        }

        let source_count = members
            .iter()
            .map(|&index| records[index].source)
            .collect::<HashSet<_>>()
            .len();

        debug!(name = %name, members = members.len(), source_count, "Reduced cluster");

        CanonicalRecord {
            name,
            fields,
            source_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let config = MergeConfig {
            match_threshold: 1.3,
            ..MergeConfig::default()
        };
        assert_eq!(
            MergeEngine::new(config).err(),
            Some(MergeError::InvalidThreshold(1.3))
        );

        let config = MergeConfig {
            match_threshold: f64::NAN,
            ..MergeConfig::default()
        };
        assert!(MergeEngine::new(config).is_err());
    }

    #[test]
    fn rejects_empty_priority_list() {
        let config = MergeConfig {
            source_priority: vec![],
            ..MergeConfig::default()
        };
        assert_eq!(MergeEngine::new(config).err(), Some(MergeError::EmptyPriority));
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let engine = MergeEngine::new(MergeConfig::default()).unwrap();
        assert!(engine.merge(Vec::new()).is_empty());
    }

    #[test]
    fn unlisted_sources_rank_below_listed() {
        let config = MergeConfig {
            source_priority: vec![Source::ReviewSite],
            ..MergeConfig::default()
        };
        let engine = MergeEngine::new(config).unwrap();
        assert_eq!(engine.rank(Source::ReviewSite), 0);
        assert_eq!(engine.rank(Source::MapsListing), 1);
        assert_eq!(engine.rank(Source::LlmPricing), 1);
    }
}
