//! Frequency tables keyed by key-name prefix.
//!
//! Every metric the sampler tracks is stored in a [`FreqTable`]: a
//! two-level mapping from a key's namespace prefix to a bucket value
//! to the number of times that bucket was observed. The tables are
//! rebuilt from scratch on every run; nothing is persisted.

use std::{collections::BTreeMap, fmt::Display};

use crate::KeyType;

/// A classification bucket within a numeric frequency table.
///
/// Most metrics bucket by a raw numeric observation (a byte size, a
/// cardinality or a TTL in seconds). [`Unknown`] stands in where no
/// meaningful number exists, e.g. for keys without an expire or for
/// hashes with no fields.
///
/// [`Unknown`]: Self::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// A raw numeric observation.
    Value(i64),
    /// No measurable value for this metric.
    Unknown,
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(n) => write!(f, "{}", n),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Returns the namespace prefix of a key: the text before the first
/// `:`, or the whole key when it contains no separator.
pub fn key_prefix(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

/// A two-level frequency table: prefix -> bucket -> count.
///
/// Counts are only ever incremented, so every stored count is at
/// least one. Ordered maps keep iteration deterministic for the
/// reporting side.
#[derive(Debug)]
pub struct FreqTable<B> {
    prefixes: BTreeMap<String, BTreeMap<B, u64>>,
}

impl<B> Default for FreqTable<B> {
    fn default() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }
}

impl<B: Ord> FreqTable<B> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation of `bucket` under `prefix`.
    pub fn increment(&mut self, prefix: &str, bucket: B) {
        *self
            .prefixes
            .entry(prefix.to_owned())
            .or_default()
            .entry(bucket)
            .or_insert(0) += 1;
    }

    /// Iterates over the per-prefix bucket maps in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<B, u64>)> + '_ {
        self.prefixes.iter().map(|(prefix, buckets)| (prefix.as_str(), buckets))
    }

    /// Looks up the bucket map recorded under `prefix`.
    pub fn get(&self, prefix: &str) -> Option<&BTreeMap<B, u64>> {
        self.prefixes.get(prefix)
    }

    /// Whether no observation has been recorded at all.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// The full set of frequency tables populated by one sampling run.
///
/// One table per metric. `types` classifies keys by their value type;
/// all other tables bucket by a numeric observation (or
/// [`Bucket::Unknown`]). Created empty, filled by the sampler, then
/// read by the reporting side without further mutation.
#[derive(Debug, Default)]
pub struct KeyspaceTables {
    /// Value type of each sampled key.
    pub types: FreqTable<KeyType>,
    /// Remaining TTL in seconds; `unknown` for keys without an expire.
    pub expires: FreqTable<Bucket>,
    /// Sorted set cardinalities.
    pub zset_card: FreqTable<Bucket>,
    /// Byte sizes of one sampled sorted set element per key.
    pub zset_elem_size: FreqTable<Bucket>,
    /// List lengths.
    pub list_len: FreqTable<Bucket>,
    /// Byte sizes of one sampled list element per key.
    pub list_elem_size: FreqTable<Bucket>,
    /// Hash field counts.
    pub hash_len: FreqTable<Bucket>,
    /// Byte sizes of one sampled hash field name per key.
    pub hash_field_size: FreqTable<Bucket>,
    /// Byte sizes of one sampled hash value per key.
    pub hash_value_size: FreqTable<Bucket>,
    /// Set cardinalities.
    pub set_card: FreqTable<Bucket>,
    /// Byte sizes of one sampled set member per key.
    pub set_elem_size: FreqTable<Bucket>,
    /// Byte sizes of string values.
    pub string_size: FreqTable<Bucket>,
}
