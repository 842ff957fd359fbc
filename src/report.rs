//! Pure aggregation over completed frequency tables.
//!
//! Every function here is a read-only derivation from one prefix's
//! bucket map; nothing is cached or stored. Text layout lives in
//! [`render`](crate::render).

use std::collections::BTreeMap;

use crate::freq::Bucket;

/// Share of the original sample below which long-tail entries are
/// suppressed.
const SUPPRESSION_SHARE: f64 = 0.005;

/// Number of rows that are always emitted before suppression may kick
/// in.
const SUPPRESSION_MIN_ROWS: usize = 21;

/// One emitted row of a [`Breakdown`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row<B> {
    /// The bucket this row counts.
    pub bucket: B,
    /// Number of observations in the bucket.
    pub count: u64,
    /// Share of the table total, formatted by [`percentage`].
    pub share: String,
}

/// Sorted frequency view of one bucket map with the long tail
/// collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown<B> {
    /// Emitted rows, most frequent first.
    pub rows: Vec<Row<B>>,
    /// Number of distinct buckets hidden by suppression and the share
    /// of the table total they jointly represent. `None` when every
    /// bucket was emitted.
    pub suppressed: Option<(usize, String)>,
}

/// Summary statistics over the numeric buckets of one prefix's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// Weighted mean of the bucket values.
    pub average: f64,
    /// Population standard deviation of the bucket values.
    pub std_deviation: f64,
    /// Smallest bucket value observed, 0 when none exist.
    pub min: i64,
    /// Largest bucket value observed, 0 when none exist.
    pub max: i64,
}

/// Entries of `table` ordered by count descending.
///
/// Ties fall back to bucket order so the result is deterministic for
/// the same table contents.
pub fn sorted_descending<B: Ord>(table: &BTreeMap<B, u64>) -> Vec<(&B, u64)> {
    let mut entries: Vec<_> = table.iter().map(|(bucket, &count)| (bucket, count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Formats `value` as a share of `total` with two decimal places.
pub fn percentage(value: u64, total: u64) -> String {
    format!("{:.2}%", value as f64 * 100.0 / total as f64)
}

/// Collapses `table` into its dominant entries.
///
/// The sorted entries are walked top-down. The first 21 rows are
/// always emitted; after that the walk stops once a row's count drops
/// below 0.5% of the original `sample_size` (the stopping row itself
/// is still emitted). Everything left over is reported as a single suppressed
/// remainder, which bounds the report size when a table has many
/// distinct buckets while always showing the dominant ones.
pub fn breakdown<B: Ord + Clone>(table: &BTreeMap<B, u64>, sample_size: usize) -> Breakdown<B> {
    let entries = sorted_descending(table);
    let total: u64 = entries.iter().map(|(_, count)| count).sum();

    let mut rows = Vec::new();
    let mut emitted = 0u64;
    for &(bucket, count) in &entries {
        emitted += count;
        rows.push(Row {
            bucket: bucket.clone(),
            count,
            share: percentage(count, total),
        });
        if rows.len() >= SUPPRESSION_MIN_ROWS
            && (count as f64) < SUPPRESSION_SHARE * sample_size as f64
        {
            break;
        }
    }

    let suppressed = if rows.len() != entries.len() {
        Some((entries.len() - rows.len(), percentage(total - emitted, total)))
    } else {
        None
    };

    Breakdown { rows, suppressed }
}

/// Smallest power of two that is equal to or greater than `n`; 1 for
/// values at or below zero.
pub fn power_of_two_bucket(n: i64) -> i64 {
    let mut p = 1;
    while n > p {
        p *= 2;
    }
    p
}

/// Re-buckets a numeric table into power-of-two ranges, where the
/// bucket `p` counts observations with `p/2 < value <= p`.
///
/// [`Bucket::Unknown`] observations carry no number and are left out
/// rather than redistributed.
pub fn power_histogram(table: &BTreeMap<Bucket, u64>) -> BTreeMap<i64, u64> {
    let mut histogram = BTreeMap::new();
    for (bucket, &count) in table {
        if let Bucket::Value(value) = bucket {
            *histogram.entry(power_of_two_bucket(*value)).or_insert(0) += count;
        }
    }
    histogram
}

/// Weighted summary statistics of a numeric table, skipping
/// [`Bucket::Unknown`].
///
/// The standard deviation is the population form, computed in two
/// passes: the weighted mean first, then the square root of the mean
/// squared deviation. Returns the all-zero record when the table has
/// no numeric entries at all.
pub fn distribution(table: &BTreeMap<Bucket, u64>) -> Distribution {
    let mut items = 0u64;
    let mut sum = 0.0;
    let mut min = None;
    let mut max = None;
    for (bucket, &count) in table {
        if let Bucket::Value(value) = *bucket {
            items += count;
            sum += value as f64 * count as f64;
            min = Some(min.map_or(value, |m: i64| m.min(value)));
            max = Some(max.map_or(value, |m: i64| m.max(value)));
        }
    }
    if items == 0 {
        return Distribution {
            average: 0.0,
            std_deviation: 0.0,
            min: 0,
            max: 0,
        };
    }
    let average = sum / items as f64;

    let mut squared = 0.0;
    for (bucket, &count) in table {
        if let Bucket::Value(value) = *bucket {
            squared += (value as f64 - average).powi(2) * count as f64;
        }
    }
    let std_deviation = (squared / items as f64).sqrt();

    Distribution {
        average,
        std_deviation,
        min: min.unwrap_or(0),
        max: max.unwrap_or(0),
    }
}
