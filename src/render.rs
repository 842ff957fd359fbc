//! Text layout of the sampling report.
//!
//! Everything in this module is formatting; the numbers come from the
//! pure functions in [`report`](crate::report). Rendering the same
//! tables twice yields the identical string.

use std::{collections::BTreeMap, fmt::Display};

use crate::{
    freq::{Bucket, FreqTable, KeyspaceTables},
    report::{breakdown, distribution, power_histogram, Breakdown},
};

/// Width of one frequency cell; three cells fit a report line.
const CELL_WIDTH: usize = 25;

/// Power-of-two bucket label, printed `<= p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PowerOfTwo(i64);

impl Display for PowerOfTwo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<= {}", self.0)
    }
}

/// Renders the complete report over one finished sampling run.
///
/// `sample_size` must be the number of keys the run drew; the
/// long-tail suppression threshold is relative to it.
pub fn render_report(tables: &KeyspaceTables, sample_size: usize) -> String {
    let mut out = String::new();

    render_each_freq_table(&mut out, "Types", &tables.types, sample_size);

    render_each_freq_table(&mut out, "Expires", &tables.expires, sample_size);
    render_distributions(&mut out, &tables.expires);
    render_power_tables(&mut out, &tables.expires, sample_size);
    out.push_str("\nNote: 'unknown' expire means keys with no expire\n");

    if !tables.string_size.is_empty() {
        render_metric(&mut out, "Strings, size of values", &tables.string_size, sample_size);
    }
    if !tables.list_len.is_empty() {
        render_metric(&mut out, "Lists, number of elements", &tables.list_len, sample_size);
        render_metric(&mut out, "Lists, size of elements", &tables.list_elem_size, sample_size);
    }
    if !tables.set_card.is_empty() {
        render_metric(&mut out, "Sets, number of elements", &tables.set_card, sample_size);
        render_metric(&mut out, "Sets, size of elements", &tables.set_elem_size, sample_size);
    }
    if !tables.zset_card.is_empty() {
        render_metric(
            &mut out,
            "Sorted sets, number of elements",
            &tables.zset_card,
            sample_size,
        );
        render_metric(
            &mut out,
            "Sorted sets, size of elements",
            &tables.zset_elem_size,
            sample_size,
        );
    }
    if !tables.hash_len.is_empty() {
        render_metric(&mut out, "Hashes, number of fields", &tables.hash_len, sample_size);
        render_metric(&mut out, "Hashes, size of fields", &tables.hash_field_size, sample_size);
        render_metric(&mut out, "Hashes, size of values", &tables.hash_value_size, sample_size);
    }

    out.push('\n');
    out
}

/// Breakdown plus distribution plus power-of-two histogram for one
/// numeric metric table.
fn render_metric(out: &mut String, title: &str, table: &FreqTable<Bucket>, sample_size: usize) {
    render_each_freq_table(out, title, table, sample_size);
    render_distributions(out, table);
    render_power_tables(out, table, sample_size);
}

fn render_each_freq_table<B: Ord + Clone + Display>(
    out: &mut String,
    title: &str,
    table: &FreqTable<B>,
    sample_size: usize,
) {
    out.push_str(&format!(
        "\n{}\n{}\n",
        title.to_uppercase(),
        "=".repeat(title.len())
    ));
    for (prefix, buckets) in table.iter() {
        out.push_str(&format!("\n# for {}\n", prefix));
        render_breakdown(out, &breakdown(buckets, sample_size));
    }
}

fn render_breakdown<B: Display>(out: &mut String, breakdown: &Breakdown<B>) {
    let mut column = 0;
    for row in &breakdown.rows {
        let mut cell = format!(" {}: {} ({})", row.bucket, row.count, row.share);
        while cell.len() < CELL_WIDTH {
            cell.push(' ');
        }
        out.push_str(&cell);
        column += 1;
        if column % 3 == 0 {
            out.push('\n');
        }
    }
    if column % 3 != 0 {
        out.push('\n');
    }
    if let Some((hidden, share)) = &breakdown.suppressed {
        out.push_str(&format!(
            "(suppressed {} items with perc < 0.5% for a total of {})\n",
            hidden, share
        ));
    }
}

fn render_distributions(out: &mut String, table: &FreqTable<Bucket>) {
    for (prefix, buckets) in table.iter() {
        let stats = distribution(buckets);
        out.push_str(&format!("\n# for {}\n", prefix));
        out.push_str(&format!(
            " Average: {:.2} Standard Deviation: {:.2}\n",
            stats.average, stats.std_deviation
        ));
        out.push_str(&format!(" Min: {} Max: {}\n", stats.min, stats.max));
    }
}

fn render_power_tables(out: &mut String, table: &FreqTable<Bucket>, sample_size: usize) {
    for (prefix, buckets) in table.iter() {
        out.push_str(&format!("\n# for {}\n", prefix));
        out.push_str("\nPowers of two distribution: (NOTE <= p means: p/2 < x <= p)\n");
        let labeled: BTreeMap<PowerOfTwo, u64> = power_histogram(buckets)
            .into_iter()
            .map(|(power, count)| (PowerOfTwo(power), count))
            .collect();
        render_breakdown(out, &breakdown(&labeled, sample_size));
    }
}
