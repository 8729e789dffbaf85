use std::cmp::Ordering;

use serde::Deserialize;

use super::record::ChannelRecord;

/// The field a fetch is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Insertion sequence of the upstream query stream.
    EventSequence,
    /// Earth-receive time.
    Ert,
    /// Spacecraft clock.
    Sclk,
    ChannelId,
    Module,
}

/// How two rendered sort keys are compared. Fixed once per run; mixing
/// comparisons within one run would silently corrupt the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyComparison {
    Numeric,
    Lexical,
}

/// Merge variant selected from the ordering, once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Batches are individually ordered and mutually non-overlapping, so the
    /// merge degenerates to emitting whole batches in arrival order.
    Concatenate,
    /// Heap-based k-way merge over every batch's current head.
    KWay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderingSpec {
    #[serde(default = "default_order_key")]
    pub key: OrderKey,
    #[serde(default)]
    pub descending: bool,
    #[serde(default = "default_comparison")]
    pub comparison: KeyComparison,
}

fn default_order_key() -> OrderKey {
    OrderKey::EventSequence
}

fn default_comparison() -> KeyComparison {
    KeyComparison::Numeric
}

impl Default for OrderingSpec {
    fn default() -> Self {
        Self {
            key: default_order_key(),
            descending: false,
            comparison: default_comparison(),
        }
    }
}

impl OrderingSpec {
    /// Renders the record's sort key. Numeric keys render fixed-width so the
    /// lexical order of the rendered form matches the numeric order.
    pub fn sort_key(&self, record: &ChannelRecord) -> String {
        match self.key {
            OrderKey::EventSequence => format!("{:020}", record.event_seq),
            OrderKey::Ert => record.ert.render(),
            OrderKey::Sclk => record.sclk.render(),
            OrderKey::ChannelId => record.channel_id.clone(),
            OrderKey::Module => record.module.clone().unwrap_or_default(),
        }
    }

    /// Compares two rendered sort keys under the configured direction.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let ord = compare_keys(self.comparison, a, b);
        if self.descending { ord.reverse() } else { ord }
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        // Only an ascending insertion-sequence fetch yields batches that are
        // both individually ordered and mutually non-overlapping.
        if self.key == OrderKey::EventSequence && !self.descending {
            MergeStrategy::Concatenate
        } else {
            MergeStrategy::KWay
        }
    }

    /// Whether each batch needs an in-batch sort before hand-off. The query
    /// stream already delivers records in insertion order.
    pub fn requires_batch_sort(&self) -> bool {
        self.merge_strategy() == MergeStrategy::KWay
    }
}

/// Compares rendered keys. Numeric comparison falls back to lexical when a
/// key does not parse, so non-numeric keys under a numeric config degrade
/// deterministically instead of panicking.
pub fn compare_keys(comparison: KeyComparison, a: &str, b: &str) -> Ordering {
    match comparison {
        KeyComparison::Lexical => a.cmp(b),
        KeyComparison::Numeric => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
    }
}

/// Parses a numeric key of the form `coarse` or `coarse.fine`.
fn parse_numeric(key: &str) -> Option<(u128, u64)> {
    match key.split_once('.') {
        Some((coarse, fine)) => Some((coarse.parse().ok()?, fine.parse().ok()?)),
        None => Some((key.parse().ok()?, 0)),
    }
}
