//! Role partitioning
//!
//! Splits the relay list into guard-capable and exit-capable subsets, each
//! ranked by consensus weight fraction (highest first).

use std::cmp::Ordering;

use crate::NodeRecord;

/// Role subsets borrowed from the payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition<'a> {
    pub guard: Vec<&'a NodeRecord>,
    pub exit: Vec<&'a NodeRecord>,
}

/// Select guard and exit relays and rank each subset by weight
pub fn partition(relays: &[NodeRecord]) -> Partition<'_> {
    let mut guard: Vec<_> = relays.iter().filter(|r| r.is_guard()).collect();
    let mut exit: Vec<_> = relays.iter().filter(|r| r.is_exit()).collect();

    rank_by_weight(&mut guard);
    rank_by_weight(&mut exit);

    Partition { guard, exit }
}

/// Stable descending sort; equal weights keep their relative order
pub fn rank_by_weight(records: &mut [&NodeRecord]) {
    records.sort_by(|a, b| {
        b.weight()
            .partial_cmp(&a.weight())
            .unwrap_or(Ordering::Equal)
    });
}
