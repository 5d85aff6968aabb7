//! Analytical core for a hand-curated catalog of 19th-century satirical
//! cartoons ("charges").
//!
//! The catalog is a static JSON file, read once and held as an immutable
//! in-memory table ([`catalog::Catalog`]). Two analytical views are derived
//! from it for external rendering widgets:
//!
//! - a theme co-occurrence graph ([`cooccurrence::CooccurrenceGraph`]),
//!   where nodes are themes weighted by record frequency and undirected
//!   edges count joint appearance within single records;
//! - temporal distribution tables ([`timeline::Timeline`]), counting records
//!   per year and per theme or category.
//!
//! Both views are pure functions of the loaded catalog and produce the same
//! output ordering on every run over the same data. The [`maintenance`]
//! module carries the dataset curation utilities (image filename
//! normalization and orphan-image detection) that keep the catalog file and
//! its image folder consistent.

pub mod catalog;
pub mod cooccurrence;
pub mod maintenance;
pub mod record;
pub mod timeline;

use std::{
    collections::{hash_map, HashMap},
    hash::Hash,
    num::NonZeroUsize,
};

pub use catalog::{Catalog, CatalogError, MalformedReason};
pub use cooccurrence::CooccurrenceGraph;
pub use record::{CartoonRecord, RawRecord, RecordId, Theme, Year};
pub use timeline::Timeline;

/// Number of records supporting a theme, edge or timeline cell
///
/// Frequencies and weights are only ever materialized for things that were
/// seen at least once, so the nonzero invariant is free and makes absent
/// entries (`None`) unambiguous in lookups.
pub type Count = NonZeroUsize;

/// Addition operator for NonZeroUsize
pub(crate) fn add_nonzero_usize(x: NonZeroUsize, y: NonZeroUsize) -> NonZeroUsize {
    NonZeroUsize::new(x.get() + y.get()).expect("overflow while adding NonZeroUsizes")
}

/// One record's worth of count
pub(crate) const ONE: NonZeroUsize = NonZeroUsize::MIN;

/// Count one more record for a tally key
pub(crate) fn bump<K: Eq + Hash>(counts: &mut HashMap<K, Count>, key: K) {
    match counts.entry(key) {
        hash_map::Entry::Occupied(o) => {
            let count = o.into_mut();
            *count = add_nonzero_usize(*count, ONE);
        }
        hash_map::Entry::Vacant(v) => {
            v.insert(ONE);
        }
    }
}

/// Merge one parallel tally map into another
pub(crate) fn merge_counts<K: Eq + Hash>(dst: &mut HashMap<K, Count>, src: HashMap<K, Count>) {
    for (key, count) in src {
        match dst.entry(key) {
            hash_map::Entry::Occupied(o) => {
                let total = o.into_mut();
                *total = add_nonzero_usize(*total, count);
            }
            hash_map::Entry::Vacant(v) => {
                v.insert(count);
            }
        }
    }
}
