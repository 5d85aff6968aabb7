//! Temporal distribution of the catalog
//!
//! Counts records per (year, key) pair, where the key is either a theme (a
//! record with k themes feeds k buckets) or the record's category (exactly
//! one bucket per record with a non-empty category). The representation is
//! sparse: cells only exist for combinations that were actually seen, and
//! [`Timeline::dense`] materializes zero cells on demand for a caller-fixed
//! key set, which is what legend-driven charts want.

use crate::{bump, catalog::Catalog, merge_counts, record::Year, Count};
use rayon::prelude::*;
use std::collections::HashMap;

/// One observed (year, key, count) cell
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TimelineCell {
    /// Grouping year, as declared by the record
    pub year: Year,

    /// Theme or category the cell counts
    pub key: Box<str>,

    /// Number of records in this bucket
    pub count: Count,
}

/// Per-year distribution of themes or categories
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Timeline {
    /// Observed cells by ascending year, ties broken by lexicographic key
    cells: Box<[TimelineCell]>,

    /// Point lookup for cell counts
    counts: HashMap<(Year, Box<str>), Count>,

    /// Distinct years with at least one record, ascending
    years: Box<[Year]>,

    /// Distinct keys, lexicographic, for legend/filter construction
    keys: Box<[Box<str>]>,
}
//
impl Timeline {
    /// Distribution of themes over years
    ///
    /// A record contributes one count per theme it carries; records without
    /// themes contribute nothing here (but see [`Timeline::by_category`]).
    pub fn by_theme(catalog: &Catalog) -> Self {
        Self::from_counts(
            catalog
                .records()
                .par_iter()
                .fold(HashMap::new, |mut counts, record| {
                    for theme in &record.themes {
                        bump(&mut counts, (record.year, theme.clone()));
                    }
                    counts
                })
                .reduce(HashMap::new, |mut dst, src| {
                    merge_counts(&mut dst, src);
                    dst
                }),
        )
    }

    /// Distribution of categories over years
    ///
    /// Single-valued, so each record contributes exactly one count, under
    /// its category. Records whose category is empty after trimming are
    /// excluded, mirroring the theme normalization policy.
    pub fn by_category(catalog: &Catalog) -> Self {
        Self::from_counts(
            catalog
                .records()
                .par_iter()
                .fold(HashMap::new, |mut counts, record| {
                    if !record.category.is_empty() {
                        bump(&mut counts, (record.year, record.category.clone()));
                    }
                    counts
                })
                .reduce(HashMap::new, |mut dst, src| {
                    merge_counts(&mut dst, src);
                    dst
                }),
        )
    }

    /// Freeze a merged tally into its deterministic presentation order
    fn from_counts(counts: HashMap<(Year, Box<str>), Count>) -> Self {
        let mut cells = counts
            .iter()
            .map(|(&(year, ref key), &count)| TimelineCell {
                year,
                key: key.clone(),
                count,
            })
            .collect::<Vec<_>>();
        cells.sort_unstable_by(|c1, c2| (c1.year, &c1.key).cmp(&(c2.year, &c2.key)));

        let mut years = cells.iter().map(|cell| cell.year).collect::<Vec<_>>();
        years.dedup();
        let mut keys = cells.iter().map(|cell| cell.key.clone()).collect::<Vec<_>>();
        keys.sort_unstable();
        keys.dedup();

        log::debug!(
            "Built timeline with {} cells over {} years and {} keys",
            cells.len(),
            years.len(),
            keys.len()
        );
        Self {
            cells: cells.into(),
            counts,
            years: years.into(),
            keys: keys.into(),
        }
    }

    /// Observed cells by ascending year, ties broken by lexicographic key
    ///
    /// Sparse: combinations with a zero count are not materialized.
    pub fn cells(&self) -> &[TimelineCell] {
        &self.cells
    }

    /// Distinct years with at least one counted record, ascending
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// Distinct keys in lexicographic order, for legends and filters
    pub fn keys(&self) -> &[Box<str>] {
        &self.keys
    }

    /// Count for one (year, key) bucket, zero if never observed
    pub fn count(&self, year: Year, key: &str) -> usize {
        self.counts
            .get(&(year, key.into()))
            .copied()
            .map_or(0, Count::get)
    }

    /// Materialize (year, key, count) tuples for a fixed set of keys
    ///
    /// Covers every year present in the data crossed with every requested
    /// key, including zero counts, in ascending year order with keys kept in
    /// the caller's order within a year.
    pub fn dense<'keys>(&self, keys: &[&'keys str]) -> Vec<(Year, &'keys str, usize)> {
        let mut cells = Vec::with_capacity(self.years.len() * keys.len());
        for &year in &*self.years {
            for &key in keys {
                cells.push((year, key, self.count(year, key)));
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cooccurrence::CooccurrenceGraph, record::RawRecord};

    fn catalog(records: &[(u64, &str, &[&str], &str)]) -> Catalog {
        Catalog::from_raw_records(
            records
                .iter()
                .map(|&(id, date, themes, category)| RawRecord {
                    id: Some(id),
                    publication_date: date.to_owned(),
                    themes: themes.iter().map(|&t| t.to_owned()).collect(),
                    category: category.to_owned(),
                    ..RawRecord::default()
                }),
        )
        .expect("test records should be valid")
    }

    #[test]
    fn worked_example_from_the_catalog_docs() {
        let catalog = catalog(&[
            (1, "1856-01-01", &["War", "Politics"], ""),
            (2, "1856-06-01", &["War"], ""),
            (3, "1857-01-01", &["Politics", "War"], ""),
        ]);
        let timeline = Timeline::by_theme(&catalog);
        assert_eq!(timeline.count(1856, "War"), 2);
        assert_eq!(timeline.count(1856, "Politics"), 1);
        assert_eq!(timeline.count(1857, "War"), 1);
        assert_eq!(timeline.count(1857, "Politics"), 1);
        assert_eq!(timeline.years(), [1856, 1857]);
        let keys = timeline.keys().iter().map(|k| &**k).collect::<Vec<_>>();
        assert_eq!(keys, ["Politics", "War"]);
    }

    #[test]
    fn cells_are_sorted_by_year_then_key() {
        let catalog = catalog(&[
            (1, "1857-01-01", &["War"], ""),
            (2, "1856-01-01", &["War", "Politics"], ""),
        ]);
        let timeline = Timeline::by_theme(&catalog);
        let cells = (timeline.cells().iter())
            .map(|c| (c.year, &*c.key, c.count.get()))
            .collect::<Vec<_>>();
        assert_eq!(
            cells,
            [(1856, "Politics", 1), (1856, "War", 1), (1857, "War", 1)]
        );
    }

    #[test]
    fn records_without_themes_only_show_up_in_the_category_view() {
        let catalog = catalog(&[(1, "1856-01-01", &[], "Costumes")]);
        let by_theme = Timeline::by_theme(&catalog);
        assert!(by_theme.cells().is_empty());
        let by_category = Timeline::by_category(&catalog);
        assert_eq!(by_category.count(1856, "Costumes"), 1);
        assert_eq!(by_category.cells().len(), 1);
    }

    #[test]
    fn empty_categories_are_excluded_like_empty_themes() {
        let catalog = catalog(&[
            (1, "1856-01-01", &["War"], ""),
            (2, "1856-01-02", &["War"], "Politics"),
        ]);
        let by_category = Timeline::by_category(&catalog);
        assert_eq!(by_category.cells().len(), 1);
        assert_eq!(by_category.count(1856, "Politics"), 1);
    }

    #[test]
    fn dense_view_materializes_zero_cells_for_requested_keys_only() {
        let catalog = catalog(&[
            (1, "1856-01-01", &["War", "Politics"], ""),
            (2, "1857-01-01", &["War"], ""),
        ]);
        let timeline = Timeline::by_theme(&catalog);
        // Sparse representation has no zero cells
        assert!(timeline.cells().iter().all(|c| c.count.get() > 0));
        // Dense representation covers every year for the fixed keys
        let dense = timeline.dense(&["Politics", "Empire"]);
        assert_eq!(
            dense,
            [
                (1856, "Politics", 1),
                (1856, "Empire", 0),
                (1857, "Politics", 0),
                (1857, "Empire", 0),
            ]
        );
    }

    #[test]
    fn theme_bucket_sums_match_graph_node_frequencies() {
        let catalog = catalog(&[
            (1, "1856-01-01", &["War", "Politics"], "Costumes"),
            (2, "1856-06-01", &["War"], "Costumes"),
            (3, "1857-01-01", &["Politics", "War", "Empire"], "Military"),
            (4, "1858-01-01", &[], "Military"),
        ]);
        let graph = CooccurrenceGraph::from_catalog(&catalog);
        let timeline = Timeline::by_theme(&catalog);
        for node in graph.nodes() {
            let bucket_sum: usize = (timeline.years().iter())
                .map(|&year| timeline.count(year, &node.theme))
                .sum();
            assert_eq!(
                bucket_sum,
                node.frequency.get(),
                "cross-view mismatch for theme {:?}",
                node.theme
            );
        }
    }

    #[test]
    fn rebuilding_from_the_same_catalog_is_idempotent() {
        let catalog = catalog(&[
            (1, "1856-01-01", &["War", "Politics"], "Costumes"),
            (2, "1857-01-01", &["Empire"], "Military"),
        ]);
        assert_eq!(Timeline::by_theme(&catalog), Timeline::by_theme(&catalog));
        assert_eq!(
            Timeline::by_category(&catalog),
            Timeline::by_category(&catalog)
        );
    }
}
