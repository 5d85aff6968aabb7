//! Theme co-occurrence graph
//!
//! Undirected weighted graph over the catalog's themes: each theme is a node
//! weighted by the number of records carrying it, and each unordered pair of
//! themes is an edge weighted by the number of records carrying both. A
//! record with a single theme feeds that theme's node frequency but no edge;
//! a record with k themes feeds k nodes and k*(k-1)/2 edges.
//!
//! Tallying runs in parallel over the immutable record table, then a final
//! sort fixes the presentation order, so repeated builds over the same
//! catalog produce identical output.

use crate::{bump, catalog::Catalog, merge_counts, record::Theme, Count};
use rayon::prelude::*;
use std::{cmp::Reverse, collections::HashMap};

/// Theme node of the co-occurrence graph
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ThemeNode {
    /// Theme string, normalized by the loader
    pub theme: Theme,

    /// Number of records carrying this theme, paired or not
    pub frequency: Count,
}

/// Undirected edge between two distinct themes
///
/// Each unordered pair is stored exactly once, with `low` the
/// lexicographically smaller endpoint.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ThemeEdge {
    /// Lexicographically smaller endpoint
    pub low: Theme,

    /// Lexicographically larger endpoint
    pub high: Theme,

    /// Number of records carrying both endpoints
    pub weight: Count,
}

/// Theme co-occurrence graph derived from a loaded catalog
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CooccurrenceGraph {
    /// Nodes by decreasing frequency, ties broken by theme
    nodes: Box<[ThemeNode]>,

    /// Edges by decreasing weight, ties broken by (low, high) pair
    edges: Box<[ThemeEdge]>,

    /// Node frequency lookup
    frequencies: HashMap<Theme, Count>,

    /// Edge weight lookup, keyed by the (low, high) pair
    weights: HashMap<(Theme, Theme), Count>,
}
//
impl CooccurrenceGraph {
    /// Build the graph from a loaded catalog
    ///
    /// Pure function of the catalog: the parallel tally is merged into a
    /// single map and deterministically sorted, so two builds over the same
    /// catalog compare equal.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        // Tally node frequencies and pair weights across all records
        let (frequencies, weights) = catalog
            .records()
            .par_iter()
            .fold(Tally::default, |mut tally, record| {
                for (offset, theme) in record.themes.iter().enumerate() {
                    bump(&mut tally.0, theme.clone());
                    // Themes are deduplicated per record, so every pair here
                    // is distinct and self-pairs cannot occur
                    for other in &record.themes[offset + 1..] {
                        let pair = if theme < other {
                            (theme.clone(), other.clone())
                        } else {
                            (other.clone(), theme.clone())
                        };
                        bump(&mut tally.1, pair);
                    }
                }
                tally
            })
            .reduce(Tally::default, merge_tallies);

        // Fix the presentation order
        let mut nodes = frequencies
            .iter()
            .map(|(theme, &frequency)| ThemeNode {
                theme: theme.clone(),
                frequency,
            })
            .collect::<Vec<_>>();
        nodes.sort_unstable_by(|n1, n2| {
            (Reverse(n1.frequency), &n1.theme).cmp(&(Reverse(n2.frequency), &n2.theme))
        });
        let mut edges = weights
            .iter()
            .map(|((low, high), &weight)| ThemeEdge {
                low: low.clone(),
                high: high.clone(),
                weight,
            })
            .collect::<Vec<_>>();
        edges.sort_unstable_by(|e1, e2| {
            (Reverse(e1.weight), &e1.low, &e1.high).cmp(&(Reverse(e2.weight), &e2.low, &e2.high))
        });

        log::debug!(
            "Built co-occurrence graph with {} nodes and {} edges",
            nodes.len(),
            edges.len()
        );
        Self {
            nodes: nodes.into(),
            edges: edges.into(),
            frequencies,
            weights,
        }
    }

    /// Nodes by decreasing frequency, ties broken by lexicographic theme
    pub fn nodes(&self) -> &[ThemeNode] {
        &self.nodes
    }

    /// Edges by decreasing weight, ties broken by lexicographic (low, high)
    pub fn edges(&self) -> &[ThemeEdge] {
        &self.edges
    }

    /// Number of records carrying a theme, or None for unknown themes
    pub fn frequency(&self, theme: &str) -> Option<Count> {
        self.frequencies.get(theme).copied()
    }

    /// Number of records carrying both themes
    ///
    /// Symmetric in its arguments. None for self-pairs, unknown themes, and
    /// theme pairs that never co-occur.
    pub fn weight(&self, theme1: &str, theme2: &str) -> Option<Count> {
        if theme1 == theme2 {
            return None;
        }
        let pair = if theme1 < theme2 {
            (theme1.into(), theme2.into())
        } else {
            (theme2.into(), theme1.into())
        };
        self.weights.get(&pair).copied()
    }
}

/// Node frequencies and pair weights accumulated over a subset of records
type Tally = (HashMap<Theme, Count>, HashMap<(Theme, Theme), Count>);

/// Merge two parallel tallies, draining the smaller into the larger
fn merge_tallies(tally1: Tally, tally2: Tally) -> Tally {
    let (mut dst, src) = if tally1.0.len() + tally1.1.len() >= tally2.0.len() + tally2.1.len() {
        (tally1, tally2)
    } else {
        (tally2, tally1)
    };
    merge_counts(&mut dst.0, src.0);
    merge_counts(&mut dst.1, src.1);
    dst
}
