//! Segment-tree-structured proximity graph for range-filtered approximate
//! nearest neighbor search.
//!
//! Points are assigned monotone internal ids ahead of time (by the attribute
//! a query will range-filter on); a static segment tree over `[0, N-1]`
//! drives both construction (bottom-up, layer by layer) and search (top-down,
//! best-first), so a query for "nearest neighbors with id in `[ql, qr]`"
//! only ever touches edges that stay inside that interval.

pub mod build;
pub mod candidate;
pub mod error;
pub mod graph;
pub mod io;
pub mod multi;
pub mod point;
pub mod search;
pub mod segment_tree;

pub use build::{Builder, Config, Index};
pub use candidate::Candidate;
pub use error::{Error, Result};
pub use graph::{Euclidean, FlatGraph, Metric, OwnedGraph};
pub use multi::{AttrConstraint, MultiAttrIndex, MultiAttrSearcher};
pub use point::{FloatArray, Point, SlicePoint};
pub use search::Searcher;
pub use segment_tree::SegmentTree;

#[cfg(test)]
mod tests {
    use super::*;

    /// End-to-end smoke test: build an index over a small grid and confirm a
    /// range-filtered search finds the true nearest neighbor (spec.md §8
    /// scenario S1).
    #[test]
    fn build_then_search_finds_exact_nearest_in_range() {
        let points: Vec<FloatArray<2>> = (0..50).map(|i| FloatArray([i as f32, 0.0])).collect();
        let config = Config {
            m: 8,
            ef_construction: 32,
            ef_search: 16,
            seed: 42,
            threads: 1,
            ..Config::default()
        };
        let index = Builder::new(config).unwrap().build(&points).unwrap();

        let mut searcher = Searcher::new(points.len(), 42);
        let query = [25.0f32, 0.0];
        let results = searcher.search_range::<Euclidean>(&index.tree, &index.graph, &query, 20, 30, 16, 1, 16);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 25);
    }
}
