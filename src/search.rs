//! Single-attribute range-filtered search (spec.md §4.6–§4.7).
//!
//! Ported from `original_source/include/iRG_search.h`: `SelectEdge`,
//! `TopDown_nodeentries_search`, `search`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::candidate::{Candidate, Visited};
use crate::graph::{FlatGraph, Metric};
use crate::segment_tree::{NodeId, SegmentTree};

/// Per-query scratch state, reused across calls the way the teacher's
/// `SearchPool` reuses `Search` structs (`lib.rs::SearchPool`) instead of
/// reallocating heaps on every query.
pub struct Searcher {
    visited: Visited,
    candidates: BinaryHeap<Candidate>,
    pool: BinaryHeap<Reverse<Candidate>>,
    rng: SmallRng,
    dco: u64,
    hops: u64,
}

impl Searcher {
    pub fn new(capacity: usize, seed: u64) -> Self {
        Searcher {
            visited: Visited::with_capacity(capacity),
            candidates: BinaryHeap::new(),
            pool: BinaryHeap::new(),
            rng: SmallRng::seed_from_u64(seed),
            dco: 0,
            hops: 0,
        }
    }

    fn reset(&mut self, capacity: usize) {
        self.visited.reserve_capacity(capacity);
        self.visited.clear();
        self.candidates.clear();
        self.pool.clear();
        self.dco = 0;
        self.hops = 0;
    }

    /// Distance computations performed by the most recent `search_range` call
    /// (spec.md §6's reported `dco` metric).
    pub fn dco(&self) -> u64 {
        self.dco
    }

    /// Candidates popped off the frontier by the most recent `search_range`
    /// call (spec.md §6's reported `hop` metric).
    pub fn hops(&self) -> u64 {
        self.hops
    }

    /// `SelectEdge` (spec.md §4.6): the set of neighbor edges visible to a
    /// point `pid` under the query range `[ql,qr]`, found by walking from the
    /// deepest fully-covered tree node up to the root, taking the first
    /// `edge_limit` neighbors seen at each level and de-duplicating against
    /// what was already taken at a finer level. Neighbors outside `[ql,qr]`
    /// are dropped before they can consume the `edge_limit` budget.
    pub fn select_edge(tree: &SegmentTree, graph: &FlatGraph, pid: u32, ql: u32, qr: u32, edge_limit: usize) -> Vec<u32> {
        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let mut cur = Some(tree.select_edge_start(pid, ql, qr));
        while let Some(id) = cur {
            let node = tree.node(id);
            for &n in graph.neighbors(pid, node.depth) {
                if out.len() >= edge_limit {
                    break;
                }
                if n < ql || n > qr {
                    continue;
                }
                if seen.insert(n) {
                    out.push(n);
                }
            }
            if out.len() >= edge_limit {
                break;
            }
            cur = tree.ascend(pid, id);
        }

        out
    }

    /// Top-down best-first search over the range-filtered graph (spec.md
    /// §4.7). Returns up to `k` internal ids inside `[ql,qr]`, nearest first.
    pub fn search_range<M: Metric>(
        &mut self,
        tree: &SegmentTree,
        graph: &FlatGraph,
        query: &[f32],
        ql: u32,
        qr: u32,
        ef: usize,
        k: usize,
        edge_limit: usize,
    ) -> Vec<Candidate> {
        self.reset(graph.len() as usize);

        let entry_nodes = tree.range_filter(ql, qr);
        let mut entry_points = Vec::with_capacity(entry_nodes.len());
        for node_id in entry_nodes {
            let node = tree.node(node_id);
            entry_points.push(self.rng.gen_range(node.lbound..=node.rbound));
        }
        if entry_points.is_empty() {
            return Vec::new();
        }

        for &pid in &entry_points {
            if !self.visited.insert(pid) {
                continue;
            }
            let dist = graph.distance_to::<M>(pid, query);
            self.dco += 1;
            let c = Candidate::new(dist, pid);
            self.pool.push(Reverse(c));
            if pid >= ql && pid <= qr {
                self.candidates.push(c);
            }
        }

        let mut lower_bound = self
            .candidates
            .peek()
            .map(|c| c.distance.into_inner())
            .unwrap_or(f32::INFINITY);

        while let Some(Reverse(current)) = self.pool.pop() {
            if current.distance.into_inner() > lower_bound {
                break;
            }
            self.hops += 1;

            let edges = Self::select_edge(tree, graph, current.id, ql, qr, edge_limit);
            for &n in &edges {
                graph.prefetch(n);
            }
            for n in edges {
                if !self.visited.insert(n) {
                    continue;
                }
                let dist = graph.distance_to::<M>(n, query);
                self.dco += 1;
                if self.candidates.len() < ef || dist < lower_bound {
                    let c = Candidate::new(dist, n);
                    self.pool.push(Reverse(c));
                    if n >= ql && n <= qr {
                        self.candidates.push(c);
                        if self.candidates.len() > ef {
                            let mut all: Vec<Candidate> = std::mem::take(&mut self.candidates).into_sorted_vec();
                            all.pop();
                            self.candidates = all.into_iter().collect();
                        }
                    }
                    if let Some(top) = self.candidates.peek() {
                        lower_bound = top.distance.into_inner();
                    }
                }
            }
        }

        let mut result: Vec<Candidate> = std::mem::take(&mut self.candidates).into_sorted_vec();
        result.truncate(k);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{Builder, Config};
    use crate::graph::Euclidean;
    use crate::point::FloatArray;

    fn line_points(n: u32) -> Vec<FloatArray<2>> {
        (0..n).map(|i| FloatArray([i as f32, 0.0])).collect()
    }

    #[test]
    fn search_returns_only_in_range_ids() {
        let points = line_points(64);
        let config = Config {
            m: 8,
            ef_construction: 32,
            seed: 7,
            threads: 1,
            ..Config::default()
        };
        let index = Builder::new(config).unwrap().build(&points).unwrap();

        let mut searcher = Searcher::new(points.len(), 7);
        let query = [20.0f32, 0.0];
        let results = searcher.search_range::<Euclidean>(&index.tree, &index.graph, &query, 10, 30, 20, 5, 16);

        for c in &results {
            assert!(c.id >= 10 && c.id <= 30, "id {} escaped range [10,30]", c.id);
        }
    }

    #[test]
    fn search_finds_nearest_within_range() {
        let points = line_points(64);
        let config = Config {
            m: 12,
            ef_construction: 64,
            seed: 11,
            threads: 1,
            ..Config::default()
        };
        let index = Builder::new(config).unwrap().build(&points).unwrap();

        let mut searcher = Searcher::new(points.len(), 11);
        let query = [5.0f32, 0.0];
        let results = searcher.search_range::<Euclidean>(&index.tree, &index.graph, &query, 10, 40, 30, 3, 20);

        assert!(!results.is_empty());
        assert_eq!(results[0].id, 10);
    }

    #[test]
    fn select_edge_respects_edge_limit() {
        let points = line_points(32);
        let config = Config {
            m: 16,
            ef_construction: 32,
            seed: 3,
            threads: 1,
            ..Config::default()
        };
        let index = Builder::new(config).unwrap().build(&points).unwrap();
        let edges = Searcher::select_edge(&index.tree, &index.graph, 15, 0, 31, 4);
        assert!(edges.len() <= 4);
    }
}
