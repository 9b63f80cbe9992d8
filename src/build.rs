//! Builder: populates the graph layer by layer, bottom-up (spec.md §4.3–§4.5).
//!
//! Ported from `original_source/include/construction.h`'s
//! `iRangeGraph_Build`: `process_node`, `search_on_incomplete_graph`,
//! `PruneByHeuristic2`.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::candidate::{Candidate, Visited};
use crate::error::{Error, Result};
use crate::graph::{Euclidean, FlatGraph, Metric, OwnedGraph};
use crate::point::Point;
use crate::segment_tree::{NodeId, SegmentTree};

/// Build/search-time tunables (spec.md §6 "Configuration").
#[derive(Clone, Debug)]
pub struct Config {
    pub m: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub edge_limit: usize,
    pub threads: usize,
    pub seed: u64,
    pub max_step: i32,
    pub pure_post: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            m: 32,
            ef_construction: 400,
            ef_search: 100,
            edge_limit: 32,
            threads: num_cpus::get(),
            seed: rand::random(),
            max_step: 20,
            pure_post: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 {
            return Err(Error::InvalidConfig("M must be positive".into()));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidConfig("ef_construction must be positive".into()));
        }
        if self.ef_search == 0 {
            return Err(Error::InvalidConfig("ef must be positive".into()));
        }
        if self.edge_limit == 0 {
            return Err(Error::InvalidConfig("edge_limit must be positive".into()));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be positive".into()));
        }
        if self.max_step < 1 {
            return Err(Error::InvalidConfig("max_step must be >= 1".into()));
        }
        Ok(())
    }
}

/// A fully built, immutable, read-only-shareable index (spec.md §3 lifecycles).
pub struct Index {
    pub tree: SegmentTree,
    pub graph: FlatGraph,
    pub config: Config,
}

/// Builder parameters, mirroring the teacher's `Builder` (`lib.rs`).
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Builder { config })
    }

    /// Build an index over `points` (dense Euclidean vectors of uniform
    /// dimension), pre-sorted by the caller along whatever attribute defines
    /// "id range" (spec.md §3).
    pub fn build<P: Point + AsRef<[f32]>>(&self, points: &[P]) -> Result<Index> {
        let n = points.len();
        if n == 0 {
            return Err(Error::InvalidConfig("cannot build an index over zero points".into()));
        }
        let dim = points[0].as_ref().len();

        let tree = SegmentTree::build(n as u32);
        let owned = OwnedGraph::new(n, tree.max_depth as usize + 1);

        // Layers are strict barriers (spec.md §5): layer d+1 fully completes
        // before layer d starts. Within a layer, nodes are independent and may
        // run in parallel (teacher precedent: `contiguous.rs`'s
        // `into_par_iter()` over a layer's assignments).
        let mut nodes_by_depth: Vec<Vec<NodeId>> = vec![Vec::new(); tree.max_depth as usize + 1];
        for (idx, node) in tree.nodes.iter().enumerate() {
            nodes_by_depth[node.depth as usize].push(NodeId(idx as u32));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| Error::Alloc(e.to_string()))?;

        #[cfg(feature = "progress")]
        let overall_bar = indicatif::ProgressBar::new(tree.nodes.len() as u64);
        #[cfg(feature = "progress")]
        overall_bar.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap(),
        );

        for depth in (0..=tree.max_depth).rev() {
            log::debug!("building layer {depth}");
            #[cfg(feature = "progress")]
            overall_bar.set_message(format!("layer {depth}"));
            let layer_nodes = &nodes_by_depth[depth as usize];
            let config = &self.config;
            pool.install(|| {
                layer_nodes.par_iter().for_each(|&u| {
                    process_node(u, &tree, &owned, points, config);
                    #[cfg(feature = "progress")]
                    overall_bar.inc(1);
                });
            });
        }
        #[cfg(feature = "progress")]
        overall_bar.finish_with_message("build complete");

        let mut graph = FlatGraph::allocate(n as u32, dim, self.config.m, tree.max_depth);
        for pid in 0..n as u32 {
            graph.set_vector(pid, points[pid as usize].as_ref());
            for depth in 0..=tree.max_depth {
                let list = owned.get(pid, depth);
                let ids: Vec<u32> = list.iter().map(|c| c.id).collect();
                graph.set_neighbors(pid, depth, &ids)?;
            }
        }

        Ok(Index {
            tree,
            graph,
            config: self.config.clone(),
        })
    }
}

/// `process_node(u)` (spec.md §4.3). Invariant entering: every child of `u`
/// has a fully populated `N(p, child.depth)` for every `p` in its interval.
/// Invariant leaving: `N(p, u.depth)` is populated for every `p` in `u`'s
/// interval.
fn process_node<P: Point>(u: NodeId, tree: &SegmentTree, owned: &OwnedGraph, points: &[P], config: &Config) {
    let node = tree.node(u);
    if node.is_leaf() {
        return;
    }

    let children = node.children.clone();
    let depth = node.depth;
    let lbound = node.lbound;

    // Step 1: seed from the first child — locality is preserved because the
    // first child's interval is a subset of u's.
    let first = tree.node(children[0]);
    for p in first.lbound..=first.rbound {
        let list = owned.get(p, first.depth);
        owned.set(p, depth, list);
    }

    let mut merged_len: u32 = first.rbound - first.lbound + 1;
    let mut rng = SmallRng::seed_from_u64(config.seed ^ (u.0 as u64).wrapping_mul(0x9E3779B97F4A7C15));

    for &child_id in &children[1..] {
        let child = tree.node(child_id);

        for p in child.lbound..=child.rbound {
            let entry_count = 3.min(merged_len as usize);
            let mut entries = Vec::with_capacity(entry_count);
            for _ in 0..entry_count {
                entries.push(lbound + rng.gen_range(0..merged_len));
            }

            let found = search_on_incomplete_graph(
                depth,
                p,
                points,
                owned,
                config.ef_construction,
                config.ef_construction,
                &entries,
            );

            let old_list = owned.get(p, child.depth);
            let pruned = heuristic_prune(&old_list, &found, config.m, points);
            owned.set(p, depth, pruned);
        }

        // Reverse back-edges: for each p in the new child and each neighbor q
        // already inside `merged` (i.e. q < child.lbound), record (dist, p) as
        // a candidate incoming edge for q.
        let mut reverse_edges: HashMap<u32, Vec<Candidate>> = HashMap::new();
        for p in child.lbound..=child.rbound {
            for c in owned.get(p, depth) {
                if c.id < child.lbound {
                    reverse_edges.entry(c.id).or_default().push(Candidate::new(c.distance.into_inner(), p));
                }
            }
        }

        for (q, incoming) in reverse_edges {
            let current = owned.get(q, depth);
            let pruned = heuristic_prune(&current, &incoming, config.m, points);
            owned.set(q, depth, pruned);
        }

        merged_len += child.rbound - child.lbound + 1;
    }
}

/// Beam search against the graph as it currently stands at `depth`
/// (spec.md §4.4). `depth` may not yet have edges for points outside
/// `merged`, which is fine — zero-degree expansion is handled gracefully.
fn search_on_incomplete_graph<P: Point>(
    depth: u32,
    query_point: u32,
    points: &[P],
    owned: &OwnedGraph,
    ef: usize,
    k: usize,
    entry_points: &[u32],
) -> Vec<Candidate> {
    assert!(!entry_points.is_empty(), "search-on-incomplete-graph requires at least one entry point");

    let mut visited = Visited::with_capacity(points.len());
    let mut pool: std::collections::BinaryHeap<std::cmp::Reverse<Candidate>> = std::collections::BinaryHeap::new();
    let mut candidates: std::collections::BinaryHeap<Candidate> = std::collections::BinaryHeap::new();

    for &pid in entry_points {
        if !visited.insert(pid) {
            continue;
        }
        let dist = points[query_point as usize].distance(&points[pid as usize]);
        let c = Candidate::new(dist, pid);
        pool.push(std::cmp::Reverse(c));
        candidates.push(c);
    }

    let mut lower_bound = candidates.peek().map(|c| c.distance.into_inner()).unwrap_or(f32::INFINITY);

    while let Some(std::cmp::Reverse(current)) = pool.pop() {
        if current.distance.into_inner() > lower_bound {
            break;
        }

        for n in owned.get(current.id, depth) {
            if !visited.insert(n.id) {
                continue;
            }
            let dist = points[query_point as usize].distance(&points[n.id as usize]);
            if candidates.len() < ef || dist < lower_bound {
                let c = Candidate::new(dist, n.id);
                candidates.push(c);
                pool.push(std::cmp::Reverse(c));
                if candidates.len() > ef {
                    let mut all: Vec<Candidate> = candidates.into_sorted_vec();
                    all.pop();
                    candidates = all.into_iter().collect();
                }
                if let Some(top) = candidates.peek() {
                    lower_bound = top.distance.into_inner();
                }
            }
        }
    }

    let mut result: Vec<Candidate> = candidates.into_sorted_vec();
    result.truncate(k);
    result
}

/// Two-list diversification prune (spec.md §4.5). Items originating in
/// `old_list` are pre-committed and are never pruned away by items in
/// `new_list`; the diversification check is skipped when the kept comparand
/// came from `old_list`.
fn heuristic_prune<P: Point>(old_list: &[Candidate], new_list: &[Candidate], m: usize, points: &[P]) -> Vec<Candidate> {
    let old_ids: std::collections::HashSet<u32> = old_list.iter().map(|c| c.id).collect();

    let mut merged: Vec<Candidate> = old_list.iter().chain(new_list.iter()).copied().collect();
    merged.sort_unstable();

    if merged.len() <= m {
        return merged;
    }

    let mut kept: Vec<Candidate> = Vec::with_capacity(m);
    let mut kept_is_old: Vec<bool> = Vec::with_capacity(m);

    for candidate in merged {
        if kept.len() >= m {
            break;
        }

        let current_old = old_ids.contains(&candidate.id);
        let mut good = true;
        for (i, &x) in kept.iter().enumerate() {
            if current_old && kept_is_old[i] {
                continue;
            }
            let d = points[candidate.id as usize].distance(&points[x.id as usize]);
            if d < candidate.distance.into_inner() {
                good = false;
                break;
            }
        }

        if good {
            kept_is_old.push(current_old);
            kept.push(candidate);
        }
    }

    kept
}

pub type DefaultMetric = Euclidean;

#[allow(dead_code)]
fn assert_metric_is_sync<M: Metric>() {}
