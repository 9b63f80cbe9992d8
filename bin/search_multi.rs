//! `range-graph-search-multi` — multi-attribute range-filtered search
//! (spec.md §4.8, §6 "CLI surface"). Loads an index already built by
//! `range-graph-build` over data pre-sorted by the primary attribute; this
//! binary only searches, it does not construct.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use structopt::StructOpt;

use range_graph::graph::{Euclidean, FlatGraph};
use range_graph::io::{attributes, groundtruth, ranges, vectors};
use range_graph::multi::{AttrConstraint, MultiAttrIndex, MultiAttrSearcher};
use range_graph::segment_tree::SegmentTree;
use range_graph::Config;

#[derive(StructOpt)]
#[structopt(name = "range-graph-search-multi")]
struct Opt {
    /// Vector file, already sorted by the primary attribute.
    #[structopt(long, parse(from_os_str))]
    data_path: PathBuf,

    #[structopt(long, parse(from_os_str))]
    query_path: PathBuf,

    #[structopt(long, parse(from_os_str))]
    index_file: PathBuf,

    /// One attribute file per attribute, in the same sorted order as
    /// `data_path`; the first is the primary (id-ordering) attribute.
    #[structopt(long, parse(from_os_str))]
    attr_file: Vec<PathBuf>,

    #[structopt(long, parse(from_os_str))]
    range_path: PathBuf,

    #[structopt(long, parse(from_os_str))]
    groundtruth_path: PathBuf,

    #[structopt(long, default_value = "32")]
    m: usize,

    #[structopt(long, default_value = "10")]
    k: usize,

    #[structopt(long, default_value = "100")]
    ef: usize,

    #[structopt(long, default_value = "32")]
    edge_limit: usize,

    #[structopt(long, default_value = "20")]
    max_step: i32,

    #[structopt(long)]
    pure_post: bool,

    #[structopt(long, default_value = "7")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    if opt.attr_file.is_empty() {
        anyhow::bail!("at least one --attr-file is required");
    }

    let data = vectors::VectorFile::read(&opt.data_path).context("loading data vectors")?;
    let queries = vectors::VectorFile::read(&opt.query_path).context("loading query vectors")?;

    let mut attrs: Vec<Vec<i32>> = vec![Vec::with_capacity(opt.attr_file.len()); data.n as usize];
    for path in &opt.attr_file {
        let column = attributes::read(path, data.n as usize)
            .with_context(|| format!("loading attribute file {}", path.display()))?;
        for (pid, v) in column.into_iter().enumerate() {
            attrs[pid].push(v);
        }
    }

    let tree = SegmentTree::build(data.n);
    let mut graph = FlatGraph::allocate(data.n, data.dim, opt.m, tree.max_depth);
    for pid in 0..data.n {
        graph.set_vector(pid, data.row(pid));
    }
    range_graph::io::index::read_into(&opt.index_file, &mut graph).context("loading index file")?;

    // The index was built over data pre-sorted by the primary attribute, so
    // internal id == original id here; a host that sorts on the fly instead
    // would supply the real permutation from that step.
    let original_id: Vec<u32> = (0..data.n).collect();

    let index = MultiAttrIndex {
        tree,
        graph,
        attrs,
        original_id,
    };

    let config = Config {
        m: opt.m,
        ef_search: opt.ef,
        edge_limit: opt.edge_limit,
        max_step: opt.max_step,
        pure_post: opt.pure_post,
        seed: opt.seed,
        ..Config::default()
    };

    let query_ranges = ranges::read_multi(&opt.range_path, queries.n as usize)?;
    let gt = groundtruth::read(&opt.groundtruth_path, queries.n as usize, opt.k)?;

    let mut searcher = MultiAttrSearcher::new(data.n as usize, opt.seed);
    let mut hits = 0usize;
    let mut total = 0usize;
    let mut dco = 0u64;
    let mut hops = 0u64;
    let start = Instant::now();

    for (qid, ranges) in query_ranges.iter().enumerate() {
        let query = queries.row(qid as u32);
        let constraint = AttrConstraint { ranges: ranges.clone() };
        let result = searcher.search::<Euclidean>(
            &index,
            query,
            &constraint,
            config.ef_search,
            opt.k,
            config.edge_limit,
            config.max_step,
            config.pure_post,
        );

        // `result` ids are already in original (caller) id space.
        let truth: std::collections::HashSet<i32> = gt[qid].iter().copied().filter(|&id| id >= 0).collect();
        total += truth.len().min(opt.k);
        hits += result.iter().filter(|c| truth.contains(&(c.id as i32))).count();
        dco += searcher.dco();
        hops += searcher.hops();
    }

    let elapsed = start.elapsed().as_secs_f64();
    let recall = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
    let qps = query_ranges.len() as f64 / elapsed.max(1e-9);
    let n_queries = query_ranges.len().max(1) as f64;
    let avg_dco = dco as f64 / n_queries;
    let avg_hop = hops as f64 / n_queries;

    println!("ef,recall,qps,dco,hop");
    println!("{},{recall:.4},{qps:.1},{avg_dco:.1},{avg_hop:.1}", config.ef_search);

    Ok(())
}
