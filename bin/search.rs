//! `range-graph-search` — single-attribute range-filtered search with CSV
//! recall/latency metrics (spec.md §6 "Reported metrics").

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use structopt::StructOpt;

use range_graph::graph::{Euclidean, FlatGraph};
use range_graph::io::{groundtruth, ranges, vectors};
use range_graph::segment_tree::SegmentTree;
use range_graph::{Config, Searcher};

#[derive(StructOpt)]
#[structopt(name = "range-graph-search")]
struct Opt {
    #[structopt(long, parse(from_os_str))]
    data_path: PathBuf,

    #[structopt(long, parse(from_os_str))]
    query_path: PathBuf,

    #[structopt(long, parse(from_os_str))]
    index_file: PathBuf,

    #[structopt(long, default_value = "32")]
    m: usize,

    /// Prefix for `<prefix><suffix>.bin` range files (suffixes 0..=9, 17).
    #[structopt(long, parse(from_os_str))]
    range_prefix: PathBuf,

    /// Prefix for `<prefix><suffix>.bin` groundtruth files, same suffixes.
    #[structopt(long, parse(from_os_str))]
    groundtruth_prefix: PathBuf,

    #[structopt(long, default_value = "10")]
    k: usize,

    #[structopt(long, default_value = "100")]
    ef: usize,

    #[structopt(long, default_value = "32")]
    edge_limit: usize,

    #[structopt(long, default_value = "7")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let data = vectors::VectorFile::read(&opt.data_path).context("loading data vectors")?;
    let queries = vectors::VectorFile::read(&opt.query_path).context("loading query vectors")?;

    let tree = SegmentTree::build(data.n);
    let mut graph = FlatGraph::allocate(data.n, data.dim, opt.m, tree.max_depth);
    for pid in 0..data.n {
        graph.set_vector(pid, data.row(pid));
    }
    range_graph::io::index::read_into(&opt.index_file, &mut graph).context("loading index file")?;

    let config = Config {
        ef_search: opt.ef,
        edge_limit: opt.edge_limit,
        ..Config::default()
    };

    let suffixes: Vec<String> = (0..10).map(|i| i.to_string()).chain(["17".to_string()]).collect();
    println!("suffix,ef,recall,qps,dco,hop");

    for suffix in &suffixes {
        let range_path = path_with_suffix(&opt.range_prefix, suffix);
        let gt_path = path_with_suffix(&opt.groundtruth_prefix, suffix);
        if !range_path.exists() || !gt_path.exists() {
            continue;
        }

        let query_ranges = ranges::read_single(&range_path, queries.n as usize)?;
        let gt = groundtruth::read(&gt_path, queries.n as usize, opt.k)?;

        let mut searcher = Searcher::new(data.n as usize, opt.seed);
        let mut hits = 0usize;
        let mut total = 0usize;
        let mut dco = 0u64;
        let mut hops = 0u64;
        let start = Instant::now();

        for (qid, &(ql, qr)) in query_ranges.iter().enumerate() {
            let query = queries.row(qid as u32);
            let result = searcher.search_range::<Euclidean>(
                &tree,
                &graph,
                query,
                ql as u32,
                qr as u32,
                config.ef_search,
                opt.k,
                config.edge_limit,
            );

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
        println!("{suffix},{},{recall:.4},{qps:.1},{avg_dco:.1},{avg_hop:.1}", config.ef_search);
    }

    Ok(())
}

fn path_with_suffix(prefix: &std::path::Path, suffix: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(suffix);
    s.push(".bin");
    PathBuf::from(s)
}
