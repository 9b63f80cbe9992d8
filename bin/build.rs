//! `range-graph-build` — constructs an index file from a vector file
//! (spec.md §6 "CLI surface").

use std::path::PathBuf;

use anyhow::Context;
use structopt::StructOpt;

use range_graph::io::{index, vectors};
use range_graph::point::SlicePoint;
use range_graph::{Builder, Config};

#[derive(StructOpt)]
#[structopt(name = "range-graph-build")]
struct Opt {
    /// Vector file, points already sorted by the id-ordering attribute.
    #[structopt(long, parse(from_os_str))]
    data_path: PathBuf,

    /// Where to write the index file.
    #[structopt(long, parse(from_os_str))]
    index_file: PathBuf,

    #[structopt(long, default_value = "32")]
    m: usize,

    #[structopt(long, default_value = "400")]
    ef_construction: usize,

    #[structopt(long)]
    threads: Option<usize>,

    #[structopt(long, default_value = "7")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let vectors = vectors::VectorFile::read(&opt.data_path)
        .with_context(|| format!("loading vectors from {}", opt.data_path.display()))?;

    let points: Vec<SlicePoint> = (0..vectors.n).map(|i| SlicePoint(vectors.row(i).to_vec())).collect();
    log::info!("loaded {} points of dimension {}", vectors.n, vectors.dim);

    let config = Config {
        m: opt.m,
        ef_construction: opt.ef_construction,
        threads: opt.threads.unwrap_or_else(num_cpus::get),
        seed: opt.seed,
        ..Config::default()
    };

    let builder = Builder::new(config).context("invalid build configuration")?;
    let built = builder.build(&points).context("index construction failed")?;

    index::write(&opt.index_file, &built.graph).context("writing index file")?;
    log::info!("wrote index to {}", opt.index_file.display());

    Ok(())
}
