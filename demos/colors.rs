//! Finds the closest named color to a target, filtered to a sub-range of a
//! small fixed palette — a toy demonstration of range-filtered search.

use range_graph::graph::Euclidean;
use range_graph::point::FloatArray;
use range_graph::{Builder, Config, Searcher};

fn main() {
    let names = ["red", "orange", "yellow", "green", "blue", "indigo", "violet"];
    let points: Vec<FloatArray<3>> = vec![
        FloatArray([255.0, 0.0, 0.0]),
        FloatArray([255.0, 165.0, 0.0]),
        FloatArray([255.0, 255.0, 0.0]),
        FloatArray([0.0, 255.0, 0.0]),
        FloatArray([0.0, 0.0, 255.0]),
        FloatArray([75.0, 0.0, 130.0]),
        FloatArray([238.0, 130.0, 238.0]),
    ];

    let config = Config {
        m: 4,
        ef_construction: 16,
        threads: 1,
        seed: 1,
        ..Config::default()
    };
    let index = Builder::new(config).unwrap().build(&points).unwrap();
    let mut searcher = Searcher::new(points.len(), 1);

    let target = [204.0f32, 85.0, 0.0];

    // Unconstrained: searches the whole palette.
    let closest = searcher.search_range::<Euclidean>(&index.tree, &index.graph, &target, 0, 6, 8, 1, 8);
    println!("closest overall: {}", names[closest[0].id as usize]);

    // Restricted to the "cool" half of the palette (ids 3..=6).
    let closest_cool = searcher.search_range::<Euclidean>(&index.tree, &index.graph, &target, 3, 6, 8, 1, 8);
    println!("closest among cool colors: {}", names[closest_cool[0].id as usize]);
}
