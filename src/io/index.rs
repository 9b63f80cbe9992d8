//! Index file: for `p = 0..N-1`, for `d = 0..=max_depth`,
//! `int32 size | size × int32 neighbor_id` (spec.md §6; ported from
//! `original_source/include/construction.h::buildandsave`). Vectors are
//! not stored here — they live in the vector file and are loaded
//! separately into the graph's data region.

use std::path::Path;

use super::{create_write, open_read, read_i32, read_u32, write_i32, write_u32};
use crate::error::{Error, Result};
use crate::graph::FlatGraph;

pub fn write(path: impl AsRef<Path>, graph: &FlatGraph) -> Result<()> {
    let path = path.as_ref();
    let mut w = create_write(path)?;
    for pid in 0..graph.len() {
        for depth in 0..=graph.max_depth() {
            let neighbors = graph.neighbors(pid, depth);
            write_i32(&mut w, path, neighbors.len() as i32)?;
            for &id in neighbors {
                write_u32(&mut w, path, id)?;
            }
        }
    }
    Ok(())
}

/// Reads the index file into an already-allocated `FlatGraph` (the caller
/// must have separately loaded vectors via the vector file into the same
/// graph, mirroring `iRG_search.h`'s constructor which loads edges and
/// vectors from two distinct files into one arena).
pub fn read_into(path: impl AsRef<Path>, graph: &mut FlatGraph) -> Result<()> {
    let path = path.as_ref();
    let mut r = open_read(path)?;
    let m = graph.m();
    for pid in 0..graph.len() {
        for depth in 0..=graph.max_depth() {
            let size = read_i32(&mut r, path)?;
            if size < 0 || size as usize > m {
                return Err(Error::Corrupt(format!(
                    "point {pid} depth {depth} has neighbor count {size}, exceeds M={m}"
                )));
            }
            let mut ids = Vec::with_capacity(size as usize);
            for _ in 0..size {
                ids.push(read_u32(&mut r, path)?);
            }
            graph.set_neighbors(pid, depth, &ids)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FlatGraph;

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("range-graph-index-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.bin");

        let mut graph = FlatGraph::allocate(3, 2, 4, 1);
        graph.set_neighbors(0, 0, &[1, 2]).unwrap();
        graph.set_neighbors(0, 1, &[]).unwrap();
        graph.set_neighbors(1, 0, &[0]).unwrap();
        graph.set_neighbors(1, 1, &[2]).unwrap();
        graph.set_neighbors(2, 0, &[0, 1]).unwrap();
        graph.set_neighbors(2, 1, &[]).unwrap();

        write(&path, &graph).unwrap();

        let mut loaded = FlatGraph::allocate(3, 2, 4, 1);
        read_into(&path, &mut loaded).unwrap();

        assert_eq!(loaded.neighbors(0, 0), &[1, 2]);
        assert_eq!(loaded.neighbors(1, 1), &[2]);
        assert_eq!(loaded.neighbors(2, 0), &[0, 1]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_oversized_stored_list() {
        let dir = std::env::temp_dir().join(format!("range-graph-index-corrupt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corrupt.bin");

        // M=1, max_depth=0, one point: write a size=5 record.
        {
            use std::io::Write;
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(&5i32.to_le_bytes()).unwrap();
            for i in 0..5u32 {
                f.write_all(&i.to_le_bytes()).unwrap();
            }
        }

        let mut graph = FlatGraph::allocate(1, 2, 1, 0);
        assert!(read_into(&path, &mut graph).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
