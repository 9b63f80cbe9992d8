//! Groundtruth file: `Q × K × int32`, top-K internal ids per query, padded
//! with −1 when the eligible set is smaller than K (spec.md §6;
//! `original_source`'s `LoadGroundtruth`/`Generate_Groundtruth`).

use std::path::Path;

use super::{create_write, open_read, read_i32, write_i32};
use crate::error::Result;

pub fn read(path: impl AsRef<Path>, query_nb: usize, k: usize) -> Result<Vec<Vec<i32>>> {
    let path = path.as_ref();
    let mut r = open_read(path)?;
    let mut out = Vec::with_capacity(query_nb);
    for _ in 0..query_nb {
        let mut row = Vec::with_capacity(k);
        for _ in 0..k {
            row.push(read_i32(&mut r, path)?);
        }
        out.push(row);
    }
    Ok(out)
}

pub fn write(path: impl AsRef<Path>, rows: &[Vec<i32>], k: usize) -> Result<()> {
    let path = path.as_ref();
    let mut w = create_write(path)?;
    for row in rows {
        for i in 0..k {
            write_i32(&mut w, path, row.get(i).copied().unwrap_or(-1))?;
        }
    }
    Ok(())
}

/// Brute-force top-K by linear scan, restricted to ids for which `in_range`
/// holds, padded with −1 (spec.md §6, and the oracle used by recall tests
/// — `original_source`'s `Generate_Groundtruth`).
pub fn brute_force<F: Fn(u32) -> f32, G: Fn(u32) -> bool>(n: u32, k: usize, distance: F, in_range: G) -> Vec<i32> {
    let mut candidates: Vec<(f32, u32)> = (0..n).filter(|&id| in_range(id)).map(|id| (distance(id), id)).collect();
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let mut row: Vec<i32> = candidates.into_iter().take(k).map(|(_, id)| id as i32).collect();
    row.resize(k, -1);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_padding() {
        let dir = std::env::temp_dir().join(format!("range-graph-gt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gt.bin");

        let rows = vec![vec![3, 1], vec![5]];
        write(&path, &rows, 3).unwrap();
        let loaded = read(&path, rows.len(), 3).unwrap();
        assert_eq!(loaded, vec![vec![3, 1, -1], vec![5, -1, -1]]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn brute_force_pads_when_fewer_eligible_than_k() {
        let distances = [5.0, 1.0, 3.0, 2.0];
        let row = brute_force(4, 3, |id| distances[id as usize], |id| id == 1 || id == 3);
        assert_eq!(row, vec![1, 3, -1]);
    }

    #[test]
    fn brute_force_orders_by_distance() {
        let distances = [5.0, 1.0, 3.0, 2.0];
        let row = brute_force(4, 2, |id| distances[id as usize], |_| true);
        assert_eq!(row, vec![1, 3]);
    }
}
