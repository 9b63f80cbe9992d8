//! Range file: `Q × (int32 ql, int32 qr)` pairs, or `Q × (l1,r1,l2,r2)` quads
//! for the 2-D/multi-attribute variant (spec.md §6; `original_source`'s
//! `LoadQueryRange`/`LoadRanges`). Neither variant carries a length prefix —
//! the query count is already known from the query vector file.

use std::path::Path;

use super::{create_write, open_read, read_i32, write_i32};
use crate::error::Result;

pub fn read_single(path: impl AsRef<Path>, query_nb: usize) -> Result<Vec<(i32, i32)>> {
    let path = path.as_ref();
    let mut r = open_read(path)?;
    let mut out = Vec::with_capacity(query_nb);
    for _ in 0..query_nb {
        let ql = read_i32(&mut r, path)?;
        let qr = read_i32(&mut r, path)?;
        out.push((ql, qr));
    }
    Ok(out)
}

pub fn write_single(path: impl AsRef<Path>, ranges: &[(i32, i32)]) -> Result<()> {
    let path = path.as_ref();
    let mut w = create_write(path)?;
    for &(ql, qr) in ranges {
        write_i32(&mut w, path, ql)?;
        write_i32(&mut w, path, qr)?;
    }
    Ok(())
}

pub fn read_multi(path: impl AsRef<Path>, query_nb: usize) -> Result<Vec<Vec<(i32, i32)>>> {
    let path = path.as_ref();
    let mut r = open_read(path)?;
    let mut out = Vec::with_capacity(query_nb);
    for _ in 0..query_nb {
        let l1 = read_i32(&mut r, path)?;
        let r1 = read_i32(&mut r, path)?;
        let l2 = read_i32(&mut r, path)?;
        let r2 = read_i32(&mut r, path)?;
        out.push(vec![(l1, r1), (l2, r2)]);
    }
    Ok(out)
}

pub fn write_multi(path: impl AsRef<Path>, ranges: &[Vec<(i32, i32)>]) -> Result<()> {
    let path = path.as_ref();
    let mut w = create_write(path)?;
    for constraint in ranges {
        for &(l, r) in constraint {
            write_i32(&mut w, path, l)?;
            write_i32(&mut w, path, r)?;
        }
    }
    Ok(())
}
