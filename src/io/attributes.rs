//! Attribute file: `N × int32`, one file per attribute, in dataset order
//! (spec.md §6; `original_source/include/utils_multi.h`'s `LoadAttribute`).

use std::path::Path;

use super::{create_write, open_read, read_i32, write_i32};
use crate::error::Result;

/// Reads exactly `n` values; the file carries no length prefix of its own
/// (the dataset size is already known from the vector file).
pub fn read(path: impl AsRef<Path>, n: usize) -> Result<Vec<i32>> {
    let path = path.as_ref();
    let mut r = open_read(path)?;
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(read_i32(&mut r, path)?);
    }
    Ok(values)
}

pub fn write(path: impl AsRef<Path>, values: &[i32]) -> Result<()> {
    let path = path.as_ref();
    let mut w = create_write(path)?;
    for &v in values {
        write_i32(&mut w, path, v)?;
    }
    Ok(())
}
