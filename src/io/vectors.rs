//! Vector file: `int32 N | int32 D | N × D × float32` (spec.md §6). Same
//! schema for query vectors (`original_source/include/utils.h`'s
//! `LoadData`/`LoadQuery`).

use std::path::Path;

use super::{create_write, open_read, read_f32, read_i32, write_f32, write_i32};
use crate::error::{Error, Result};

pub struct VectorFile {
    pub n: u32,
    pub dim: usize,
    pub data: Vec<f32>,
}

impl VectorFile {
    pub fn row(&self, i: u32) -> &[f32] {
        let off = i as usize * self.dim;
        &self.data[off..off + self.dim]
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut r = open_read(path)?;
        let n = read_i32(&mut r, path)?;
        let dim = read_i32(&mut r, path)?;
        if n < 0 || dim < 0 {
            return Err(Error::Corrupt(format!("vector file {} has negative N or D", path.display())));
        }
        let (n, dim) = (n as u32, dim as usize);
        let mut data = Vec::with_capacity(n as usize * dim);
        for _ in 0..(n as usize * dim) {
            data.push(read_f32(&mut r, path)?);
        }
        Ok(VectorFile { n, dim, data })
    }

    pub fn write(path: impl AsRef<Path>, dim: usize, rows: &[Vec<f32>]) -> Result<()> {
        let path = path.as_ref();
        let mut w = create_write(path)?;
        write_i32(&mut w, path, rows.len() as i32)?;
        write_i32(&mut w, path, dim as i32)?;
        for row in rows {
            if row.len() != dim {
                return Err(Error::Corrupt(format!(
                    "row has {} components, expected {dim}",
                    row.len()
                )));
            }
            for &x in row {
                write_f32(&mut w, path, x)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("range-graph-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vectors.bin");

        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        VectorFile::write(&path, 3, &rows).unwrap();

        let loaded = VectorFile::read(&path).unwrap();
        assert_eq!(loaded.n, 2);
        assert_eq!(loaded.dim, 3);
        assert_eq!(loaded.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(loaded.row(1), &[4.0, 5.0, 6.0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_truncated_file() {
        let dir = std::env::temp_dir().join(format!("range-graph-test-trunc-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&2i32.to_le_bytes()).unwrap();
        drop(f);

        assert!(VectorFile::read(&path).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
