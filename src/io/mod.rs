//! Binary file I/O (spec.md §6 "External Interfaces").
//!
//! Hand-rolled little-endian readers/writers rather than `serde`/`bincode`:
//! every layout here is specified byte-for-byte and must match
//! `original_source`'s raw layout exactly, which a generic serialization
//! framework would only obscure.

pub mod attributes;
pub mod groundtruth;
pub mod index;
pub mod ranges;
pub mod vectors;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};

fn open_read(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::io(path, e))
}

fn create_write(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path, e))
}

fn read_i32(r: &mut impl io::Read, path: &Path) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|e| Error::io(path, e))?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32(r: &mut impl io::Read, path: &Path) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|e| Error::io(path, e))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f32(r: &mut impl io::Read, path: &Path) -> Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|e| Error::io(path, e))?;
    Ok(f32::from_le_bytes(buf))
}

fn write_i32(w: &mut impl io::Write, path: &Path, v: i32) -> Result<()> {
    w.write_all(&v.to_le_bytes()).map_err(|e| Error::io(path, e))
}

fn write_u32(w: &mut impl io::Write, path: &Path, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes()).map_err(|e| Error::io(path, e))
}

fn write_f32(w: &mut impl io::Write, path: &Path, v: f32) -> Result<()> {
    w.write_all(&v.to_le_bytes()).map_err(|e| Error::io(path, e))
}
