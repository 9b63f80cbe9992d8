//! Graph storage (spec.md §4.2, §9 "Ownership of graph storage").
//!
//! Two backends, mirroring the teacher's own two parallel `Hnsw`
//! implementations (`lib.rs`'s `ContiguousStorage`-backed one vs
//! `contiguous.rs`'s plain-`Vec<P>`-backed one):
//!
//! - [`OwnedGraph`] is the build-time mutable per-`(point, depth)` neighbor
//!   list store, a direct port of `construction.h`'s `edges[id][layer]`.
//! - [`FlatGraph`] is the search-time immutable single-arena store: one
//!   contiguous `Vec<u32>` holding every point's neighbor slots (one per
//!   layer) followed by its vector, addressed by pointer arithmetic exactly as
//!   `iRG_search.h`'s `get_linklist`/`getDataByInternalId` do. Ported to safe
//!   Rust as a `Vec<u32>` word arena (floats stored via `to_bits`/`from_bits`)
//!   rather than raw pointer casts.

use parking_lot::RwLock;

use crate::candidate::Candidate;

/// Distance primitive capability (Design Note: "Polymorphism over distance",
/// spec.md §9). `FlatGraph` is tied to dense float vectors (the wire format in
/// spec.md §6 is exactly that), but the metric used to compare them is
/// pluggable.
pub trait Metric: Sync {
    fn distance(a: &[f32], b: &[f32]) -> f32;
}

#[derive(Debug, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

/// Build-time mutable neighbor store: `N(point, depth) -> Vec<Candidate>`.
///
/// Each `(point, depth)` slot is its own `RwLock` (teacher precedent: one
/// `RwLock<ZeroNode>` per point in `contiguous.rs`). Different tree nodes at a
/// layer own disjoint point intervals (spec.md §5), so in practice there is
/// never lock contention on a slot during a parallel layer pass.
pub struct OwnedGraph {
    // indexed [point][depth]
    slots: Vec<Vec<RwLock<Vec<Candidate>>>>,
}

impl OwnedGraph {
    pub fn new(n: usize, depths: usize) -> Self {
        let mut slots = Vec::with_capacity(n);
        for _ in 0..n {
            let mut per_depth = Vec::with_capacity(depths);
            for _ in 0..depths {
                per_depth.push(RwLock::new(Vec::new()));
            }
            slots.push(per_depth);
        }
        OwnedGraph { slots }
    }

    pub fn get(&self, point: u32, depth: u32) -> Vec<Candidate> {
        self.slots[point as usize][depth as usize].read().clone()
    }

    pub fn set(&self, point: u32, depth: u32, value: Vec<Candidate>) {
        *self.slots[point as usize][depth as usize].write() = value;
    }

    pub fn degree(&self, point: u32, depth: u32) -> usize {
        self.slots[point as usize][depth as usize].read().len()
    }
}

fn round_up(x: usize, multiple: usize) -> usize {
    (x + multiple - 1) / multiple * multiple
}

/// Search-time immutable arena (spec.md §4.2). One contiguous `Vec<u32>`
/// holding, per point: `max_depth+1` neighbor slots (`count:u32` followed by
/// up to `m` neighbor ids), padded to a multiple of 8 words (32 bytes), then
/// the point's vector (also padded to a multiple of 8 words), exactly
/// mirroring `iRG_search.h`'s `size_links_per_layer_`/`size_links_per_element_`/
/// `offsetData_` arithmetic.
pub struct FlatGraph {
    data: Vec<u32>,
    n: u32,
    dim: usize,
    m: usize,
    max_depth: u32,
    words_per_layer: usize,
    words_links_per_element: usize,
    words_per_element: usize,
}

impl FlatGraph {
    pub fn allocate(n: u32, dim: usize, m: usize, max_depth: u32) -> Self {
        let words_per_layer = 1 + m;
        let words_links_per_element = round_up(words_per_layer * (max_depth as usize + 1), 8);
        let dim_padded = round_up(dim, 8);
        let words_per_element = words_links_per_element + dim_padded;

        FlatGraph {
            data: vec![0u32; n as usize * words_per_element],
            n,
            dim,
            m,
            max_depth,
            words_per_layer,
            words_links_per_element,
            words_per_element,
        }
    }

    pub fn len(&self) -> u32 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn m(&self) -> usize {
        self.m
    }

    fn layer_offset(&self, pid: u32, depth: u32) -> usize {
        pid as usize * self.words_per_element + depth as usize * self.words_per_layer
    }

    fn data_offset(&self, pid: u32) -> usize {
        pid as usize * self.words_per_element + self.words_links_per_element
    }

    /// `N(pid, depth)` as a slice of raw neighbor ids (spec.md §3).
    pub fn neighbors(&self, pid: u32, depth: u32) -> &[u32] {
        let off = self.layer_offset(pid, depth);
        let count = self.data[off] as usize;
        &self.data[off + 1..off + 1 + count]
    }

    pub fn set_neighbors(&mut self, pid: u32, depth: u32, ids: &[u32]) -> crate::error::Result<()> {
        if ids.len() > self.m {
            return Err(crate::error::Error::Corrupt(format!(
                "neighbor list for point {pid} at depth {depth} has {} entries, exceeds M={}",
                ids.len(),
                self.m
            )));
        }
        let off = self.layer_offset(pid, depth);
        self.data[off] = ids.len() as u32;
        for (i, &id) in ids.iter().enumerate() {
            self.data[off + 1 + i] = id;
        }
        Ok(())
    }

    pub fn vector(&self, pid: u32) -> &[u32] {
        let off = self.data_offset(pid);
        &self.data[off..off + self.dim]
    }

    pub fn vector_f32(&self, pid: u32) -> Vec<f32> {
        self.vector(pid).iter().map(|&bits| f32::from_bits(bits)).collect()
    }

    pub fn set_vector(&mut self, pid: u32, v: &[f32]) {
        debug_assert_eq!(v.len(), self.dim);
        let off = self.data_offset(pid);
        for (i, &x) in v.iter().enumerate() {
            self.data[off + i] = x.to_bits();
        }
    }

    pub fn distance<M: Metric>(&self, a: u32, b: u32) -> f32 {
        M::distance(&self.vector_f32(a), &self.vector_f32(b))
    }

    pub fn distance_to<M: Metric>(&self, a: u32, query: &[f32]) -> f32 {
        M::distance(&self.vector_f32(a), query)
    }

    /// Hints the CPU to start pulling `pid`'s block into L1 before it's
    /// actually read (`original_source/include/memory.hpp`'s
    /// `mem_prefetch_L1`). Best-effort only — a no-op on targets without an
    /// intrinsic is perfectly correct, just slower.
    pub fn prefetch(&self, pid: u32) {
        let off = self.layer_offset(pid, 0);
        prefetch_read(&self.data[off]);
    }
}

#[cfg(target_arch = "x86_64")]
fn prefetch_read(addr: &u32) {
    unsafe {
        std::arch::x86_64::_mm_prefetch(addr as *const u32 as *const i8, std::arch::x86_64::_MM_HINT_T0);
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn prefetch_read(_addr: &u32) {}
