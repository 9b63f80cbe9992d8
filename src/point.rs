//! The distance primitive (spec.md §4 item 1). Kept as an opaque capability —
//! SIMD kernels and alignment helpers are out of scope (spec.md §1) and are
//! expected to be supplied by a `Point` implementor, not this crate.

/// Grounded on `instant-distance`'s `contiguous.rs::Point` trait.
pub trait Point: Sync {
    fn distance(&self, other: &Self) -> f32;
}

/// A fixed-dimension dense vector, generalizing the `Point([f32; D])` pattern
/// used throughout the teacher's tests (`tests/all.rs`, `examples/colors.rs`)
/// to a const generic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatArray<const D: usize>(pub [f32; D]);

impl<const D: usize> Point for FloatArray<D> {
    fn distance(&self, other: &Self) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

impl<const D: usize> AsRef<[f32]> for FloatArray<D> {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// A runtime-dimension dense vector, used when loading points from a vector
/// file (spec.md §6) whose dimension is only known at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct SlicePoint(pub Vec<f32>);

impl Point for SlicePoint {
    fn distance(&self, other: &Self) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

impl AsRef<[f32]> for SlicePoint {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_distance() {
        let a = FloatArray([0.0, 0.0]);
        let b = FloatArray([3.0, 4.0]);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn slice_point_distance() {
        let a = SlicePoint(vec![0.0, 0.0, 0.0]);
        let b = SlicePoint(vec![1.0, 2.0, 2.0]);
        assert_eq!(a.distance(&b), 3.0);
    }
}
