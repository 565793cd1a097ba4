//! A two-level segmented sample array.
//!
//! Rather than one contiguous allocation per channel, samples are held in
//! fixed-size power-of-two segments so a very long channel never demands a
//! single huge allocation up front; see `DESIGN.md` for the segment-length
//! rule.

use super::errors::EditorError;
use super::sample::{SampleElement, SampleType};

/// A logical sequence of samples of element type `T`, stored as
/// `segmentCount` segments of `segmentLen` elements each.
///
/// `segmentLen` is a power of two, fixed for the life of the function, so
/// indexing decomposes `i` into `(i / segmentLen, i % segmentLen)` with a
/// shift and a mask rather than a division.
#[derive(Debug, Clone)]
pub struct SampledFunction<T: SampleElement> {
    segment_len: usize,
    total_len: usize,
    segments: Vec<Vec<T>>,
}

const MAX_SEGMENT_LEN: usize = 1 << 24;

fn largest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        1
    } else {
        1usize << (usize::BITS - 1 - n.leading_zeros())
    }
}

impl<T: SampleElement> SampledFunction<T> {
    /// Allocate a function of `total_len` elements, all initialized to
    /// [`SampleElement::zero`]. `segmentLen` is the largest power-of-two
    /// `<= min(total_len, 2^24)`.
    pub fn allocate(total_len: usize) -> Result<Self, EditorError> {
        if total_len == 0 {
            return Ok(Self { segment_len: 1, total_len: 0, segments: vec![] });
        }

        let segment_len = largest_power_of_two_leq(total_len.min(MAX_SEGMENT_LEN));
        let segment_count = (total_len + segment_len - 1) / segment_len;

        let mut segments = Vec::new();
        segments.try_reserve(segment_count).map_err(|_| EditorError::OutOfMemory)?;

        for _ in 0..segment_count {
            let mut segment = Vec::new();
            segment.try_reserve(segment_len).map_err(|_| EditorError::OutOfMemory)?;
            segment.resize(segment_len, T::zero());
            segments.push(segment);
        }

        Ok(Self { segment_len, total_len, segments })
    }

    pub fn len(&self) -> usize {
        self.total_len
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// The element precision this function is instantiated over.
    pub fn sample_type(&self) -> SampleType {
        T::TYPE
    }

    fn decompose(&self, i: usize) -> (usize, usize) {
        (i / self.segment_len, i % self.segment_len)
    }

    pub fn get(&self, i: usize) -> T {
        let (seg, off) = self.decompose(i);
        self.segments[seg][off]
    }

    pub fn set(&mut self, i: usize, v: T) {
        let (seg, off) = self.decompose(i);
        self.segments[seg][off] = v;
    }

    /// Returns a new function of length `hi - lo` holding a copy of
    /// `self[lo..hi)`. Used to snapshot pre-modification samples.
    pub fn partial_clone(&self, lo: usize, hi: usize) -> Result<Self, EditorError> {
        if lo > hi || hi > self.total_len {
            return Err(EditorError::InvalidRange { from: lo, to: hi, len: self.total_len });
        }
        let mut out = Self::allocate(hi - lo)?;
        for (dst, src) in (lo..hi).enumerate() {
            out.set(dst, self.get(src));
        }
        Ok(out)
    }

    /// Bulk-copy `count` elements from `src[src_start..]` into
    /// `dst[dst_start..]`, crossing segment boundaries freely.
    pub fn copy_samples(
        dst: &mut Self,
        src: &Self,
        src_start: usize,
        dst_start: usize,
        count: usize,
    ) -> Result<(), EditorError> {
        if src_start + count > src.total_len {
            return Err(EditorError::InvalidRange { from: src_start, to: src_start + count, len: src.total_len });
        }
        if dst_start + count > dst.total_len {
            return Err(EditorError::InvalidRange { from: dst_start, to: dst_start + count, len: dst.total_len });
        }
        for i in 0..count {
            dst.set(dst_start + i, src.get(src_start + i));
        }
        Ok(())
    }

    /// Stride-sampled minimum over `[lo, hi)`, comparing magnitude for
    /// complex elements but returning the original value. `None` on an
    /// empty range (the `+inf` identity).
    pub fn get_min(&self, lo: usize, hi: usize, step: usize) -> Option<T> {
        self.extremum(lo, hi, step, |a, b| a < b)
    }

    /// Stride-sampled maximum; `None` on an empty range (the `-inf`
    /// identity).
    pub fn get_max(&self, lo: usize, hi: usize, step: usize) -> Option<T> {
        self.extremum(lo, hi, step, |a, b| a > b)
    }

    fn extremum(&self, lo: usize, hi: usize, step: usize, better: impl Fn(f64, f64) -> bool) -> Option<T> {
        let step = step.max(1);
        let hi = hi.min(self.total_len);
        if lo >= hi {
            return None;
        }

        let mut best: Option<(T, f64)> = None;
        let mut i = lo;
        while i < hi {
            let v = self.get(i);
            let mag = v.magnitude();
            best = match best {
                Some((_, best_mag)) if !better(mag, best_mag) => best,
                _ => Some((v, mag)),
            };
            i += step;
        }
        best.map(|(v, _)| v)
    }
}

/// A view of a complex function as its equivalent real function of twice
/// the length, interleaving real/imaginary parts.
///
/// Rather than an `unsafe` pointer-cast over a `#[repr(C)]` pair, this
/// resolves `get(i)` through [`SampleElement::to_real_parts`]: it never
/// copies or allocates, but doesn't rely on `Complex<F>`'s layout being a
/// stable API guarantee. See `DESIGN.md` for why.
pub struct ComplexAsRealView<'a, T: SampleElement> {
    inner: &'a SampledFunction<T>,
}

impl<'a, T: SampleElement> ComplexAsRealView<'a, T> {
    pub fn len(&self) -> usize {
        self.inner.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, i: usize) -> f64 {
        let (re, im) = self.inner.get(i / 2).to_real_parts();
        if i % 2 == 0 {
            re
        } else {
            im
        }
    }
}

impl<T: SampleElement> SampledFunction<T> {
    /// See [`ComplexAsRealView`].
    pub fn read_complex_as_real(&self) -> ComplexAsRealView<'_, T> {
        ComplexAsRealView { inner: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zero_fills() {
        let f = SampledFunction::<f64>::allocate(10).unwrap();
        assert_eq!(f.len(), 10);
        for i in 0..10 {
            assert_eq!(f.get(i), 0.0);
        }
    }

    #[test]
    fn set_and_get_round_trip_across_segments() {
        let mut f = SampledFunction::<f64>::allocate(1000).unwrap();
        for i in 0..1000 {
            f.set(i, i as f64);
        }
        for i in 0..1000 {
            assert_eq!(f.get(i), i as f64);
        }
    }

    #[test]
    fn partial_clone_copies_the_requested_range() {
        let mut f = SampledFunction::<f64>::allocate(100).unwrap();
        for i in 0..100 {
            f.set(i, i as f64);
        }
        let clone = f.partial_clone(10, 20).unwrap();
        assert_eq!(clone.len(), 10);
        assert_eq!(clone.get(0), 10.0);
        assert_eq!(clone.get(9), 19.0);
    }

    #[test]
    fn get_min_max_use_magnitude_but_return_original_value() {
        use num_complex::Complex;
        let mut f = SampledFunction::<Complex<f64>>::allocate(3).unwrap();
        f.set(0, Complex::new(1.0, 0.0));
        f.set(1, Complex::new(-5.0, 0.0));
        f.set(2, Complex::new(2.0, 0.0));
        assert_eq!(f.get_max(0, 3, 1), Some(Complex::new(-5.0, 0.0)));
        assert_eq!(f.get_min(0, 3, 1), Some(Complex::new(1.0, 0.0)));
    }

    #[test]
    fn empty_range_returns_none() {
        let f = SampledFunction::<f64>::allocate(10).unwrap();
        assert_eq!(f.get_min(5, 5, 1), None);
    }

    #[test]
    fn complex_as_real_view_interleaves_parts() {
        use num_complex::Complex;
        let mut f = SampledFunction::<Complex<f64>>::allocate(2).unwrap();
        f.set(0, Complex::new(1.0, 2.0));
        f.set(1, Complex::new(3.0, 4.0));
        let view = f.read_complex_as_real();
        assert_eq!(view.len(), 4);
        assert_eq!(view.get(0), 1.0);
        assert_eq!(view.get(1), 2.0);
        assert_eq!(view.get(2), 3.0);
        assert_eq!(view.get(3), 4.0);
    }
}
