//! Real-interleaved FFT/IFFT engine.
//!
//! Built on the TI SPRA291 packed-real-FFT technique, generalized over
//! `num_complex`'s `Complex<f32>`/`Complex<f64>` the way the rest of this
//! codec generalizes over [`crate::sample::SampleElement`].

use num_complex::Complex;
use num_traits::{Float, FloatConst};

/// Per-`(N, precision)` cache of twiddle factors, shared across undo/redo
/// and per-modification FFTs for one open file.
#[derive(Debug, Clone)]
pub struct TwiddleCache<F: Float> {
    n: usize,
    /// `e^{-2*pi*i*k/N}` for `k` in `[0, N/2)`, used by the radix-2 butterfly
    /// stages.
    fft_twiddles: Vec<Complex<F>>,
    /// `e^{-2*pi*i*k/(2N)}` for `k` in `[0, N/2)`, the `omega_{2N}^k` factor
    /// of the post-processing step.
    post_twiddles: Vec<Complex<F>>,
}

impl<F: Float + FloatConst> TwiddleCache<F> {
    /// Build the cache for transform length `n`. `n` must be a power of two
    /// with `n >= 4`.
    pub fn make(n: usize) -> Self {
        assert!(n.is_power_of_two() && n >= 4, "FFT length must be a power of two >= 4");

        let half = n / 2;
        let tau = F::PI() + F::PI();
        let fft_twiddles = (0..half)
            .map(|k| {
                let theta = -tau * F::from(k).unwrap() / F::from(n).unwrap();
                Complex::new(theta.cos(), theta.sin())
            })
            .collect();

        let post_twiddles = (0..half)
            .map(|k| {
                let theta = -F::PI() * F::from(k).unwrap() / F::from(n).unwrap();
                Complex::new(theta.cos(), theta.sin())
            })
            .collect();

        TwiddleCache { n, fft_twiddles, post_twiddles }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    fn post_twiddle(&self, k: usize) -> Complex<F> {
        self.post_twiddles[k]
    }
}

fn bit_reverse_permute<F: Float>(data: &mut [Complex<F>]) {
    let n = data.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

/// In-place iterative radix-2 Cooley-Tukey, decimation in time. `inverse`
/// conjugates the twiddles; normalization by `N` is the caller's job.
fn complex_fft_in_place<F: Float>(data: &mut [Complex<F>], twiddles: &[Complex<F>], inverse: bool) {
    let n = data.len();
    bit_reverse_permute(data);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = n / len;
        let mut start = 0;
        while start < n {
            for k in 0..half {
                let w = twiddles[k * step];
                let w = if inverse { w.conj() } else { w };
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
            start += len;
        }
        len <<= 1;
    }
}

/// Forward transform: pack `g`'s complex-interleaved real samples, compute
/// the length-`N` complex FFT, and overwrite in place with the first `N`
/// bins of `g`'s true (length `2N`) real spectrum.
///
/// `data.len()` must equal `cache.len()` exactly.
pub fn real_interleaved_fft<F: Float + FloatConst>(data: &mut [Complex<F>], cache: &TwiddleCache<F>) {
    assert_eq!(data.len(), cache.n);
    complex_fft_in_place(data, &cache.fft_twiddles, false);
    post_process_forward(data, cache);
}

/// Inverse transform: exact inverse of [`real_interleaved_fft`].
pub fn inverse_real_interleaved_fft<F: Float + FloatConst>(data: &mut [Complex<F>], cache: &TwiddleCache<F>) {
    assert_eq!(data.len(), cache.n);
    post_process_inverse(data, cache);
    complex_fft_in_place(data, &cache.fft_twiddles, true);
    let scale = F::one() / F::from(cache.n).unwrap();
    for v in data.iter_mut() {
        *v = *v * scale;
    }
}

/// TI SPRA291 packed-real-FFT post-processing:
///
/// `G[k] = (F[k] + F*[N-k])/2 - (i/2)(F[k] - F*[N-k]) * omega_{2N}^k`
///
/// `k=0` is self-paired (`N-k == k`): `F[0]` is already real-valued
/// (the packed FFT's DC term), and `G[0]`/`G[N/2]` share that one complex
/// slot as `(DC, Nyquist)` real pairs, so it packs `(sum, difference)`
/// directly rather than going through the general two-bin solve.
///
/// `k=N/2` is also self-paired, but is a different case: it is not packed
/// with anything, it is `G[N/2] = conj(F[N/2])` outright (the general
/// formula above degenerates to a pure conjugate once `F[k] = F[N-k]`).
fn post_process_forward<F: Float + FloatConst>(data: &mut [Complex<F>], cache: &TwiddleCache<F>) {
    let n = data.len();
    let half = n / 2;
    let original = data.to_vec();
    let two = F::from(2.0).unwrap();

    let boundary = |f: Complex<F>| -> Complex<F> {
        Complex::new((f.re + f.im), (f.re - f.im))
    };

    data[0] = boundary(original[0]);
    if half > 0 {
        data[half] = original[half].conj();
    }

    for k in 1..half {
        let j = n - k;
        let w = cache.post_twiddle(k);
        let fk = original[k];
        let fj_conj = original[j].conj();

        let ge = (fk + fj_conj) / two;
        let go = (fk - fj_conj) * Complex::new(F::zero(), -F::one() / two);

        data[k] = ge + go * w;
        // j's bin uses omega_{2N}^j = -conj(omega_{2N}^k); derive G[j]
        // directly rather than re-deriving Ge/Go.
        let w_j = -w.conj();
        let ge_j = (original[j] + original[k].conj()) / two;
        let go_j = (original[j] - original[k].conj()) * Complex::new(F::zero(), -F::one() / two);
        data[j] = ge_j + go_j * w_j;
    }
}

/// Exact algebraic inverse of [`post_process_forward`].
fn post_process_inverse<F: Float + FloatConst>(data: &mut [Complex<F>], cache: &TwiddleCache<F>) {
    let n = data.len();
    let half = n / 2;
    let original = data.to_vec();
    let two = F::from(2.0).unwrap();

    let unboundary = |g: Complex<F>| -> Complex<F> { Complex::new((g.re + g.im) / two, (g.re - g.im) / two) };

    data[0] = unboundary(original[0]);
    if half > 0 {
        data[half] = original[half].conj();
    }

    for k in 1..half {
        let j = n - k;
        let w = cache.post_twiddle(k);

        let p = Complex::new(F::one() / two, F::zero()) - Complex::new(F::zero(), F::one() / two) * w;
        let q = Complex::new(F::one() / two, F::zero()) + Complex::new(F::zero(), F::one() / two) * w;
        let det = Complex::new(F::zero(), -F::one()) * w;

        let gk = original[k];
        let gj_conj = original[j].conj();

        let a = (gk * p - gj_conj * q) / det;
        let c = (gj_conj * p - gk * q) / det;

        data[k] = a;
        data[j] = c.conj();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_inverse_is_identity() {
        let n = 8usize;
        let cache = TwiddleCache::<f64>::make(n);
        let original: Vec<Complex<f64>> =
            (0..n).map(|i| Complex::new((i as f64 * 0.37).sin(), (i as f64 * 0.61).cos())).collect();

        let mut data = original.clone();
        real_interleaved_fft(&mut data, &cache);
        inverse_real_interleaved_fft(&mut data, &cache);

        for (a, b) in data.iter().zip(original.iter()) {
            assert!((a.re - b.re).abs() < 1e-9, "{} vs {}", a.re, b.re);
            assert!((a.im - b.im).abs() < 1e-9, "{} vs {}", a.im, b.im);
        }
    }

    #[test]
    fn forward_then_inverse_is_identity_f32() {
        let n = 16usize;
        let cache = TwiddleCache::<f32>::make(n);
        let original: Vec<Complex<f32>> = (0..n).map(|i| Complex::new(i as f32, -(i as f32))).collect();

        let mut data = original.clone();
        real_interleaved_fft(&mut data, &cache);
        inverse_real_interleaved_fft(&mut data, &cache);

        for (a, b) in data.iter().zip(original.iter()) {
            assert!((a.re - b.re).abs() < 1e-2);
            assert!((a.im - b.im).abs() < 1e-2);
        }
    }

    #[test]
    fn dc_only_signal_transforms_without_panicking() {
        let n = 4usize;
        let cache = TwiddleCache::<f64>::make(n);
        let mut data = vec![Complex::new(1.0, 0.0); n];
        real_interleaved_fft(&mut data, &cache);
        inverse_real_interleaved_fft(&mut data, &cache);
        for v in &data {
            assert!((v.re - 1.0).abs() < 1e-9);
            assert!(v.im.abs() < 1e-9);
        }
    }
}
