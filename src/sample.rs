//! The element-precision capability set this codec's FFT, min/max, and
//! modification engine are generic over: `{add, mul, conj, abs, arg, zero,
//! one, to_real_parts}` with four variants.
//!
//! [`PcmSample`] bounds a `Sample` trait to `dasp_sample`'s fixed-point/
//! float conversions for the codec's PCM quantization step. `SampleElement`
//! is the generic element a [`crate::sampled_function::SampledFunction`]
//! is built over, covering both the real and complex-interleaved domains.

use std::fmt::Debug;

use num_complex::Complex;
use num_traits::{One, Zero};

pub use dasp_sample::I24;
use dasp_sample::Duplex;

/// A sample precision the codec can read/write as PCM.
pub trait PcmSample:
    dasp_sample::Sample + Duplex<u8> + Duplex<i16> + Duplex<I24> + Duplex<i32> + Duplex<f32>
{
}

impl PcmSample for u8 {}
impl PcmSample for i16 {}
impl PcmSample for I24 {}
impl PcmSample for i32 {}
impl PcmSample for f32 {}

/// Precision tag distinguishing the four [`SampleElement`] instantiations,
/// runtime-inspectable where the static type parameter isn't available.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleType {
    RealFloat32,
    RealFloat64,
    ComplexFloat32,
    ComplexFloat64,
}

/// The capability set a [`crate::sampled_function::SampledFunction`]'s
/// element must provide: additive/multiplicative identity, the arithmetic
/// the FFT and modification engine need, and a real-part decomposition used
/// by `GetMin`/`GetMax` and the complex-as-real aliasing view.
pub trait SampleElement: Copy + Clone + Debug + Default + PartialEq + 'static {
    /// The tag identifying this instantiation.
    const TYPE: SampleType;

    fn zero() -> Self;
    fn one() -> Self;
    fn add(self, rhs: Self) -> Self;
    fn mul_real(self, scalar: f64) -> Self;
    fn mul(self, rhs: Self) -> Self;

    /// Complex conjugate; the identity for a real element.
    fn conj(self) -> Self;

    /// Magnitude, used to order samples for `GetMin`/`GetMax` regardless of
    /// element type.
    fn magnitude(self) -> f64;

    /// Phase angle in radians; `0` for a non-negative real element, `π` for
    /// a negative one.
    fn arg(self) -> f64;

    /// Construct a unit-magnitude element at the given phase, used to
    /// reapply an `Add` modification's argument-preserving rule.
    fn from_polar(magnitude: f64, phase: f64) -> Self;

    /// Decompose into `(real, imaginary)` parts; `imaginary` is always `0`
    /// for a real element.
    fn to_real_parts(self) -> (f64, f64);

    /// Construct from `(real, imaginary)` parts, truncating the imaginary
    /// part for a real element.
    fn from_real_parts(real: f64, imaginary: f64) -> Self;
}

impl SampleElement for f32 {
    const TYPE: SampleType = SampleType::RealFloat32;

    fn zero() -> Self {
        Zero::zero()
    }
    fn one() -> Self {
        One::one()
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn mul_real(self, scalar: f64) -> Self {
        self * scalar as f32
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn conj(self) -> Self {
        self
    }
    fn magnitude(self) -> f64 {
        self.abs() as f64
    }
    fn arg(self) -> f64 {
        if self < 0.0 {
            std::f64::consts::PI
        } else {
            0.0
        }
    }
    fn from_polar(magnitude: f64, phase: f64) -> Self {
        (magnitude * phase.cos()) as f32
    }
    fn to_real_parts(self) -> (f64, f64) {
        (self as f64, 0.0)
    }
    fn from_real_parts(real: f64, _imaginary: f64) -> Self {
        real as f32
    }
}

impl SampleElement for f64 {
    const TYPE: SampleType = SampleType::RealFloat64;

    fn zero() -> Self {
        Zero::zero()
    }
    fn one() -> Self {
        One::one()
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn mul_real(self, scalar: f64) -> Self {
        self * scalar
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn conj(self) -> Self {
        self
    }
    fn magnitude(self) -> f64 {
        self.abs()
    }
    fn arg(self) -> f64 {
        if self < 0.0 {
            std::f64::consts::PI
        } else {
            0.0
        }
    }
    fn from_polar(magnitude: f64, phase: f64) -> Self {
        magnitude * phase.cos()
    }
    fn to_real_parts(self) -> (f64, f64) {
        (self, 0.0)
    }
    fn from_real_parts(real: f64, _imaginary: f64) -> Self {
        real
    }
}

impl SampleElement for Complex<f32> {
    const TYPE: SampleType = SampleType::ComplexFloat32;

    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }
    fn one() -> Self {
        Complex::new(1.0, 0.0)
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn mul_real(self, scalar: f64) -> Self {
        self * (scalar as f32)
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn conj(self) -> Self {
        Complex::conj(&self)
    }
    fn magnitude(self) -> f64 {
        self.norm() as f64
    }
    fn arg(self) -> f64 {
        Complex::arg(&self) as f64
    }
    fn from_polar(magnitude: f64, phase: f64) -> Self {
        Complex::from_polar(magnitude as f32, phase as f32)
    }
    fn to_real_parts(self) -> (f64, f64) {
        (self.re as f64, self.im as f64)
    }
    fn from_real_parts(real: f64, imaginary: f64) -> Self {
        Complex::new(real as f32, imaginary as f32)
    }
}

impl SampleElement for Complex<f64> {
    const TYPE: SampleType = SampleType::ComplexFloat64;

    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }
    fn one() -> Self {
        Complex::new(1.0, 0.0)
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn mul_real(self, scalar: f64) -> Self {
        self * scalar
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
    fn conj(self) -> Self {
        Complex::conj(&self)
    }
    fn magnitude(self) -> f64 {
        self.norm()
    }
    fn arg(self) -> f64 {
        Complex::arg(&self)
    }
    fn from_polar(magnitude: f64, phase: f64) -> Self {
        Complex::from_polar(magnitude, phase)
    }
    fn to_real_parts(self) -> (f64, f64) {
        (self.re, self.im)
    }
    fn from_real_parts(real: f64, imaginary: f64) -> Self {
        Complex::new(real, imaginary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_arg_is_zero_or_pi() {
        assert_eq!(SampleElement::arg(1.0f64), 0.0);
        assert_eq!(SampleElement::arg(-1.0f64), std::f64::consts::PI);
    }

    #[test]
    fn complex_round_trips_through_real_parts() {
        let c = Complex::new(3.0f64, 4.0f64);
        assert_eq!(SampleElement::magnitude(c), 5.0);
        let (re, im) = SampleElement::to_real_parts(c);
        assert_eq!(Complex::from_real_parts(re, im), c);
    }

    #[test]
    fn from_polar_preserves_magnitude() {
        let c: Complex<f64> = SampleElement::from_polar(2.0, std::f64::consts::FRAC_PI_4);
        assert!((SampleElement::magnitude(c) - 2.0).abs() < 1e-9);
    }
}
