//! Numeric abstraction shared by every processor.

/*
Scalar and Vector Samples
=========================

Every processor in this crate is generic over its sample type. A plain `f32`
or `f64` carries one audio sample; a `wide::f64x4` carries four independent
"lanes" (four voices, four bands, or four oversampled phases) that are pushed
through the same recurrence at once.

The trait keeps the arithmetic surface small:

  add / sub / mul / neg     via the std operator traits
  splat                     broadcast a scalar coefficient to every lane
  lane / from_fn            per-lane access, used where lanes must diverge
                            (per-lane fractional delay)
  reduce_add / reduce_max   horizontal reductions

Coefficients (g, h, R2, gains) are computed once in f64 and splatted, so the
per-sample loops only ever see `Sample` arithmetic.
*/

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use wide::f64x4;

pub trait Sample:
    Copy
    + Default
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Number of independent values carried by one sample.
    const LANES: usize;

    /// Broadcast a scalar to every lane.
    fn splat(value: f64) -> Self;

    /// Read one lane as `f64`.
    fn lane(self, index: usize) -> f64;

    /// Build a sample lane by lane.
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self;

    #[inline]
    fn zero() -> Self {
        Self::default()
    }

    #[inline]
    fn reduce_add(self) -> f64 {
        (0..Self::LANES).map(|i| self.lane(i)).sum()
    }

    #[inline]
    fn reduce_max(self) -> f64 {
        (0..Self::LANES)
            .map(|i| self.lane(i))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lane-wise clamp into `[lo, hi]`.
    #[inline]
    fn clamp_lanes(self, lo: f64, hi: f64) -> Self {
        Self::from_fn(|i| self.lane(i).clamp(lo, hi))
    }

    /// True if any lane is NaN.
    #[inline]
    fn is_nan(self) -> bool {
        (0..Self::LANES).any(|i| self.lane(i).is_nan())
    }

    /// Scale by a scalar gain.
    #[inline]
    fn scale(self, gain: f64) -> Self {
        self * Self::splat(gain)
    }
}

/// Rational tanh approximation (7th-order Padé), lane-wise.
///
/// Within 1e-5 of `tanh` for `|x| < 2`; diverges beyond about 4, so clamp
/// first if the input is unbounded.
#[inline]
pub fn fast_tanh<T: Sample>(x: T) -> T {
    let x2 = x * x;
    let num = x * (T::splat(135_135.0) + x2 * (T::splat(17_325.0) + x2 * (T::splat(378.0) + x2)));
    let den = T::splat(135_135.0)
        + x2 * (T::splat(62_370.0) + x2 * (T::splat(3_150.0) + x2 * T::splat(28.0)));
    num / den
}

impl Sample for f32 {
    const LANES: usize = 1;

    #[inline]
    fn splat(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn lane(self, _index: usize) -> f64 {
        self as f64
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0) as f32
    }

    #[inline]
    fn reduce_add(self) -> f64 {
        self as f64
    }

    #[inline]
    fn reduce_max(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    const LANES: usize = 1;

    #[inline]
    fn splat(value: f64) -> Self {
        value
    }

    #[inline]
    fn lane(self, _index: usize) -> f64 {
        self
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0)
    }

    #[inline]
    fn reduce_add(self) -> f64 {
        self
    }

    #[inline]
    fn reduce_max(self) -> f64 {
        self
    }
}

impl Sample for f64x4 {
    const LANES: usize = 4;

    #[inline]
    fn splat(value: f64) -> Self {
        f64x4::splat(value)
    }

    #[inline]
    fn lane(self, index: usize) -> f64 {
        self.to_array()[index]
    }

    #[inline]
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        f64x4::from(std::array::from_fn::<f64, 4, _>(f))
    }

    #[inline]
    fn reduce_add(self) -> f64 {
        self.to_array().iter().sum()
    }
}
