//! Horn (1981) gradient and compass-aspect kernel.
//!
//! Computes the direction of steepest descent for one cell from its eight
//! immediate neighbours. The centre cell never enters the calculation.
//!
//! ```text
//!   a b c      NW N NE
//!   d . f      W  .  E
//!   g h i      SW S SE
//!
//!   dz/dx = ((c + 2f + i) - (a + 2d + g)) / 8
//!   dz/dy = ((g + 2h + i) - (a + 2b + c)) / 8
//! ```
//!
//! Row 0 of a grid is north, so `dz/dy` grows southward. The bearing is
//! measured clockwise from north: 0° = N, 90° = E, 180° = S, 270° = W.
//!
//! The same decision rule runs at two widths. The sequential evaluator uses
//! `f64`, the device kernel uses `f32`; `shaders/aspect.wgsl` is a line-by-line
//! copy of [`horn_aspect`] at `f32`.
//!
//! # References
//! - Horn, B.K.P. (1981). "Hill Shading and the Reflectance Map."
//!   Proceedings of the IEEE, 69(1), 14-47.
//! - Burrough, P.A. & `McDonnell`, R.A. (1998). Principles of Geographical
//!   Information Systems, p. 406.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Serialized value of a flat cell
pub const FLAT: f64 = -1.0;

/// Bearings above this are snapped to 0° so 360° is never emitted
pub const NEAR_FULL_CIRCLE: f64 = 359.999;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point width the kernel can run at
///
/// Only implemented for `f32` and `f64`. Thresholds are expressed at the
/// working width so the flat test and the 360° snap behave the same on every
/// backend.
pub trait KernelFloat:
    Copy
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
    + sealed::Sealed
{
    const ZERO: Self;
    const TWO: Self;
    const EIGHT: Self;
    const NINETY: Self;
    const FULL_CIRCLE: Self;
    const SNAP_THRESHOLD: Self;
    const FLAT: Self;
    const DEGREES_PER_RADIAN: Self;

    fn atan2(self, x: Self) -> Self;
}

macro_rules! impl_kernel_float {
    ($t:ty, $deg:expr) => {
        impl KernelFloat for $t {
            const ZERO: Self = 0.0;
            const TWO: Self = 2.0;
            const EIGHT: Self = 8.0;
            const NINETY: Self = 90.0;
            const FULL_CIRCLE: Self = 360.0;
            const SNAP_THRESHOLD: Self = 359.999;
            const FLAT: Self = -1.0;
            const DEGREES_PER_RADIAN: Self = $deg;

            #[inline(always)]
            fn atan2(self, x: Self) -> Self {
                <$t>::atan2(self, x)
            }
        }
    };
}

impl_kernel_float!(f64, 180.0 / std::f64::consts::PI);
// Same literal as the WGSL shader
impl_kernel_float!(f32, 57.29578);

/// The eight neighbours of a cell, named by compass position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood<T> {
    pub nw: T,
    pub n: T,
    pub ne: T,
    pub w: T,
    pub e: T,
    pub sw: T,
    pub s: T,
    pub se: T,
}

impl<T: Copy> Neighborhood<T> {
    /// Gather the ring around `(row, col)` from a row-major buffer
    ///
    /// The caller guarantees `(row, col)` is an interior cell.
    #[inline(always)]
    pub fn gather(data: &[T], cols: usize, row: usize, col: usize) -> Self {
        let up = (row - 1) * cols + col;
        let mid = row * cols + col;
        let down = (row + 1) * cols + col;
        Self {
            nw: data[up - 1],
            n: data[up],
            ne: data[up + 1],
            w: data[mid - 1],
            e: data[mid + 1],
            sw: data[down - 1],
            s: data[down],
            se: data[down + 1],
        }
    }

    /// Build from a 3×3 block given as rows (north row first)
    ///
    /// The centre value is ignored.
    pub fn from_block(block: [[T; 3]; 3]) -> Self {
        let [[nw, n, ne], [w, _, e], [sw, s, se]] = block;
        Self {
            nw,
            n,
            ne,
            w,
            e,
            sw,
            s,
            se,
        }
    }

    /// The same ring rotated a quarter turn clockwise
    ///
    /// Whatever was north now lies east.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        Self {
            nw: self.sw,
            n: self.w,
            ne: self.nw,
            w: self.s,
            e: self.n,
            sw: self.se,
            s: self.e,
            se: self.ne,
        }
    }
}

/// Horn partial derivatives `(dz/dx, dz/dy)` per unit cell
#[inline(always)]
pub fn horn_gradient<T: KernelFloat>(nb: &Neighborhood<T>) -> (T, T) {
    let dz_dx = ((nb.ne + T::TWO * nb.e + nb.se) - (nb.nw + T::TWO * nb.w + nb.sw)) / T::EIGHT;
    let dz_dy = ((nb.sw + T::TWO * nb.s + nb.se) - (nb.nw + T::TWO * nb.n + nb.ne)) / T::EIGHT;
    (dz_dx, dz_dy)
}

/// Result of the kernel for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aspect<T = f64> {
    /// Both partial derivatives are exactly zero; no downhill direction
    Flat,
    /// Compass bearing in `[0, 360)` (NaN only if a neighbour was NaN)
    Bearing(T),
}

impl<T: KernelFloat> Aspect<T> {
    /// Serialize to the grid convention: `-1.0` for flat, otherwise degrees
    #[inline(always)]
    pub fn to_value(self) -> T {
        match self {
            Self::Flat => T::FLAT,
            Self::Bearing(deg) => deg,
        }
    }

    #[must_use]
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }
}

/// Map a mathematical angle (degrees, counter-clockwise from east) to a
/// compass bearing, snapping values at the top of the range to 0°.
#[inline(always)]
pub fn compass_bearing<T: KernelFloat>(raw_deg: T) -> T {
    let bearing = if raw_deg < T::ZERO {
        T::NINETY - raw_deg
    } else if raw_deg > T::NINETY {
        T::FULL_CIRCLE - raw_deg + T::NINETY
    } else {
        T::NINETY - raw_deg
    };

    if bearing > T::SNAP_THRESHOLD {
        T::ZERO
    } else {
        bearing
    }
}

/// Aspect of the cell surrounded by `nb`
///
/// Flat is decided by exact equality with zero, before `atan2`, so the
/// undefined `atan2(0, 0)` never happens.
///
/// # Example
///
/// ```
/// use aspect_core::kernel::{horn_aspect, Aspect, Neighborhood};
///
/// // Rising to the north: the slope faces south
/// let nb = Neighborhood::from_block([
///     [30.0, 30.0, 30.0],
///     [20.0, 20.0, 20.0],
///     [10.0, 10.0, 10.0],
/// ]);
/// match horn_aspect(&nb) {
///     Aspect::Bearing(deg) => assert!((deg - 180.0_f64).abs() < 1e-9),
///     Aspect::Flat => unreachable!(),
/// }
/// ```
#[inline(always)]
pub fn horn_aspect<T: KernelFloat>(nb: &Neighborhood<T>) -> Aspect<T> {
    let (dz_dx, dz_dy) = horn_gradient(nb);

    if dz_dx == T::ZERO && dz_dy == T::ZERO {
        return Aspect::Flat;
    }

    let raw_deg = dz_dy.atan2(-dz_dx) * T::DEGREES_PER_RADIAN;
    Aspect::Bearing(compass_bearing(raw_deg))
}
