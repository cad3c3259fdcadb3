/* ---------------------------------------------------------------------------------------------- */
/*                                             TRAITS                                             */
/* ---------------------------------------------------------------------------------------------- */

use std::fmt::Debug;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

use tap::Tap;

macro_rules! trait_alias {
	($vis:vis trait $name:ident {}, $($args:tt)*) => {
		$vis trait $name: $($args)+ {}
		impl<T> $name for T where T: $($args)+ {}
	};
}
trait_alias!(
    pub trait Number {},
    Copy
        + Debug
        + PartialOrd
        + Add<Output = Self>
        + Mul<Output = Self>
        + Sub<Output = Self>
        + Div<Output = Self>
        + NumberCommon
);

pub trait NumberCommon: Sized {
    /// Lowest value; negative infinity for floats.
    const MINVALUE: Self;

    /// Highest value; positive infinity for floats.
    const MAXVALUE: Self;

    fn to_f64(&self) -> f64;
    fn from_f64(value: f64) -> Self;

    /// `None` when the result does not fit. Floats never fail; they saturate to infinity.
    fn checked_add(&self, other: Self) -> Option<Self>;
    fn checked_sub(&self, other: Self) -> Option<Self>;

    fn one() -> Self;
    fn zero() -> Self;
}

pub trait Vector:
    Clone
    + Copy
    + Sized
    + Debug
    + Index<usize, Output = Self::Num>
    + IndexMut<usize, Output = Self::Num>
{
    type Num: Number;
    const D: AxisIndex;

    fn zero() -> Self;
    fn get(&self, i: AxisIndex) -> Self::Num;
    fn set(&mut self, i: AxisIndex, value: Self::Num);
}

pub type AxisIndex = usize;

/* -------------------------------------------- Exts -------------------------------------------- */

pub trait NumExt: Number {
    fn min_value(self, other: Self) -> Self {
        if self < other {
            self
        } else {
            other
        }
    }

    fn max_value(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }
}

impl<T: Number> NumExt for T {}

pub trait VectorExt: Vector {
    fn splat(value: Self::Num) -> Self {
        let mut v = Self::zero();
        for i in 0..Self::D {
            v.set(i, value);
        }
        v
    }

    fn minimum() -> Self {
        Self::splat(Self::Num::MINVALUE)
    }

    fn maximum() -> Self {
        Self::splat(Self::Num::MAXVALUE)
    }
}

impl<T: Vector> VectorExt for T {}

/* ------------------------------------------ Defaults ------------------------------------------ */

impl<T: Number, const D: usize> Vector for [T; D] {
    type Num = T;
    const D: AxisIndex = D;

    fn zero() -> Self {
        [T::zero(); D]
    }

    fn get(&self, i: AxisIndex) -> Self::Num {
        self[i]
    }

    fn set(&mut self, i: AxisIndex, value: Self::Num) {
        self[i] = value;
    }
}

#[doc(hidden)]
mod _impl_primitive {
    use super::NumberCommon;

    macro_rules! define_minmax {
        (@common $ty:ty) => {
            fn to_f64(&self) -> f64 {
                *self as f64
            }

            fn from_f64(value: f64) -> Self {
                value as Self
            }

            fn one() -> Self {
                1 as _
            }

            fn zero() -> Self {
                0 as _
            }
        };

        (int: $($ty:ty), *) => {
            $(impl NumberCommon for $ty {
                const MINVALUE: Self = Self::MIN;
                const MAXVALUE: Self = Self::MAX;

                define_minmax!(@common $ty);

                fn checked_add(&self, other: Self) -> Option<Self> {
                    <$ty>::checked_add(*self, other)
                }

                fn checked_sub(&self, other: Self) -> Option<Self> {
                    <$ty>::checked_sub(*self, other)
                }
            })*
        };

        (float: $($ty:ty), *) => {
            $(impl NumberCommon for $ty {
                const MINVALUE: Self = Self::NEG_INFINITY;
                const MAXVALUE: Self = Self::INFINITY;

                define_minmax!(@common $ty);

                fn checked_add(&self, other: Self) -> Option<Self> {
                    Some(*self + other)
                }

                fn checked_sub(&self, other: Self) -> Option<Self> {
                    Some(*self - other)
                }
            })*
        };
    }

    define_minmax!(int: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    define_minmax!(float: f32, f64);
}

/* ---------------------------------------------------------------------------------------------- */
/*                                         AABB RECTANGLE                                         */
/* ---------------------------------------------------------------------------------------------- */

/// Axis-aligned box, stored as one closed `[min, max]` range per axis.
///
/// A box whose `min` exceeds its `max` on any axis is *empty*. [`AabbRect::empty`] is the
/// canonical empty box, and serves as the identity of [`AabbRect::expand_to_contain`].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AabbRect<V: Vector> {
    min: V,
    max: V,
}

impl<V: Vector> PartialEq for AabbRect<V> {
    fn eq(&self, other: &Self) -> bool {
        (0..V::D).all(|i| self.min[i] == other.min[i] && self.max[i] == other.max[i])
    }
}

impl<V: Vector> AabbRect<V> {
    /// Creates a new `AabbRect` spanning two corner points.
    ///
    /// The corners are reordered per axis, so that the minimum values are less than or
    /// equal to the maximum values in each dimension.
    pub fn new(mut p1: V, mut p2: V) -> Self {
        for i in 0..V::D {
            let a = &mut p1[i];
            let b = &mut p2[i];

            if a > b {
                std::mem::swap(a, b);
            }
        }

        Self { min: p1, max: p2 }
    }

    /// Build the bounding square of a circle. A negative radius produces an inverted
    /// (empty) box, which insertion rejects as malformed.
    ///
    /// Integer coordinates must leave room for the radius on every axis; see
    /// [`AabbRect::try_new_circular`].
    pub fn new_circular(center: V, radius: V::Num) -> Self {
        let mut min = center;
        let mut max = center;

        for i in 0..V::D {
            min[i] = min[i] - radius;
            max[i] = max[i] + radius;
        }

        Self { min, max }
    }

    /// Same as [`AabbRect::new_circular`], but reports the first axis on which
    /// `center ± radius` does not fit the coordinate type.
    pub fn try_new_circular(center: V, radius: V::Num) -> Result<Self, AxisIndex> {
        let mut min = center;
        let mut max = center;

        for i in 0..V::D {
            min[i] = center[i].checked_sub(radius).ok_or(i)?;
            max[i] = center[i].checked_add(radius).ok_or(i)?;
        }

        Ok(Self { min, max })
    }

    /// Degenerate box covering a single point.
    pub fn point(p: V) -> Self {
        Self { min: p, max: p }
    }

    /// Accumulator with `min = MAXVALUE` and `max = MINVALUE` on every axis; `+∞`/`-∞` for
    /// float coordinates.
    pub fn empty() -> Self {
        Self {
            min: V::maximum(),
            max: V::minimum(),
        }
    }

    pub fn min(&self) -> &V {
        &self.min
    }

    pub fn max(&self) -> &V {
        &self.max
    }

    pub fn range(&self, axis: AxisIndex) -> (V::Num, V::Num) {
        (self.min[axis], self.max[axis])
    }

    pub fn is_empty(&self) -> bool {
        (0..V::D).any(|i| self.min[i] > self.max[i])
    }

    /// Returns the first axis whose range is inverted or not comparable (NaN).
    pub fn malformed_axis(&self) -> Option<AxisIndex> {
        (0..V::D).find(|&i| !(self.min[i] <= self.max[i]))
    }

    /// Grows each axis range to cover `other`. Returns whether anything changed.
    pub fn expand_to_contain(&mut self, other: &Self) -> bool {
        let mut modified = false;

        for i in 0..V::D {
            if self.min[i] > other.min[i] {
                self.min[i] = other.min[i];
                modified = true;
            }

            if self.max[i] < other.max[i] {
                self.max[i] = other.max[i];
                modified = true;
            }
        }

        modified
    }

    pub fn union(&self, other: &Self) -> Self {
        { *self }.tap_mut(|x| {
            x.expand_to_contain(other);
        })
    }

    /// Extent along `axis`; zero for an empty range.
    pub fn length(&self, axis: AxisIndex) -> f64 {
        (self.max[axis].to_f64() - self.min[axis].to_f64()).max(0.)
    }

    /// Sum of the per-axis extents.
    pub fn perimeter(&self) -> f64 {
        if self.is_empty() {
            return 0.;
        }

        (0..V::D).map(|i| self.length(i)).sum()
    }

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.;
        }

        (0..V::D).map(|i| self.length(i)).product()
    }

    pub fn contains(&self, other: &Self) -> bool {
        if self.is_empty() {
            return false;
        }

        (0..V::D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    pub fn contains_point(&self, point: &V) -> bool {
        (0..V::D).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    /// Closed-interval intersection test; boxes that merely touch overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        for i in 0..V::D {
            if self.min[i] > other.max[i] || other.min[i] > self.max[i] {
                return false;
            }
        }
        true
    }

    /// Measure of the intersection of both boxes.
    pub fn overlap_area(&self, other: &Self) -> f64 {
        let mut area = 1.;

        for i in 0..V::D {
            let lo = self.min[i].max_value(other.min[i]).to_f64();
            let hi = self.max[i].min_value(other.max[i]).to_f64();

            if hi <= lo {
                return 0.;
            }

            area *= hi - lo;
        }

        area
    }

    /// Growth of `area()` after expanding this box to cover `other`.
    pub fn enlargement(&self, other: &Self) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Squared euclidean distance between both centers. Only meant for ordering.
    pub fn distance(&self, other: &Self) -> f64 {
        (0..V::D)
            .map(|i| {
                let c1 = self.min[i].to_f64() + self.max[i].to_f64();
                let c2 = other.min[i].to_f64() + other.max[i].to_f64();
                let d = (c1 - c2) / 2.;
                d * d
            })
            .sum()
    }
}

#[cfg(test)]
mod __tests {
    use super::AabbRect;

    fn rect(x1: f64, x2: f64, y1: f64, y2: f64) -> AabbRect<[f64; 2]> {
        AabbRect::new([x1, y1], [x2, y2])
    }

    #[test]
    fn test_empty() {
        let empty = AabbRect::<[f64; 2]>::empty();
        let a = rect(0., 2., 1., 3.);

        assert!(empty.is_empty());
        assert!(!a.is_empty());
        assert_eq!(empty.area(), 0.);
        assert_eq!(empty.perimeter(), 0.);

        // Empty box contains and overlaps nothing.
        assert!(!empty.contains(&a));
        assert!(!empty.overlaps(&a));
        assert!(!a.overlaps(&empty));

        // Expanding into the empty accumulator yields the other box.
        let mut acc = AabbRect::empty();
        assert!(acc.expand_to_contain(&a));
        assert_eq!(acc, a);

        // .. and expanding by an empty box changes nothing.
        let mut b = a;
        assert!(!b.expand_to_contain(&empty));
        assert_eq!(b, a);
    }

    #[test]
    fn test_measures() {
        let a = rect(0., 4., 0., 2.);
        assert_eq!(a.perimeter(), 6.);
        assert_eq!(a.area(), 8.);

        let b = rect(3., 6., 1., 5.);
        assert_eq!(a.overlap_area(&b), 1.);
        assert_eq!(b.overlap_area(&a), 1.);

        // Touching boxes overlap, but have zero overlap area.
        let c = rect(4., 5., 0., 2.);
        assert!(a.overlaps(&c));
        assert_eq!(a.overlap_area(&c), 0.);

        // Disjoint
        let d = rect(10., 11., 10., 11.);
        assert!(!a.overlaps(&d));
        assert_eq!(a.overlap_area(&d), 0.);

        assert_eq!(a.enlargement(&b), 30. - 8.);
        assert_eq!(a.enlargement(&rect(1., 2., 1., 2.)), 0.);
    }

    #[test]
    fn test_contains() {
        let a = rect(0., 4., 0., 4.);
        let b = rect(1., 2., 1., 4.);

        assert!(a.contains(&b));
        assert!(!b.contains(&a));
        assert!(a.contains(&a));
        assert!(a.contains_point(&[4., 0.]));
        assert!(!a.contains_point(&[4.5, 0.]));
    }

    #[test]
    fn test_distance() {
        let a = rect(0., 2., 0., 2.);
        let b = rect(3., 5., 4., 6.);

        // Centers at (1, 1) and (4, 5)
        assert_eq!(a.distance(&b), 25.);
        assert_eq!(b.distance(&a), 25.);
        assert_eq!(a.distance(&a), 0.);
    }

    #[test]
    fn test_circular_and_malformed() {
        let c = AabbRect::new_circular([10., 20.], 2.);
        assert_eq!(c, rect(8., 12., 18., 22.));
        assert_eq!(c.malformed_axis(), None);

        let inverted = AabbRect::new_circular([0., 0.], -1.);
        assert_eq!(inverted.malformed_axis(), Some(0));

        let nan = AabbRect::point([0., f64::NAN]);
        assert_eq!(nan.malformed_axis(), Some(1));
    }

    #[test]
    fn test_integer_coordinates() {
        let a = AabbRect::new([0i32, 0], [10, 10]);
        let b = AabbRect::new([5i32, 5], [20, 20]);

        assert_eq!(a.overlap_area(&b), 25.);
        assert_eq!(a.union(&b), AabbRect::new([0, 0], [20, 20]));

        // Empty integer boxes must not overflow while measured.
        assert_eq!(AabbRect::<[i32; 2]>::empty().area(), 0.);
    }

    #[test]
    fn test_float_empty_is_infinite() {
        let empty = AabbRect::<[f64; 2]>::empty();
        assert_eq!(empty.min(), &[f64::INFINITY; 2]);
        assert_eq!(empty.max(), &[f64::NEG_INFINITY; 2]);

        // Unbounded payloads still accumulate.
        let wide = AabbRect::new([f64::NEG_INFINITY, 0.], [f64::INFINITY, 1.]);
        let mut acc = AabbRect::empty();
        acc.expand_to_contain(&rect(0., 1., 0., 1.));
        acc.expand_to_contain(&wide);
        assert_eq!(acc, wide);
        assert_eq!(acc.malformed_axis(), None);
    }

    #[test]
    fn test_checked_circular() {
        assert_eq!(
            AabbRect::try_new_circular([10i32, 20], 2),
            Ok(AabbRect::new([8, 18], [12, 22]))
        );

        // Would leave the coordinate range.
        assert_eq!(AabbRect::try_new_circular([0u32, 5], 1), Err(0));
        assert_eq!(AabbRect::try_new_circular([5u32, 0], 1), Err(1));
        assert_eq!(AabbRect::try_new_circular([0i8, i8::MAX], 1), Err(1));
        assert!(AabbRect::try_new_circular([1u32, 1], 1).is_ok());

        // Floats saturate instead.
        let huge = AabbRect::try_new_circular([f64::MAX, 0.], f64::MAX).unwrap();
        assert_eq!(huge.max()[0], f64::INFINITY);
    }
}
