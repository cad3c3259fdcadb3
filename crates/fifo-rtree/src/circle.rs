use crate::error::InsertError;
use crate::primitive::{AabbRect, NumberCommon, Vector};
use crate::rtree::Element;

/// Reference payload; indexed through its bounding square.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "V: serde::Serialize, V::Num: serde::Serialize",
        deserialize = "V: serde::Deserialize<'de>, V::Num: serde::Deserialize<'de>"
    ))
)]
pub struct Circle<V: Vector = [f64; 2]> {
    pub center: V,
    pub radius: V::Num,
}

impl<V: Vector> Circle<V> {
    pub fn new(center: V, radius: V::Num) -> Self {
        Self { center, radius }
    }
}

impl Circle {
    /// Shorthand for the planar `f64` case.
    pub fn xyr(x: f64, y: f64, r: f64) -> Self {
        Self::new([x, y], r)
    }
}

impl<V: Vector> Element for Circle<V> {
    type Vector = V;

    fn bound(&self) -> AabbRect<V> {
        AabbRect::new_circular(self.center, self.radius)
    }

    fn validate(&self) -> Result<(), InsertError> {
        let radius = self.radius.to_f64();

        if !(radius >= 0.) {
            return Err(InsertError::NegativeRadius(radius));
        }

        AabbRect::try_new_circular(self.center, self.radius)
            .map(|_| ())
            .map_err(|axis| InsertError::BoundOverflow { axis })
    }
}

impl<V: Vector> Element for AabbRect<V> {
    type Vector = V;

    fn bound(&self) -> AabbRect<V> {
        *self
    }
}

#[cfg(test)]
mod __tests {
    use super::*;

    #[test]
    fn test_circle_bound() {
        let c = Circle::xyr(10., 10., 1.);
        assert_eq!(c.bound(), AabbRect::new([9., 9.], [11., 11.]));
        assert_eq!(c.validate(), Ok(()));

        // Zero radius degenerates into a point.
        let p = Circle::xyr(3., 4., 0.);
        assert_eq!(p.bound(), AabbRect::point([3., 4.]));
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_circle_rejects_bad_radius() {
        assert_eq!(
            Circle::xyr(0., 0., -1.).validate(),
            Err(InsertError::NegativeRadius(-1.))
        );
        assert!(Circle::xyr(0., 0., f64::NAN).validate().is_err());

        // Integer circles are validated the same way.
        assert!(Circle::new([0i32, 0], -3).validate().is_err());
        assert!(Circle::new([0i32, 0], 3).validate().is_ok());
    }

    #[test]
    fn test_circle_rejects_unrepresentable_bound() {
        assert_eq!(
            Circle::new([0u32, 5], 1).validate(),
            Err(InsertError::BoundOverflow { axis: 0 })
        );
        assert_eq!(
            Circle::new([3i8, i8::MIN + 1], 2).validate(),
            Err(InsertError::BoundOverflow { axis: 1 })
        );

        // Touching the limits is fine.
        assert!(Circle::new([1u32, 1], 1).validate().is_ok());
        assert!(Circle::new([i8::MAX - 2, 0], 2).validate().is_ok());

        // Floats saturate to infinity rather than overflow.
        assert!(Circle::new([f64::MAX, 0.], f64::MAX).validate().is_ok());
    }
}
