//! Planar vector arithmetic shared by every stage of the solver.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Global coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// Both axes, X first.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Unit vector along this axis.
    #[must_use]
    pub fn unit(self) -> Vector {
        match self {
            Axis::X => Vector::UNIT_X,
            Axis::Y => Vector::UNIT_Y,
        }
    }

    /// Component of `vector` along this axis.
    #[must_use]
    pub fn component(self, vector: Vector) -> f64 {
        match self {
            Axis::X => vector.x,
            Axis::Y => vector.y,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Immutable two dimensional vector used for positions, loads and forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Component along the global X axis.
    pub x: f64,
    /// Component along the global Y axis.
    pub y: f64,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Vector = Vector::new(0.0, 0.0);
    /// Unit vector along the global X axis.
    pub const UNIT_X: Vector = Vector::new(1.0, 0.0);
    /// Unit vector along the global Y axis.
    pub const UNIT_Y: Vector = Vector::new(0.0, 1.0);

    /// Create a [`Vector`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product with `other`.
    #[must_use]
    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the cross product `self × other`.
    ///
    /// For a position `r` and a force `f`, `r.cross(f)` is the counter-clockwise
    /// moment of `f` about the origin.
    ///
    /// # Examples
    /// ```
    /// use trussolve::vector;
    ///
    /// let moment = vector(2.0, 0.0).cross(vector(0.0, -5.0));
    /// assert_eq!(moment, -10.0);
    /// ```
    #[must_use]
    pub fn cross(self, other: Vector) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Vector pointing the same way with the requested magnitude.
    ///
    /// A zero-length vector has no direction, so the zero vector is returned
    /// instead of propagating `NaN`.
    ///
    /// # Examples
    /// ```
    /// use trussolve::{vector, Vector};
    ///
    /// assert_eq!(vector(3.0, 4.0).with_length(10.0), vector(6.0, 8.0));
    /// assert_eq!(Vector::ZERO.with_length(1.0), Vector::ZERO);
    /// ```
    #[must_use]
    pub fn with_length(self, magnitude: f64) -> Self {
        let length = self.length();
        if length == 0.0 {
            return Self::ZERO;
        }
        self.scale(magnitude / length)
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    #[must_use]
    pub fn unit(self) -> Self {
        self.with_length(1.0)
    }

    /// Rotate by 90 degrees counter-clockwise.
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Copy with the component along `axis` replaced by `value`.
    #[must_use]
    pub fn with_component(self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => Self::new(value, self.y),
            Axis::Y => Self::new(self.x, value),
        }
    }

    /// Convert into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scale(rhs)
    }
}

impl std::iter::Sum for Vector {
    fn sum<I: Iterator<Item = Vector>>(iter: I) -> Vector {
        iter.fold(Vector::ZERO, Add::add)
    }
}

impl From<Vector2<f64>> for Vector {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Vector> for Vector2<f64> {
    fn from(value: Vector) -> Self {
        value.to_vector()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(precision) => write!(f, "<{:.*}, {:.*}>", precision, self.x, precision, self.y),
            None => write!(f, "<{}, {}>", self.x, self.y),
        }
    }
}

/// Convenience helper for creating [`Vector`] instances.
///
/// # Examples
/// ```
/// use trussolve::vector;
///
/// let load = vector(0.0, -10.0);
/// assert_eq!(load.y, -10.0);
/// ```
#[must_use]
pub const fn vector(x: f64, y: f64) -> Vector {
    Vector::new(x, y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn arithmetic_matches_components() {
        let a = vector(1.0, 2.0);
        let b = vector(-3.0, 0.5);
        assert_eq!(a + b, vector(-2.0, 2.5));
        assert_eq!(a - b, vector(4.0, 1.5));
        assert_eq!(-a, vector(-1.0, -2.0));
        assert_eq!(a * 2.0, vector(2.0, 4.0));
        assert_relative_eq!(a.dot(b), -2.0);
        assert_relative_eq!(a.cross(b), 6.5);
    }

    #[test]
    fn unit_vectors_have_unit_length() {
        let direction = vector(-5.0, 5.0).unit();
        assert_relative_eq!(direction.length(), 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(direction.x, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1.0e-12);
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        let unit = Vector::ZERO.unit();
        assert_eq!(unit, Vector::ZERO);
        assert!(!unit.x.is_nan());
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = vector(3.0, 4.0);
        assert_eq!(v.perpendicular(), vector(-4.0, 3.0));
        assert_relative_eq!(v.dot(v.perpendicular()), 0.0);
    }

    #[test]
    fn nalgebra_roundtrip() {
        let v = vector(0.1, -0.2);
        let algebraic: Vector2<f64> = v.into();
        assert_eq!(Vector::from(algebraic), v);
    }

    #[test]
    fn display_respects_precision() {
        assert_eq!(format!("{}", vector(1.0, -2.5)), "<1, -2.5>");
        assert_eq!(format!("{:.2}", vector(1.0, -2.5)), "<1.00, -2.50>");
    }
}
