//! Fixed-point math utilities for deterministic simulation.
//!
//! Positions, speeds and probabilities use fixed-point arithmetic so the
//! same inputs produce bit-identical results on every platform.
//! Floating-point values only appear at the boundary, where host input is
//! converted with [`Vec3Fixed::checked_from_f64`].

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 3D vector. `y` is height; the ground plane is (x, z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (height).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Create a vector from whole-unit coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    /// Convert host floating-point coordinates into simulation space.
    ///
    /// Rejects NaN, infinities and values outside the fixed-point range.
    pub fn checked_from_f64(x: f64, y: f64, z: f64) -> Result<Self> {
        let invalid = |reason| GameError::InvalidPosition { x, y, z, reason };

        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(invalid("coordinates must be finite numbers"));
        }

        let convert = |v: f64| Fixed::checked_from_num(v);
        match (convert(x), convert(y), convert(z)) {
            (Some(x), Some(y), Some(z)) => Ok(Self::new(x, y, z)),
            _ => Err(invalid("coordinates out of range")),
        }
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Multiply every component by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Component-wise addition, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(other.x)?,
            self.y.checked_add(other.y)?,
            self.z.checked_add(other.z)?,
        ))
    }

    /// Component-wise subtraction, `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_sub(other.x)?,
            self.y.checked_sub(other.y)?,
            self.z.checked_sub(other.z)?,
        ))
    }

    /// Largest component magnitude and the vector divided by it.
    ///
    /// `None` for the zero vector or when a component is `Fixed::MIN`.
    fn unit_by_largest(self) -> Option<(Fixed, Self)> {
        let largest = self
            .x
            .checked_abs()?
            .max(self.y.checked_abs()?)
            .max(self.z.checked_abs()?);
        if largest == Fixed::ZERO {
            return None;
        }
        let unit = Self::new(self.x / largest, self.y / largest, self.z / largest);
        Some((largest, unit))
    }

    /// Euclidean length, `None` if it does not fit the fixed-point range.
    ///
    /// Components are scaled by the largest magnitude before squaring, so
    /// only the final length itself can overflow.
    #[must_use]
    pub fn checked_length(self) -> Option<Fixed> {
        if self == Self::ZERO {
            return Some(Fixed::ZERO);
        }
        let (largest, unit) = self.unit_by_largest()?;
        largest.checked_mul(fixed_sqrt(unit.dot(unit)))
    }

    /// Euclidean length, saturating at `Fixed::MAX`.
    #[must_use]
    pub fn length(self) -> Fixed {
        self.checked_length().unwrap_or(Fixed::MAX)
    }

    /// Distance to another point, saturating at `Fixed::MAX`.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        other.checked_sub(self).map_or(Fixed::MAX, Self::length)
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    ///
    /// Works for any representable vector, including ones whose length
    /// overflows.
    #[must_use]
    pub fn normalize(self) -> Self {
        let Some((_, unit)) = self.unit_by_largest() else {
            return Self::ZERO;
        };
        let len = fixed_sqrt(unit.dot(unit));
        Self::new(unit.x / len, unit.y / len, unit.z / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
///
/// Returns the largest representable value whose square does not exceed
/// `value`, so perfect squares come back exact.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = value.max(Fixed::ONE) + Fixed::DELTA;

    while high - low > Fixed::DELTA {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::fmt::Display for Vec3Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
