//! Line-item quantity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Larger than the storage column allows.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A positive item count.
///
/// ## Constraints
///
/// - At least 1. A line item never holds zero; removal is a separate operation.
/// - At most [`Quantity::MAX`] so it always fits a `PostgreSQL` `INTEGER`.
///
/// ```
/// use wardrobe_core::Quantity;
///
/// assert!(Quantity::try_from_i64(3).is_ok());
/// assert!(Quantity::try_from_i64(0).is_err());
/// assert!(Quantity::try_from_i64(-2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest representable quantity (`i32::MAX`).
    #[allow(clippy::cast_sign_loss)] // i32::MAX is positive
    pub const MAX: u32 = i32::MAX as u32;

    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Validate a signed count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for values below 1 and
    /// [`QuantityError::TooLarge`] above [`Quantity::MAX`].
    pub fn try_from_i64(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// Add two quantities, failing if the sum exceeds [`Quantity::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// The count as `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The count as `i32`, for storage.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // bounded by MAX
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_from_i64(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from_i64(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
