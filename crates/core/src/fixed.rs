//! Fixed-point decimal values for order quantities and prices
//!
//! Exchange APIs want numeric fields as canonical decimal strings. `Fixed`
//! keeps the exact decimal the caller supplied and always renders it in
//! plain positional notation, never scientific.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Mul;
use std::str::FromStr;

/// Fixed-point decimal type for exact order quantities and prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed {
    value: Decimal,
}

impl Fixed {
    /// Zero value
    pub const ZERO: Fixed = Fixed {
        value: Decimal::ZERO,
    };

    /// Create a Fixed from an integer
    pub fn from_i64(value: i64) -> Self {
        Fixed {
            value: Decimal::from(value),
        }
    }

    /// Parse a decimal string, accepting plain (`0.0001`) and scientific
    /// (`1e-4`) notation. Digits beyond what a `Decimal` can hold are an
    /// error, never rounded away.
    pub fn from_str_exact(s: &str) -> Result<Self, FixedError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FixedError::InvalidValue(s.to_string()));
        }

        let value = match Decimal::from_str_exact(trimmed) {
            Ok(d) => d,
            Err(_) if trimmed.contains(['e', 'E']) => parse_scientific(trimmed)
                .ok_or_else(|| FixedError::InvalidValue(s.to_string()))?,
            Err(_) => return Err(FixedError::InvalidValue(s.to_string())),
        };

        Ok(Fixed { value })
    }

    /// Render for transmission: positional notation, scale preserved.
    pub fn to_wire_string(&self) -> String {
        self.value.to_string()
    }

    /// Strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// Round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Fixed {
            value: self.value.round_dp(dp),
        }
    }
}

/// `1.5e-3` style input. The mantissa is parsed exactly and the exponent
/// only moves the decimal point; anything that would need rounding fails.
fn parse_scientific(s: &str) -> Option<Decimal> {
    let (mantissa, exponent) = s.split_once(['e', 'E'])?;
    let mut value = Decimal::from_str_exact(mantissa).ok()?;
    let exponent: i32 = exponent.parse().ok()?;

    if exponent < 0 {
        let scale = value.scale().checked_add(exponent.unsigned_abs())?;
        value.set_scale(scale).ok()?;
    } else {
        for _ in 0..exponent {
            value = value.checked_mul(Decimal::TEN)?;
        }
    }
    Some(value)
}

/// Fixed-point parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    #[error("Invalid decimal value: {0:?}")]
    InvalidValue(String),
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value * rhs.value,
        }
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Fixed {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_exact(s)
    }
}

/// Convenience macro for creating Fixed values in tests and examples
#[macro_export]
macro_rules! fixed {
    ($value:expr) => {
        $crate::fixed::Fixed::from_str_exact(stringify!($value)).unwrap()
    };
}
