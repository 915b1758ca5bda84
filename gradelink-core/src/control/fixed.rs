//! Fixed-point arithmetic for the PID policy
//!
//! Q16.16 format. The Cortex-M3 target has no FPU, and gains are configured
//! as integers scaled by 100.

use core::ops::Neg;

/// Q16.16 fixed-point number
///
/// Range: approximately -32768.0 to +32767.99998
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed32(pub i32);

impl Fixed32 {
    pub const ZERO: Self = Self(0);

    pub const FRAC_BITS: u32 = 16;

    /// Create from a whole number
    #[inline]
    pub const fn from_int(n: i16) -> Self {
        Self((n as i32) << Self::FRAC_BITS)
    }

    /// Create from a scaled integer (value × 100), e.g. a gain of 0.55 as 55
    #[inline]
    pub const fn from_scaled_100(n: i16) -> Self {
        Self(((n as i32) << Self::FRAC_BITS) / 100)
    }

    /// Round toward zero to a whole number
    #[inline]
    pub const fn to_int(self) -> i32 {
        if self.0 < 0 {
            -((-(self.0 as i64)) >> Self::FRAC_BITS) as i32
        } else {
            self.0 >> Self::FRAC_BITS
        }
    }

    /// Convert to scaled integer (value × 100)
    #[inline]
    pub const fn to_scaled_100(self) -> i32 {
        ((self.0 as i64 * 100) >> Self::FRAC_BITS) as i32
    }

    /// Multiply, saturating on overflow
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: Self) -> Self {
        let result = ((self.0 as i64) * (other.0 as i64)) >> Self::FRAC_BITS;
        Self(result.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    #[inline]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }
}

impl Neg for Fixed32 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}
