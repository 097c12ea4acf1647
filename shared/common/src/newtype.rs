use crate::*;
use derive_more::Deref;
use num_traits::clamp;
use std::ops::{Mul, Sub, SubAssign};

#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Debug, Deref)]
pub struct NormalizedFloat(f64);

impl NormalizedFloat {
    pub fn new(f: f64) -> Self {
        debug_assert!(
            f >= 0.0 && f <= 1.0,
            "{} out of range for normalized float",
            f
        );
        Self(f)
    }

    pub const fn zero() -> Self {
        Self(0.0)
    }
    pub const fn one() -> Self {
        Self(1.0)
    }

    pub fn clamped(f: f64) -> Self {
        Self(clamp(f, 0.0, 1.0))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl From<NormalizedFloat> for f64 {
    fn from(f: NormalizedFloat) -> Self {
        f.0
    }
}

impl SubAssign<f64> for NormalizedFloat {
    fn sub_assign(&mut self, rhs: f64) {
        *self = Self::clamped(self.0 - rhs)
    }
}

impl Sub<NormalizedFloat> for NormalizedFloat {
    type Output = Self;

    fn sub(self, rhs: NormalizedFloat) -> Self::Output {
        Self::clamped(self.0 - rhs.0)
    }
}

impl Mul<Self> for NormalizedFloat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        // both are normalized already
        Self(self.0 * rhs.0)
    }
}
