//! Typed byte and page quantities, so that page counts and byte counts can
//! never be mixed up in span arithmetic.

use crate::PAGE_SIZE;
use core::ops;

#[inline]
fn round_up_to(n: usize, divisor: usize) -> usize {
    invariant!(divisor > 0);
    (n + divisor - 1) / divisor
}

/// Convert a quantity into a coarser unit, rounding up.
pub trait RoundUpTo<T> {
    /// Round this quantity up to the nearest whole number of `T`.
    fn round_up_to(self) -> T;
}

macro_rules! define_unit_type {
    ( $(#[$attr:meta])* $name:ident ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl<T: Into<Self>> ops::Add<T> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: T) -> Self {
                $name(self.0 + rhs.into().0)
            }
        }

        impl<T: Into<Self>> ops::Sub<T> for $name {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: T) -> Self {
                $name(self.0 - rhs.into().0)
            }
        }
    };
}

define_unit_type! {
    /// A number of bytes.
    Bytes
}

define_unit_type! {
    /// A number of hardware pages (`PAGE_SIZE` bytes each).
    Pages
}

impl From<Pages> for Bytes {
    #[inline]
    fn from(pages: Pages) -> Bytes {
        Bytes(pages.0 * PAGE_SIZE.0)
    }
}

impl RoundUpTo<Pages> for Bytes {
    #[inline]
    fn round_up_to(self) -> Pages {
        Pages(round_up_to(self.0, PAGE_SIZE.0))
    }
}
