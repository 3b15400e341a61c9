//! Position scalars for byte addressing.
//!
//! Three flavors exist and mixing them without an explicit conversion is a
//! bug, so each is its own newtype:
//!
//! * [`Natural`]: what a client addresses, a zero-based index into the
//!   editable view, after the pending-edit overlay.
//! * [`Absolute`]: a byte offset into the backing file, after window
//!   translation but before the overlay.
//! * [`Relative`]: an unsigned byte delta, addable to a `Natural`.
//!
//! The only arithmetic provided is `N + R -> N`, `N - R -> N` and
//! `N - N -> R`. Absolutes deliberately support no arithmetic at all;
//! translation between the flavors happens in the constrained window.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Byte index into the editable view as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Natural(usize);

/// Byte offset into the raw backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Absolute(usize);

/// Unsigned distance between two positions of the same flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Relative(usize);

impl Natural {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Round down to the nearest multiple of `align` (block lookup).
    pub const fn align_down(self, align: usize) -> Self {
        Self(self.0 - (self.0 % align))
    }
}

impl Absolute {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Relative {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Add<Relative> for Natural {
    type Output = Natural;

    fn add(self, rhs: Relative) -> Natural {
        Natural(self.0 + rhs.0)
    }
}

impl AddAssign<Relative> for Natural {
    fn add_assign(&mut self, rhs: Relative) {
        self.0 += rhs.0;
    }
}

impl Sub<Relative> for Natural {
    type Output = Natural;

    fn sub(self, rhs: Relative) -> Natural {
        Natural(self.0 - rhs.0)
    }
}

impl Sub<Natural> for Natural {
    type Output = Relative;

    fn sub(self, rhs: Natural) -> Relative {
        Relative(self.0 - rhs.0)
    }
}

impl fmt::Display for Natural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for Absolute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for Relative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_relative_arithmetic() {
        let n = Natural::new(10);
        assert_eq!(n + Relative::new(5), Natural::new(15));
        assert_eq!(n - Relative::new(3), Natural::new(7));
        assert_eq!(Natural::new(12) - n, Relative::new(2));
    }

    #[test]
    fn add_assign_advances() {
        let mut n = Natural::new(0);
        n += Relative::new(4);
        n += Relative::new(1);
        assert_eq!(n, Natural::new(5));
    }

    #[test]
    fn align_down_rounds_to_block_start() {
        assert_eq!(Natural::new(0).align_down(1024), Natural::new(0));
        assert_eq!(Natural::new(1023).align_down(1024), Natural::new(0));
        assert_eq!(Natural::new(1024).align_down(1024), Natural::new(1024));
        assert_eq!(Natural::new(2500).align_down(1024), Natural::new(2048));
    }
}
