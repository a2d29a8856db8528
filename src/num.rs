//! Tolerant floating-point comparisons.
//!
//! Every coordinate comparison in the sweep goes through these helpers: two
//! numbers closer than [`EPSILON`] are the same number, as far as we're
//! concerned.

/// The fixed tolerance for coordinate comparisons.
pub const EPSILON: f64 = 1e-9;

/// Are `a` and `b` equal, up to [`EPSILON`]?
#[inline(always)]
pub fn eq_eps(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Are `a` and `b` different by at least [`EPSILON`]?
#[inline(always)]
pub fn neq_eps(a: f64, b: f64) -> bool {
    !eq_eps(a, b)
}

/// Is `a` bigger than `b` by more than [`EPSILON`]?
#[inline(always)]
pub fn gt_eps(a: f64, b: f64) -> bool {
    a - b > EPSILON
}

/// Is `a` smaller than `b` by more than [`EPSILON`]?
#[inline(always)]
pub fn lt_eps(a: f64, b: f64) -> bool {
    b - a > EPSILON
}

/// A wrapper for `f64` that implements `Ord`.
///
/// This panics (in debug builds) when comparing NaNs instead of ordering them.
/// We validate our inputs up front, so a NaN showing up here is a bug.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheapOrderedFloat(f64);

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

// Now comes the fishy stuff.
impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        debug_assert!(!self.0.is_nan() && !other.0.is_nan());
        if self.0 < other.0 {
            std::cmp::Ordering::Less
        } else if self.0 > other.0 {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tolerance() {
        assert!(eq_eps(1.0, 1.0 + 1e-10));
        assert!(!eq_eps(1.0, 1.0 + 1e-8));
        assert!(gt_eps(1.0 + 1e-8, 1.0));
        assert!(!gt_eps(1.0 + 1e-10, 1.0));
        assert!(lt_eps(1.0, 1.0 + 1e-8));
        assert!(!lt_eps(1.0, 1.0 + 1e-10));
    }

    proptest! {
    #[test]
    fn comparisons_are_exclusive(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let count = [eq_eps(a, b), lt_eps(a, b), gt_eps(a, b)]
            .iter()
            .filter(|x| **x)
            .count();
        // The boundary case where |a - b| == EPSILON is neither equal nor ordered.
        prop_assert!(count <= 1);
        prop_assert_eq!(neq_eps(a, b), !eq_eps(a, b));
    }

    #[test]
    fn cheap_order_matches_f64(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let ord = CheapOrderedFloat::from(a).cmp(&CheapOrderedFloat::from(b));
        prop_assert_eq!(Some(ord), a.partial_cmp(&b));
    }
    }
}
