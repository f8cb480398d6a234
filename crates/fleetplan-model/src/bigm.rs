//! Big-M constants derived from variable bounds.
//!
//! A disjunction "indicator = 0 implies value ≤ threshold" becomes the linear
//! row `value − M·indicator ≤ threshold`. The tightest valid `M` is the
//! largest amount by which `value` can exceed the threshold, which follows
//! directly from the bounds of `value`.

/// A big-M constant for one linearized disjunction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigM(f64);

impl BigM {
    /// Derives `M` for "value ≤ threshold unless the indicator is set",
    /// where `value` lies in `bounds = (lower, upper)`.
    ///
    /// Returns `None` when `upper ≤ threshold`: the relation can never be
    /// violated and needs no row. Also returns `None` for an unbounded
    /// `upper`, for which no finite `M` exists.
    ///
    /// # Example
    ///
    /// ```
    /// use fleetplan_model::BigM;
    ///
    /// // Departure in [60, 240], deadline 180.
    /// assert_eq!(BigM::for_upper_threshold((60.0, 240.0), 180.0).map(|m| m.value()), Some(60.0));
    /// // Departure can never be late.
    /// assert_eq!(BigM::for_upper_threshold((60.0, 120.0), 180.0), None);
    /// ```
    pub fn for_upper_threshold(bounds: (f64, f64), threshold: f64) -> Option<Self> {
        let (_, upper) = bounds;
        let excess = upper - threshold;
        (excess.is_finite() && excess > 0.0).then_some(Self(excess))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns true if `value` satisfies the linearized row for the given indicator.
    pub fn admits(self, value: f64, threshold: f64, indicator: f64) -> bool {
        value - self.0 * indicator <= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tight_bound() {
        let m = BigM::for_upper_threshold((0.0, 300.0), 200.0).unwrap();
        assert_eq!(m.value(), 100.0);
        // Indicator off: only on-time values are admitted.
        assert!(m.admits(200.0, 200.0, 0.0));
        assert!(!m.admits(201.0, 200.0, 0.0));
        // Indicator on: every value within bounds is admitted.
        assert!(m.admits(300.0, 200.0, 1.0));
    }

    #[test]
    fn test_threshold_at_upper_bound() {
        assert_eq!(BigM::for_upper_threshold((0.0, 200.0), 200.0), None);
    }

    #[test]
    fn test_unbounded_rejected() {
        assert_eq!(BigM::for_upper_threshold((0.0, f64::INFINITY), 200.0), None);
    }
}
