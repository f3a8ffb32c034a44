//! Valid-area rectangle derived from the device axes and border percentages.

use super::{AxisRange, Borders};

/// Closed interval `[lo, hi]`; an inverted interval contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub lo: i64,
    pub hi: i64,
}

impl Span {
    const EMPTY: Span = Span { lo: 1, hi: 0 };

    pub fn contains(&self, v: i64) -> bool {
        self.lo <= v && v <= self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Shrinks `[lo, hi]` by `lo_perc`% and `hi_perc`% of its length,
    /// truncating toward zero like the device's integer space.
    fn inset(lo: i64, hi: i64, lo_perc: i32, hi_perc: i32) -> Span {
        if !Borders::in_range(lo_perc) || !Borders::in_range(hi_perc) {
            return Span::EMPTY;
        }
        let range = hi - lo;
        Span {
            lo: lo + i64::from(lo_perc) * range / 100,
            hi: hi - i64::from(hi_perc) * range / 100,
        }
    }
}

/// Y is compared negated: the physical top of a touchpad reports the
/// minimum raw Y, so `top`/`bottom` live in `-Y` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidZone {
    pub x: Span,
    pub y: Span,
}

impl ValidZone {
    pub fn new(x: AxisRange, y: AxisRange, borders: Borders) -> Self {
        let dev_left = i64::from(x.min);
        let dev_right = i64::from(x.max);
        let dev_top = -i64::from(y.min);
        let dev_bottom = -i64::from(y.max);

        Self {
            x: Span::inset(dev_left, dev_right, borders.left, borders.right),
            y: Span::inset(dev_bottom, dev_top, borders.bottom, borders.top),
        }
    }

    pub fn inside(&self, x: i32, y: i32) -> bool {
        self.x.contains(i64::from(x)) && self.y.contains(-i64::from(y))
    }

    pub fn left(&self) -> i64 {
        self.x.lo
    }
    pub fn right(&self) -> i64 {
        self.x.hi
    }
    pub fn top(&self) -> i64 {
        self.y.hi
    }
    pub fn bottom(&self) -> i64 {
        self.y.lo
    }
}

impl std::fmt::Display for ValidZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.x.is_empty() || self.y.is_empty() {
            return write!(f, "empty (every contact is outside)");
        }
        // back in raw device Y for humans
        write!(
            f,
            "x=[{}, {}] y=[{}, {}]",
            self.left(),
            self.right(),
            -self.top(),
            -self.bottom()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(borders: Borders) -> ValidZone {
        let axis = AxisRange { min: 0, max: 1000 };
        ValidZone::new(axis, axis, borders)
    }

    #[test]
    fn resolves_reference_layout() {
        let zone = square(Borders::new(10, 10, 0, 15));
        assert_eq!((zone.left(), zone.right()), (100, 900));
        // raw Y in [0, 850] once the inversion is undone
        assert_eq!((zone.top(), zone.bottom()), (0, -850));

        assert_eq!(zone.to_string(), "x=[100, 900] y=[0, 850]");

        assert!(!zone.inside(50, 500));
        assert!(zone.inside(500, 500));
        assert!(zone.inside(100, 850));
        assert!(!zone.inside(100, 851));
        assert!(zone.inside(900, 0));
        assert!(!zone.inside(901, 0));
    }

    #[test]
    fn center_in_corners_out() {
        for borders in [
            Borders::new(1, 1, 1, 1),
            Borders::new(10, 10, 0, 15),
            Borders::new(49, 50, 30, 20),
            Borders::new(0, 30, 20, 0),
        ] {
            let zone = square(borders);
            assert!(zone.inside(500, 500), "{borders:?}");
            if borders.left > 0 {
                assert!(!zone.inside(0, 500), "{borders:?}");
            }
            if borders.right > 0 {
                assert!(!zone.inside(1000, 500), "{borders:?}");
            }
            if borders.top > 0 {
                assert!(!zone.inside(500, 0), "{borders:?}");
            }
            if borders.bottom > 0 {
                assert!(!zone.inside(500, 1000), "{borders:?}");
            }
        }
    }

    #[test]
    fn offset_axes_use_their_own_range() {
        let x = AxisRange { min: -500, max: 500 };
        let y = AxisRange { min: 100, max: 300 };
        let zone = ValidZone::new(x, y, Borders::new(10, 10, 50, 0));
        assert_eq!((zone.left(), zone.right()), (-400, 400));
        // top half of Y is cropped: raw [200, 300] survives
        assert!(!zone.inside(0, 199));
        assert!(zone.inside(0, 200));
        assert!(zone.inside(0, 300));
    }

    #[test]
    fn overlapping_borders_reject_everything() {
        let zone = square(Borders::new(60, 60, 0, 0));
        assert!(zone.x.is_empty());
        assert_eq!(zone.to_string(), "empty (every contact is outside)");
        for x in [0, 400, 500, 600, 1000] {
            assert!(!zone.inside(x, 500));
        }
    }

    #[test]
    fn borders_summing_to_full_range_leave_one_line() {
        let zone = square(Borders::new(50, 50, 0, 0));
        assert!(zone.inside(500, 500));
        assert!(!zone.inside(499, 500));
    }

    #[test]
    fn out_of_range_percentages_degrade_that_axis() {
        let zone = square(Borders::new(-5, 10, 0, 0));
        assert!(zone.x.is_empty());
        assert!(!zone.y.is_empty());
        assert!(!zone.inside(500, 500));

        let zone = square(Borders::new(0, 0, 101, 0));
        assert!(zone.y.is_empty());
        assert!(!zone.inside(500, 500));
    }

    #[test]
    fn extreme_axis_values_do_not_overflow() {
        let axis = AxisRange {
            min: i32::MIN,
            max: i32::MAX,
        };
        let zone = ValidZone::new(axis, axis, Borders::new(10, 10, 10, 10));
        assert!(zone.inside(0, 0));
        assert!(!zone.inside(i32::MIN, 0));
        assert!(!zone.inside(0, i32::MAX));
    }
}
