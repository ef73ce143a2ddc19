//! Index wheels for offset cuts.
//!
//! Offset cuts quantize their phase to a physical 24- or 35-hole index
//! wheel. The wheel is chosen by the repeat count: repeats of 1, 5, and 7
//! divide 35; everything else uses the 24-hole wheel.

use serde::{Deserialize, Serialize};

/// A physical indexing wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexWheel {
    /// The 24-hole wheel (repeats 2, 3, 4, 6, 8, 12, 24, ...).
    Holes24,
    /// The 35-hole wheel (repeats 1, 5, 7, 35).
    Holes35,
}

impl IndexWheel {
    /// The wheel serving a given repeat count.
    pub fn for_repeat(repeat: u32) -> Self {
        match repeat {
            1 | 5 | 7 => IndexWheel::Holes35,
            _ => IndexWheel::Holes24,
        }
    }

    /// Number of holes.
    pub fn holes(&self) -> u32 {
        match self {
            IndexWheel::Holes24 => 24,
            IndexWheel::Holes35 => 35,
        }
    }

    /// Angular spacing of adjacent holes, in degrees.
    pub fn hole_spacing(&self) -> f64 {
        360.0 / self.holes() as f64
    }

    /// Whether an index offset is usable at the given repeat.
    ///
    /// The offset must stay within one repeat's worth of holes. Negative
    /// offsets are normalized modulo the hole count before the check, so a
    /// `-1` offset on a 24-hole wheel is the same hole as `23`.
    pub fn valid_offset(&self, repeat: u32, offset: i32) -> bool {
        if repeat == 0 {
            return false;
        }
        let normalized = self.normalize_offset(offset);
        normalized < self.holes() / repeat.min(self.holes())
    }

    /// An offset reduced into `0..holes`.
    pub fn normalize_offset(&self, offset: i32) -> u32 {
        let holes = self.holes() as i32;
        (((offset % holes) + holes) % holes) as u32
    }

    /// Phase rotation in degrees contributed by an index offset.
    pub fn offset_degrees(&self, offset: i32) -> f64 {
        self.normalize_offset(offset) as f64 * self.hole_spacing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_selection_by_repeat() {
        assert_eq!(IndexWheel::for_repeat(1), IndexWheel::Holes35);
        assert_eq!(IndexWheel::for_repeat(5), IndexWheel::Holes35);
        assert_eq!(IndexWheel::for_repeat(7), IndexWheel::Holes35);
        assert_eq!(IndexWheel::for_repeat(4), IndexWheel::Holes24);
        assert_eq!(IndexWheel::for_repeat(6), IndexWheel::Holes24);
    }

    #[test]
    fn test_valid_offset_bounded_by_holes_per_repeat() {
        let wheel = IndexWheel::for_repeat(6);
        // 24 holes / 6 repeats = 4 holes per repeat; offsets 0..3 fit.
        assert!(wheel.valid_offset(6, 0));
        assert!(wheel.valid_offset(6, 3));
        assert!(!wheel.valid_offset(6, 4));
    }

    #[test]
    fn test_negative_offsets_normalize() {
        let wheel = IndexWheel::Holes24;
        assert_eq!(wheel.normalize_offset(-1), 23);
        assert_eq!(wheel.normalize_offset(-25), 23);
        assert_eq!(wheel.normalize_offset(24), 0);
        // A normalized negative offset lands outside one repeat's span.
        assert!(!wheel.valid_offset(6, -1));
    }

    #[test]
    fn test_offset_degrees() {
        let wheel = IndexWheel::Holes24;
        assert_eq!(wheel.offset_degrees(2), 30.0);
        let wheel35 = IndexWheel::Holes35;
        assert!((wheel35.offset_degrees(7) - 72.0).abs() < 1e-12);
    }
}
