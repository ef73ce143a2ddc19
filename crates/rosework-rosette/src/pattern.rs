//! Pattern functions: the shape of one rosette repeat.
//!
//! A pattern maps a within-repeat fraction in `[0,1]` to a normalized
//! deflection in `[0,1]`. Patterns are consumed as opaque collaborators;
//! the built-ins here cover the common cam shapes and give the synthesizer
//! something concrete to test against.

use std::sync::Arc;

/// Shared handle to a pattern function.
pub type PatternRef = Arc<dyn Pattern + Send + Sync>;

/// A rosette pattern function.
///
/// `value(0.0)` is the deflection at the start of a repeat; well-behaved
/// cam patterns start at `1.0` (the follower on the cam's major radius).
pub trait Pattern {
    /// Pattern name; `"NONE"` designates the degenerate pattern.
    fn name(&self) -> &str;

    /// Normalized deflection at a within-repeat fraction in `[0,1]`.
    fn value(&self, fraction: f64) -> f64;

    /// Extended evaluation for patterns that need the repeat count and/or
    /// two extra parameters. The default ignores the extras.
    fn value_ext(&self, fraction: f64, _repeat: u32, _n2: i32, _amp2: f64) -> f64 {
        self.value(fraction)
    }

    /// Minimum legal repeat count.
    fn min_repeat(&self) -> u32 {
        1
    }

    /// Whether [`Pattern::value_ext`] needs the repeat count.
    fn needs_repeat(&self) -> bool {
        false
    }

    /// Whether [`Pattern::value_ext`] needs the n2/amp2 parameters.
    fn needs_options(&self) -> bool {
        false
    }

    /// Whether this pattern blends two sub-shapes (uses all extras).
    fn is_dual(&self) -> bool {
        false
    }

    /// Breakpoints of one repeat as fractions in `[0,1]`, if this pattern
    /// is piecewise linear. Enables the straight-pattern shortcut in the
    /// toolpath synthesizer.
    fn line_segments(&self) -> Option<&[f64]> {
        None
    }
}

/// The degenerate pattern. Any rosette referencing it has its amplitude,
/// phase, and mask phase forced to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonePattern;

impl Pattern for NonePattern {
    fn name(&self) -> &str {
        "NONE"
    }

    fn value(&self, _fraction: f64) -> f64 {
        0.0
    }
}

/// Sinusoidal cam: `(1 + cos(2*pi*f)) / 2`, starting on the major radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinePattern;

impl Pattern for SinePattern {
    fn name(&self) -> &str {
        "Sine"
    }

    fn value(&self, fraction: f64) -> f64 {
        (1.0 + (std::f64::consts::TAU * fraction).cos()) / 2.0
    }
}

/// Symmetric triangular cam, piecewise linear with a vertex at mid-repeat.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrianglePattern;

const TRIANGLE_SEGMENTS: [f64; 3] = [0.0, 0.5, 1.0];

impl Pattern for TrianglePattern {
    fn name(&self) -> &str {
        "Triangle"
    }

    fn value(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        if f <= 0.5 {
            1.0 - 2.0 * f
        } else {
            2.0 * f - 1.0
        }
    }

    fn line_segments(&self) -> Option<&[f64]> {
        Some(&TRIANGLE_SEGMENTS)
    }
}

/// Constant full deflection. Piecewise linear with no interior breakpoints;
/// useful for masked and indexed work where the rosette only gates depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPattern;

const FLAT_SEGMENTS: [f64; 2] = [0.0, 1.0];

impl Pattern for FlatPattern {
    fn name(&self) -> &str {
        "Flat"
    }

    fn value(&self, _fraction: f64) -> f64 {
        1.0
    }

    fn line_segments(&self) -> Option<&[f64]> {
        Some(&FLAT_SEGMENTS)
    }
}

/// A dual pattern blending the fundamental with an `n2`-th harmonic at
/// relative amplitude `amp2`. Exercises the extended-evaluation path.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicPattern;

impl Pattern for HarmonicPattern {
    fn name(&self) -> &str {
        "Harmonic"
    }

    fn value(&self, fraction: f64) -> f64 {
        SinePattern.value(fraction)
    }

    fn value_ext(&self, fraction: f64, _repeat: u32, n2: i32, amp2: f64) -> f64 {
        let base = SinePattern.value(fraction);
        if n2 <= 1 || amp2 <= 0.0 {
            return base;
        }
        let harmonic = (1.0 + (std::f64::consts::TAU * fraction * n2 as f64).cos()) / 2.0;
        let blended = (base + amp2 * harmonic) / (1.0 + amp2);
        blended.clamp(0.0, 1.0)
    }

    fn needs_options(&self) -> bool {
        true
    }

    fn is_dual(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_starts_at_major_radius() {
        assert!((SinePattern.value(0.0) - 1.0).abs() < 1e-12);
        assert!(SinePattern.value(0.5).abs() < 1e-12);
        assert!((SinePattern.value(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_is_piecewise_linear() {
        let segs = TrianglePattern.line_segments().unwrap();
        assert_eq!(segs, &[0.0, 0.5, 1.0]);
        assert!((TrianglePattern.value(0.25) - 0.5).abs() < 1e-12);
        assert!(TrianglePattern.value(0.5).abs() < 1e-12);
    }

    #[test]
    fn test_values_stay_normalized() {
        let patterns: Vec<PatternRef> = vec![
            Arc::new(SinePattern),
            Arc::new(TrianglePattern),
            Arc::new(FlatPattern),
            Arc::new(HarmonicPattern),
        ];
        for p in &patterns {
            for i in 0..=100 {
                let f = i as f64 / 100.0;
                let v = p.value_ext(f, 4, 3, 0.5);
                assert!((0.0..=1.0).contains(&v), "{} out of range at {}", p.name(), f);
            }
        }
    }

    #[test]
    fn test_harmonic_reduces_to_sine_without_options() {
        for i in 0..=20 {
            let f = i as f64 / 20.0;
            assert_eq!(
                HarmonicPattern.value_ext(f, 4, 0, 0.0),
                SinePattern.value(f)
            );
        }
    }
}
