//! A single patterned rosette.
//!
//! Maps a spindle angle to a deflection in `[0, pToP]` by locating the
//! containing repeat (optionally width-stretched), evaluating the pattern
//! at the within-repeat fraction, and applying amplitude symmetry, masking,
//! and inversion. Setters validate, keep prior state on rejection, and
//! publish one change event per accepted mutation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rosework_core::event_bus::{event_bus, CamEvent, ChangeEvent, PropertyId, PropertyValue};
use rosework_core::types::{angle_check, EntityId};

use crate::pattern::{NonePattern, Pattern, PatternRef};

/// What a masked-out repeat produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskStyle {
    /// Masked repeats are forced to zero deflection.
    High,
    /// Masked repeats are forced to full `pToP` deflection.
    Low,
}

impl Default for MaskStyle {
    fn default() -> Self {
        MaskStyle::High
    }
}

fn default_pattern() -> PatternRef {
    Arc::new(NonePattern)
}

/// A simple rosette: one pattern, repeated `repeat` times per revolution.
#[derive(Clone, Serialize, Deserialize)]
pub struct SimpleRosette {
    id: EntityId,
    #[serde(skip, default = "default_pattern")]
    pattern: PatternRef,
    /// Pattern name, kept for the persistence collaborator.
    pattern_name: String,
    p_to_p: f64,
    repeat: u32,
    phase: f64,
    invert: bool,
    mask: Option<String>,
    mask_phase: f64,
    mask_style: MaskStyle,
    symmetry_amp: Option<Vec<f64>>,
    symmetry_wid: Option<Vec<f64>>,
    n2: i32,
    amp2: f64,
}

impl std::fmt::Debug for SimpleRosette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleRosette")
            .field("id", &self.id)
            .field("pattern", &self.pattern_name)
            .field("p_to_p", &self.p_to_p)
            .field("repeat", &self.repeat)
            .field("phase", &self.phase)
            .field("invert", &self.invert)
            .field("mask", &self.mask)
            .finish()
    }
}

impl SimpleRosette {
    /// Create a rosette on the given pattern with zero amplitude.
    pub fn new(pattern: PatternRef) -> Self {
        let repeat = pattern.min_repeat().max(1);
        let pattern_name = pattern.name().to_string();
        Self {
            id: EntityId::new(),
            pattern,
            pattern_name,
            p_to_p: 0.0,
            repeat,
            phase: 0.0,
            invert: false,
            mask: None,
            mask_phase: 0.0,
            mask_style: MaskStyle::High,
            symmetry_amp: None,
            symmetry_wid: None,
            n2: 0,
            amp2: 0.0,
        }
    }

    /// Create a rosette with an amplitude and repeat, for tests and defaults.
    pub fn with_amplitude(pattern: PatternRef, p_to_p: f64, repeat: u32) -> Self {
        let mut rosette = Self::new(pattern);
        rosette.set_p_to_p(p_to_p);
        rosette.set_repeat(repeat);
        rosette
    }

    /// Entity ID for change-notification subscriptions.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The underlying pattern.
    pub fn pattern(&self) -> &PatternRef {
        &self.pattern
    }

    /// The pattern's name.
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    /// Peak-to-peak amplitude.
    pub fn p_to_p(&self) -> f64 {
        self.p_to_p
    }

    /// Pattern repeats per revolution.
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Phase in degrees (unbounded sign; applied as `phase / repeat`).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Whether the output is flipped to `pToP - value`.
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Per-repeat skip/keep mask, cyclically applied.
    pub fn mask(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    /// Mask phase in degrees.
    pub fn mask_phase(&self) -> f64 {
        self.mask_phase
    }

    /// What masked repeats produce.
    pub fn mask_style(&self) -> MaskStyle {
        self.mask_style
    }

    /// Per-repeat amplitude-symmetry scale factors.
    pub fn symmetry_amp(&self) -> Option<&[f64]> {
        self.symmetry_amp.as_deref()
    }

    /// Per-repeat width-stretch factors (cyclic, last forced to sum).
    pub fn symmetry_wid(&self) -> Option<&[f64]> {
        self.symmetry_wid.as_deref()
    }

    /// Secondary integer parameter for dual patterns.
    pub fn n2(&self) -> i32 {
        self.n2
    }

    /// Secondary amplitude parameter for dual patterns.
    pub fn amp2(&self) -> f64 {
        self.amp2
    }

    /// True for a rosette that deflects nothing (the circle-shortcut test).
    pub fn is_degenerate(&self) -> bool {
        self.p_to_p <= 0.0 || self.pattern_name == "NONE"
    }

    /// Whether the given repeat index is masked out.
    ///
    /// Index cuts skip masked repeats entirely instead of flattening them.
    pub fn is_repeat_masked(&self, index: u32) -> bool {
        self.repeat_masked(index)
    }

    // -- evaluation ---------------------------------------------------------

    /// Deflection at a spindle angle, in `[0, pToP]`.
    pub fn amplitude_at(&self, angle: f64) -> f64 {
        self.amplitude_at_inverted(angle, false)
    }

    /// Deflection at a spindle angle with an extra inversion applied on top
    /// of the rosette's own invert flag.
    pub fn amplitude_at_inverted(&self, angle: f64, extra_invert: bool) -> f64 {
        if self.p_to_p <= 0.0 {
            return 0.0;
        }

        let shifted = angle_check(angle_check(angle) + self.phase / self.repeat as f64);
        let (index, fraction) = self.locate_repeat(shifted);

        let mut value = if self.repeat_masked(index) {
            match self.mask_style {
                MaskStyle::High => 0.0,
                MaskStyle::Low => 1.0,
            }
        } else {
            let raw = self.pattern_value(fraction);
            self.apply_amp_symmetry(raw, index)
        };

        if self.invert != extra_invert {
            value = 1.0 - value;
        }

        (value * self.p_to_p).clamp(0.0, self.p_to_p)
    }

    /// Per-repeat stretch factors; present only when width symmetry is set.
    ///
    /// Factors are taken cyclically from the symmetry array, with the last
    /// forced so they sum to exactly `repeat`.
    pub fn stretch_factors(&self) -> Option<Vec<f64>> {
        let wid = self.symmetry_wid.as_ref()?;
        Some(Self::force_stretch_factors(wid, self.repeat))
    }

    /// Cumulative angle breakpoints of the stretched repeats, `repeat + 1`
    /// entries spanning exactly 0..360.
    pub fn angle_breakpoints(&self) -> Option<Vec<f64>> {
        let factors = self.stretch_factors()?;
        let span = 360.0 / self.repeat as f64;
        let mut breaks = Vec::with_capacity(factors.len() + 1);
        let mut accum = 0.0;
        breaks.push(0.0);
        for f in &factors {
            accum += f * span;
            breaks.push(accum);
        }
        // Pin the closing breakpoint against rounding drift.
        if let Some(last) = breaks.last_mut() {
            *last = 360.0;
        }
        Some(breaks)
    }

    fn force_stretch_factors(wid: &[f64], repeat: u32) -> Vec<f64> {
        let n = repeat as usize;
        let mut factors: Vec<f64> = (0..n.saturating_sub(1))
            .map(|i| wid[i % wid.len()])
            .collect();
        let used: f64 = factors.iter().sum();
        factors.push(repeat as f64 - used);
        factors
    }

    fn locate_repeat(&self, shifted: f64) -> (u32, f64) {
        let span = 360.0 / self.repeat as f64;
        match self.angle_breakpoints() {
            None => {
                let index = ((shifted / span) as u32).min(self.repeat - 1);
                let fraction = (shifted - index as f64 * span) / span;
                (index, fraction.clamp(0.0, 1.0))
            }
            Some(breaks) => {
                // Containing repeat is the last breakpoint <= shifted.
                let mut index = 0usize;
                for (i, b) in breaks.iter().enumerate().skip(1) {
                    if *b <= shifted {
                        index = i;
                    } else {
                        break;
                    }
                }
                let index = index.min(self.repeat as usize - 1);
                let width = breaks[index + 1] - breaks[index];
                let fraction = if width > 0.0 {
                    (shifted - breaks[index]) / width
                } else {
                    0.0
                };
                (index as u32, fraction.clamp(0.0, 1.0))
            }
        }
    }

    fn pattern_value(&self, fraction: f64) -> f64 {
        if self.pattern.is_dual() || self.pattern.needs_options() || self.pattern.needs_repeat() {
            self.pattern
                .value_ext(fraction, self.repeat, self.n2, self.amp2)
        } else {
            self.pattern.value(fraction)
        }
        .clamp(0.0, 1.0)
    }

    fn repeat_masked(&self, index: u32) -> bool {
        let Some(mask) = self.mask.as_ref() else {
            return false;
        };
        if mask.is_empty() {
            return false;
        }
        let span = 360.0 / self.repeat as f64;
        let shift = (self.mask_phase / span).round() as i64;
        let len = mask.len() as i64;
        let char_index = (((index as i64 + shift) % len) + len) % len;
        mask.as_bytes()[char_index as usize] == b'0'
    }

    fn apply_amp_symmetry(&self, raw: f64, index: u32) -> f64 {
        let Some(amp) = self.symmetry_amp.as_ref() else {
            return raw;
        };
        if amp.is_empty() {
            return raw;
        }
        let factor = amp[index as usize % amp.len()];
        // Re-anchor at the repeat start: patterns that begin at full
        // deflection must still line up across differently-scaled repeats.
        if (self.pattern_value(0.0) - 1.0).abs() < 1e-9 {
            (1.0 - factor * (1.0 - raw)).clamp(0.0, 1.0)
        } else {
            (factor * raw).clamp(0.0, 1.0)
        }
    }

    // -- setters ------------------------------------------------------------

    fn publish(&self, property: &'static str, old: PropertyValue, new: PropertyValue) {
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::rosette(
                self.id,
                PropertyId::new(property),
                old,
                new,
            )))
            .ok();
    }

    /// Replace the pattern. `"NONE"` forces amplitude, phase, and mask
    /// phase to zero; the repeat is clamped up to the pattern's minimum.
    pub fn set_pattern(&mut self, pattern: PatternRef) {
        let old = self.pattern_name.clone();
        self.pattern_name = pattern.name().to_string();
        self.pattern = pattern;
        if self.pattern_name == "NONE" {
            self.p_to_p = 0.0;
            self.phase = 0.0;
            self.mask_phase = 0.0;
        }
        if self.repeat < self.pattern.min_repeat() {
            self.repeat = self.pattern.min_repeat();
        }
        self.publish(
            "rosette.pattern",
            PropertyValue::Text(old),
            PropertyValue::Text(self.pattern_name.clone()),
        );
    }

    /// Set the peak-to-peak amplitude. Negative values are rejected; the
    /// prior amplitude is kept and no event fires.
    pub fn set_p_to_p(&mut self, p_to_p: f64) -> bool {
        if !p_to_p.is_finite() || p_to_p < 0.0 {
            tracing::debug!(p_to_p, "Rejected negative peak-to-peak amplitude");
            return false;
        }
        if self.pattern_name == "NONE" && p_to_p != 0.0 {
            return false;
        }
        let old = self.p_to_p;
        self.p_to_p = p_to_p;
        self.publish(
            "rosette.pToP",
            PropertyValue::Number(old),
            PropertyValue::Number(p_to_p),
        );
        true
    }

    /// Set the repeat, clamped to the pattern's minimum. A width-symmetry
    /// array that becomes infeasible for the new repeat is cleared.
    pub fn set_repeat(&mut self, repeat: u32) -> bool {
        let clamped = repeat.max(self.pattern.min_repeat()).max(1);
        let old = self.repeat;
        self.repeat = clamped;
        if let Some(wid) = self.symmetry_wid.clone() {
            if !Self::stretch_factors_valid(&wid, clamped) {
                self.symmetry_wid = None;
                self.publish(
                    "rosette.symmetryWid",
                    PropertyValue::Structural,
                    PropertyValue::None,
                );
            }
        }
        self.publish(
            "rosette.repeat",
            PropertyValue::Integer(old as i64),
            PropertyValue::Integer(clamped as i64),
        );
        true
    }

    /// Set the phase in degrees. Any finite value is accepted; sign is
    /// unbounded.
    pub fn set_phase(&mut self, phase: f64) -> bool {
        if !phase.is_finite() || self.pattern_name == "NONE" {
            return false;
        }
        let old = self.phase;
        self.phase = phase;
        self.publish(
            "rosette.phase",
            PropertyValue::Number(old),
            PropertyValue::Number(phase),
        );
        true
    }

    /// Set the invert flag.
    pub fn set_invert(&mut self, invert: bool) {
        let old = self.invert;
        if old == invert {
            return;
        }
        self.invert = invert;
        self.publish(
            "rosette.invert",
            PropertyValue::Flag(old),
            PropertyValue::Flag(invert),
        );
    }

    /// Set or clear the per-repeat mask string.
    pub fn set_mask(&mut self, mask: Option<String>) {
        let old = self.mask.clone();
        if old == mask {
            return;
        }
        self.mask = mask;
        self.publish(
            "rosette.mask",
            old.map(PropertyValue::Text).unwrap_or(PropertyValue::None),
            self.mask
                .clone()
                .map(PropertyValue::Text)
                .unwrap_or(PropertyValue::None),
        );
    }

    /// Set the mask phase in degrees.
    pub fn set_mask_phase(&mut self, mask_phase: f64) -> bool {
        if !mask_phase.is_finite() || self.pattern_name == "NONE" {
            return false;
        }
        let old = self.mask_phase;
        self.mask_phase = mask_phase;
        self.publish(
            "rosette.maskPhase",
            PropertyValue::Number(old),
            PropertyValue::Number(mask_phase),
        );
        true
    }

    /// Set what masked repeats produce.
    pub fn set_mask_style(&mut self, style: MaskStyle) {
        let old = self.mask_style;
        if old == style {
            return;
        }
        self.mask_style = style;
        self.publish(
            "rosette.maskStyle",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
    }

    /// Set or clear the amplitude-symmetry factors.
    pub fn set_symmetry_amp(&mut self, symmetry: Option<Vec<f64>>) -> bool {
        if let Some(factors) = &symmetry {
            if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return false;
            }
        }
        self.symmetry_amp = symmetry;
        self.publish(
            "rosette.symmetryAmp",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Set or clear the width-symmetry stretch factors. Rejected when the
    /// forced factors would not all be positive for the current repeat.
    pub fn set_symmetry_wid(&mut self, symmetry: Option<Vec<f64>>) -> bool {
        if let Some(wid) = &symmetry {
            if wid.is_empty() || !Self::stretch_factors_valid(wid, self.repeat) {
                tracing::debug!("Rejected width symmetry incompatible with repeat");
                return false;
            }
        }
        self.symmetry_wid = symmetry;
        self.publish(
            "rosette.symmetryWid",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Set the secondary parameters used by dual patterns.
    pub fn set_options(&mut self, n2: i32, amp2: f64) -> bool {
        if !amp2.is_finite() || amp2 < 0.0 {
            return false;
        }
        self.n2 = n2;
        self.amp2 = amp2;
        self.publish(
            "rosette.options",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    fn stretch_factors_valid(wid: &[f64], repeat: u32) -> bool {
        if wid.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return false;
        }
        Self::force_stretch_factors(wid, repeat)
            .iter()
            .all(|f| *f > 0.0)
    }
}
