//! Depth-pass planning.

use serde::{Deserialize, Serialize};

use rosework_core::types::RotationPolicy;

/// The soft-lift option: sweep a short angular window after the final pass
/// while lifting the cutter, avoiding a withdrawal mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftLift {
    /// Angular window of the lift, degrees.
    pub degrees: f64,
}

/// One planned pass: the cumulative depth it cuts to and whether it is the
/// designated last pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pass {
    /// Cumulative depth of this pass.
    pub depth: f64,
    /// Angular step used while sweeping this pass, degrees.
    pub step: f64,
    /// Whether this is the final pass.
    pub is_last: bool,
}

/// How a cut is divided into depth passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassPlan {
    /// Coarse depth increment per pass.
    pub pass_depth: f64,
    /// Angular step on coarse passes, degrees.
    pub pass_step: f64,
    /// Depth increment reserved for the final pass.
    pub last_depth: f64,
    /// Angular step on the final pass, degrees.
    pub last_step: f64,
    /// Angular extent of one revolution sweep, normally 360.
    pub steps_per_rev: f64,
    /// Sweep-direction policy across passes.
    pub rotation: RotationPolicy,
    /// Safety clearance used for rapid approach and withdrawal.
    pub safe_offset: f64,
    /// Optional soft lift after the final pass.
    pub soft_lift: Option<SoftLift>,
}

impl Default for PassPlan {
    fn default() -> Self {
        Self {
            pass_depth: 0.02,
            pass_step: 2.0,
            last_depth: 0.01,
            last_step: 1.0,
            steps_per_rev: 360.0,
            rotation: RotationPolicy::default(),
            safe_offset: 0.05,
            soft_lift: None,
        }
    }
}

impl PassPlan {
    /// The cumulative pass depths reaching `target`: coarse increments up
    /// to `target - last_depth`, then one final pass at full target.
    ///
    /// A non-positive target yields a single zero-depth pass so synthesis
    /// still traces the surface.
    pub fn passes(&self, target: f64) -> Vec<Pass> {
        let target = target.max(0.0);
        let mut passes = Vec::new();
        if self.pass_depth > 0.0 {
            let coarse_limit = target - self.last_depth.max(0.0);
            let mut depth = self.pass_depth;
            while depth < coarse_limit - 1e-12 || (depth - coarse_limit).abs() <= 1e-12 {
                passes.push(Pass {
                    depth,
                    step: self.pass_step,
                    is_last: false,
                });
                depth += self.pass_depth;
            }
        }
        passes.push(Pass {
            depth: target,
            step: if self.last_step > 0.0 {
                self.last_step
            } else {
                self.pass_step
            },
            is_last: true,
        });
        passes
    }

    /// Whether a pass should sweep in reverse, per the rotation policy.
    pub fn reversed(&self, pass: &Pass) -> bool {
        match self.rotation {
            RotationPolicy::Forward => false,
            RotationPolicy::Reverse => true,
            RotationPolicy::ReverseLastPass => pass.is_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coarse_then_final() {
        let plan = PassPlan {
            pass_depth: 0.02,
            last_depth: 0.01,
            ..Default::default()
        };
        let passes = plan.passes(0.05);
        let depths: Vec<f64> = passes.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![0.02, 0.04, 0.05]);
        assert!(passes.last().unwrap().is_last);
        assert!(passes.iter().take(2).all(|p| !p.is_last));
    }

    #[test]
    fn test_shallow_target_single_pass() {
        let plan = PassPlan::default();
        let passes = plan.passes(0.015);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].depth, 0.015);
        assert!(passes[0].is_last);
    }

    #[test]
    fn test_zero_target_traces_surface() {
        let plan = PassPlan::default();
        let passes = plan.passes(0.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].depth, 0.0);
    }

    #[test]
    fn test_reverse_last_pass_policy() {
        let plan = PassPlan::default();
        let passes = plan.passes(0.05);
        assert!(!plan.reversed(&passes[0]));
        assert!(plan.reversed(passes.last().unwrap()));
    }
}
