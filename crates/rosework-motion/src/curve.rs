//! Outline-curve collaborator interface.
//!
//! The outline/curve geometry library is external; the motion core consumes
//! it through [`OutlineCurve`]. A polyline implementation is provided for
//! tests and for the spiral generator's fine resampling.

use serde::{Deserialize, Serialize};

use rosework_core::types::LathePoint;

/// Which side of the curve a perpendicular should point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveSide {
    /// Outward, away from the spindle axis.
    Outside,
    /// Inward, toward the spindle axis.
    Inside,
}

/// The workpiece outline as seen by the motion core.
///
/// Degenerate curves (fewer than two points) answer `None` for
/// perpendiculars; callers treat that as a zero vector and degrade rather
/// than fail.
pub trait OutlineCurve {
    /// The curve point nearest to `p`.
    fn nearest_point(&self, p: LathePoint) -> LathePoint;

    /// Unit perpendicular at the curve point nearest `p`, pointing to the
    /// requested side, or `None` for a degenerate curve.
    fn perpendicular(&self, p: LathePoint, side: CurveSide) -> Option<LathePoint>;

    /// Sampled points along the curve between the points nearest `p0` and
    /// `p1`, in order from `p0` to `p1` inclusive.
    fn subset_points(&self, p0: LathePoint, p1: LathePoint) -> Vec<LathePoint>;

    /// The whole curve resampled at roughly the given spacing.
    fn resample(&self, spacing: f64) -> Vec<LathePoint>;

    /// The top (greatest Z) endpoint of the curve.
    fn top(&self) -> LathePoint;

    /// The bottom (least Z) endpoint of the curve.
    fn bottom(&self) -> LathePoint;
}

/// A polyline outline curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolylineCurve {
    points: Vec<LathePoint>,
}

impl PolylineCurve {
    /// Build from an ordered point list.
    pub fn new(points: Vec<LathePoint>) -> Self {
        Self { points }
    }

    /// A straight vertical outline at constant radius, bottom to top.
    pub fn vertical(x: f64, z0: f64, z1: f64, segments: usize) -> Self {
        let n = segments.max(1);
        let points = (0..=n)
            .map(|i| LathePoint::new(x, z0 + (z1 - z0) * i as f64 / n as f64))
            .collect();
        Self { points }
    }

    /// The raw points.
    pub fn points(&self) -> &[LathePoint] {
        &self.points
    }

    fn nearest_segment(&self, p: LathePoint) -> Option<(usize, f64, LathePoint)> {
        if self.points.len() < 2 {
            return None;
        }
        let mut best: Option<(usize, f64, LathePoint, f64)> = None;
        for i in 0..self.points.len() - 1 {
            let a = self.points[i];
            let b = self.points[i + 1];
            let ab = b - a;
            let len2 = ab.dot(&ab);
            let t = if len2 > 0.0 {
                ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let q = a + ab.scaled(t);
            let d = p.distance_to(&q);
            if best.as_ref().is_none_or(|(_, _, _, bd)| d < *bd) {
                best = Some((i, t, q, d));
            }
        }
        best.map(|(i, t, q, _)| (i, t, q))
    }
}

impl OutlineCurve for PolylineCurve {
    fn nearest_point(&self, p: LathePoint) -> LathePoint {
        match self.nearest_segment(p) {
            Some((_, _, q)) => q,
            None => self.points.first().copied().unwrap_or_default(),
        }
    }

    fn perpendicular(&self, p: LathePoint, side: CurveSide) -> Option<LathePoint> {
        let (i, _, _) = self.nearest_segment(p)?;
        let tangent = (self.points[i + 1] - self.points[i]).normalized();
        if tangent == LathePoint::origin() {
            return None;
        }
        // Perp of the tangent; orient by requested side (outside = +x bias,
        // or +z at a vertical face).
        let perp = tangent.perp().snapped();
        let outward = if perp.x != 0.0 {
            if perp.x > 0.0 {
                perp
            } else {
                -perp
            }
        } else if perp.z > 0.0 {
            perp
        } else {
            -perp
        };
        Some(match side {
            CurveSide::Outside => outward,
            CurveSide::Inside => -outward,
        })
    }

    fn subset_points(&self, p0: LathePoint, p1: LathePoint) -> Vec<LathePoint> {
        let Some((i0, t0, q0)) = self.nearest_segment(p0) else {
            return self.points.clone();
        };
        let Some((i1, t1, q1)) = self.nearest_segment(p1) else {
            return self.points.clone();
        };

        let forward = (i0, t0) <= (i1, t1);
        let (si, st, sq, ei, et, eq) = if forward {
            (i0, t0, q0, i1, t1, q1)
        } else {
            (i1, t1, q1, i0, t0, q0)
        };

        let mut out = vec![sq];
        for point in &self.points[si + 1..=ei] {
            out.push(*point);
        }
        // Trim the final vertex when the end projection stops short of it.
        if et < 1.0 {
            if let Some(last) = out.last() {
                if *last != eq {
                    if out.len() > 1 && (si, st) < (ei, 0.0) {
                        out.pop();
                    }
                    out.push(eq);
                }
            }
        }
        if !forward {
            out.reverse();
        }
        out.dedup_by(|a, b| a.distance_to(b) < 1e-12);
        out
    }

    fn resample(&self, spacing: f64) -> Vec<LathePoint> {
        if self.points.len() < 2 || spacing <= 0.0 {
            return self.points.clone();
        }
        let mut out = vec![self.points[0]];
        let mut carried = 0.0;
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let seg_len = a.distance_to(&b);
            if seg_len <= 0.0 {
                continue;
            }
            let dir = (b - a).scaled(1.0 / seg_len);
            let mut along = spacing - carried;
            while along < seg_len {
                out.push(a + dir.scaled(along));
                along += spacing;
            }
            carried = (carried + seg_len) % spacing;
        }
        if let Some(last) = self.points.last() {
            if out.last().map(|p| p.distance_to(last) > 1e-9) == Some(true) {
                out.push(*last);
            }
        }
        out
    }

    fn top(&self) -> LathePoint {
        self.points
            .iter()
            .copied()
            .fold(LathePoint::new(0.0, f64::NEG_INFINITY), |acc, p| {
                if p.z > acc.z {
                    p
                } else {
                    acc
                }
            })
    }

    fn bottom(&self) -> LathePoint {
        self.points
            .iter()
            .copied()
            .fold(LathePoint::new(0.0, f64::INFINITY), |acc, p| {
                if p.z < acc.z {
                    p
                } else {
                    acc
                }
            })
    }
}
