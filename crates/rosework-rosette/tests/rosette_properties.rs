//! Property tests for the amplitude model.

use proptest::prelude::*;
use std::sync::Arc;

use rosework_core::angle_check;
use rosework_rosette::{
    Combine, CompoundRosette, RosetteNode, RosetteSource, SimpleRosette, SinePattern,
    TrianglePattern,
};

fn sine(p_to_p: f64, repeat: u32) -> SimpleRosette {
    SimpleRosette::with_amplitude(Arc::new(SinePattern), p_to_p, repeat)
}

proptest! {
    #[test]
    fn amplitude_always_within_p_to_p(
        angle in -1440.0f64..1440.0,
        p_to_p in 0.0f64..5.0,
        repeat in 1u32..24,
        phase in -720.0f64..720.0,
    ) {
        let mut rosette = sine(p_to_p, repeat);
        rosette.set_phase(phase);
        let v = rosette.amplitude_at(angle);
        prop_assert!(v >= 0.0);
        prop_assert!(v <= p_to_p + 1e-12);
    }

    #[test]
    fn inversion_is_exact_complement(
        angle in -720.0f64..720.0,
        p_to_p in 0.001f64..2.0,
        repeat in 1u32..16,
    ) {
        let rosette = sine(p_to_p, repeat);
        let plain = rosette.amplitude_at_inverted(angle, false);
        let flipped = rosette.amplitude_at_inverted(angle, true);
        prop_assert!((plain + flipped - p_to_p).abs() < 1e-9);
    }

    #[test]
    fn angle_check_range_and_idempotence(angle in -1e6f64..1e6) {
        let once = angle_check(angle);
        prop_assert!((0.0..360.0).contains(&once));
        prop_assert_eq!(angle_check(once), once);
    }

    #[test]
    fn compound_range_under_all_combiners(
        angle in 0.0f64..360.0,
        p_to_p in 0.001f64..1.0,
        op in prop::sample::select(vec![
            Combine::Min, Combine::Max, Combine::Add, Combine::Sub,
        ]),
    ) {
        let mut compound = CompoundRosette::new(p_to_p);
        compound.add_child(RosetteNode::Simple(sine(0.1, 4)), None);
        compound.add_child(RosetteNode::Simple(sine(0.07, 6)), Some(op));
        let v = compound.amplitude_at(angle);
        prop_assert!(v >= 0.0);
        prop_assert!(v <= p_to_p + 1e-12);
    }
}

#[test]
fn triangle_source_reports_line_segments() {
    let source = RosetteSource::Simple(SimpleRosette::with_amplitude(
        Arc::new(TrianglePattern),
        0.1,
        4,
    ));
    assert_eq!(source.line_segments().unwrap(), vec![0.0, 0.5, 1.0]);
}

#[test]
fn compound_of_identical_add_children_tracks_scaled_child() {
    let child = sine(0.25, 6);
    let mut compound = CompoundRosette::new(0.5);
    compound.add_child(RosetteNode::Simple(child.clone()), None);
    compound.add_child(RosetteNode::Simple(child.clone()), Some(Combine::Add));

    for i in 0..720 {
        let a = i as f64 * 0.5;
        assert!((compound.amplitude_at(a) - 2.0 * child.amplitude_at(a)).abs() < 1e-9);
    }
}
