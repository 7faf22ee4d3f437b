//! Integration test: numeric properties of the controller step.
//!
//! 1. Output always inside the configured bounds
//! 2. A perfectly tracked setpoint never drifts
//! 3. Integral containment while saturated
//! 4. Reset leaves no trace of earlier history

use proptest::prelude::*;

use standoff_common::control_unit::config::ControllerConfig;
use standoff_control_unit::control::pid::{ControllerState, evaluate, reset};

// ── Helpers ─────────────────────────────────────────────────────────

fn firmware() -> ControllerConfig {
    ControllerConfig::default()
}

/// Gains strong enough to saturate on a moderate error.
fn aggressive() -> ControllerConfig {
    ControllerConfig {
        kp: 0.5,
        ki: 2.0,
        kd: 0.01,
        derivative_filter_alpha: 0.5,
        ..Default::default()
    }
}

// ── Properties ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn output_is_always_bounded(
        steps in prop::collection::vec((-1.0e6f64..1.0e6, -1.0e6f64..1.0e6), 1..64),
        kp in -10.0f64..10.0,
        ki in -10.0f64..10.0,
        kd in -10.0f64..10.0,
    ) {
        let cfg = ControllerConfig { kp, ki, kd, ..firmware() };
        let mut state = ControllerState::default();
        for (reference, measurement) in steps {
            let out = evaluate(reference, measurement, &mut state, &cfg);
            prop_assert!((-1.0..=1.0).contains(&out), "out = {}", out);
        }
    }

    #[test]
    fn tracked_setpoint_stays_at_zero(setpoint in -500.0f64..500.0, n in 1usize..200) {
        let mut state = ControllerState::default();
        for _ in 0..n {
            prop_assert_eq!(evaluate(setpoint, setpoint, &mut state, &firmware()), 0.0);
        }
        prop_assert!(state.is_zeroed());
    }

    #[test]
    fn reset_matches_fresh_state(
        history in prop::collection::vec(0.0f64..200.0, 0..32),
        x in 0.0f64..200.0,
        reference in 0.0f64..200.0,
    ) {
        let cfg = aggressive();
        let mut used = ControllerState::default();
        for m in history {
            evaluate(reference, m, &mut used, &cfg);
        }
        reset(&mut used);
        let mut fresh = ControllerState::default();
        let a = evaluate(reference, x, &mut used, &cfg);
        let b = evaluate(reference, x, &mut fresh, &cfg);
        prop_assert_eq!(a, b);
        prop_assert_eq!(used, fresh);
    }
}

// ── Anti-windup ─────────────────────────────────────────────────────

#[test]
fn accumulator_frozen_while_saturated_high_with_positive_error() {
    let cfg = aggressive();
    let mut state = ControllerState::default();

    // First step charges the accumulator while still unsaturated.
    let out = evaluate(0.5, 0.0, &mut state, &cfg);
    assert!(out < 1.0);
    let charged = state.integral_accumulator();
    assert!(charged > 0.0);

    // Error 10: kp·e = 5 pins the output high; error keeps pushing up.
    for _ in 0..100 {
        let before = state.integral_accumulator();
        assert_eq!(evaluate(10.0, 0.0, &mut state, &cfg), 1.0);
        assert_eq!(state.integral_accumulator(), before);
    }
    assert_eq!(state.integral_accumulator(), charged);
}

#[test]
fn accumulator_unwinds_once_error_reverses_while_saturated() {
    // Accumulator large enough to keep the output pinned high on its own.
    let cfg = ControllerConfig {
        kp: 0.01,
        ki: 10.0,
        kd: 0.0,
        ..firmware()
    };
    let mut state = ControllerState::from_parts(0.0, 1.0, 0.0);

    let mut previous = state.integral_accumulator();
    for _ in 0..10 {
        assert_eq!(evaluate(0.0, 2.0, &mut state, &cfg), 1.0);
        assert!(state.integral_accumulator() < previous);
        previous = state.integral_accumulator();
    }
    assert!((state.integral_accumulator() - 0.8).abs() < 1e-12);
}

#[test]
fn accumulator_unwinds_when_saturated_low_and_error_positive() {
    let cfg = ControllerConfig {
        kp: 0.01,
        ki: 10.0,
        kd: 0.0,
        ..firmware()
    };
    let mut state = ControllerState::from_parts(0.0, -1.0, 0.0);
    assert_eq!(evaluate(2.0, 0.0, &mut state, &cfg), -1.0);
    assert!((state.integral_accumulator() - (-0.98)).abs() < 1e-12);
}

#[test]
fn derivative_kick_is_smoothed_by_filter() {
    let sharp = ControllerConfig {
        kp: 0.0,
        ki: 0.0,
        kd: 0.001,
        derivative_filter_alpha: 0.01,
        ..firmware()
    };
    let smooth = ControllerConfig {
        derivative_filter_alpha: 0.99,
        ..sharp
    };
    let (mut s1, mut s2) = (ControllerState::default(), ControllerState::default());
    let a = evaluate(10.0, 0.0, &mut s1, &sharp);
    let b = evaluate(10.0, 0.0, &mut s2, &smooth);
    assert!(b.abs() < a.abs());
}
