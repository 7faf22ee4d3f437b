//! Integration test: interlock precedence inside the control loop.
//!
//! A trip always stops the actuator before any controller evaluation, and a
//! Halted loop only resumes after the operator re-arms it.

use proptest::prelude::*;

use standoff_common::control_unit::config::SafetyPolicy;
use standoff_common::control_unit::event::{DiagnosticEvent, SafetyTrip};
use standoff_common::control_unit::state::LoopPhase;
use standoff_control_unit::cycle::{ControlLoop, LoopConfig, TickOutcome};
use standoff_hal::drivers::simulation::{
    ActuatorCall, HeldRunControl, ManualTimeBase, RecordingActuator, RecordingDiagnostics,
    ScriptedSensor,
};

type ScriptedLoop = ControlLoop<
    ScriptedSensor,
    RecordingActuator,
    ManualTimeBase,
    HeldRunControl,
    RecordingDiagnostics,
>;

fn with_policy(sensor: ScriptedSensor, safety: SafetyPolicy) -> ScriptedLoop {
    ControlLoop::new(
        LoopConfig {
            safety,
            ..Default::default()
        },
        sensor,
        RecordingActuator::new(),
        ManualTimeBase::always(),
        HeldRunControl::new(true),
        RecordingDiagnostics::new(),
    )
}

proptest! {
    #[test]
    fn close_reading_never_reaches_the_controller(
        minimum in 1.0f64..200.0,
        offset in 1.0f64..200.0,
        clear in prop::collection::vec(0.0f64..=1.0, 0..6),
        fraction in 0.0f64..0.999,
    ) {
        let safety = SafetyPolicy {
            minimum_safe_distance: minimum,
            reference_setpoint: minimum + offset,
            maximum_plausible_distance: minimum + offset + 100.0,
        };
        let mut sensor = ScriptedSensor::new(clear.iter().map(|f| minimum + f * offset));
        sensor.push(minimum * fraction);
        let mut cl = with_policy(sensor, safety);

        // Build up controller history before the trip.
        for _ in &clear {
            let outcome = cl.tick();
            prop_assert!(matches!(outcome, TickOutcome::Actuated { .. }), "{:?}", outcome);
        }
        let evaluated = clear.len() as u64;
        prop_assert_eq!(cl.stats().evaluations, evaluated);

        let outcome = cl.tick();
        prop_assert!(
            matches!(outcome, TickOutcome::SafetyStop(SafetyTrip::TooClose { .. })),
            "{:?}",
            outcome
        );
        prop_assert_eq!(cl.stats().evaluations, evaluated);
        prop_assert_eq!(cl.actuator().drive_count(), clear.len());
        prop_assert_eq!(cl.actuator().last_call(), Some(ActuatorCall::Stop));
        prop_assert!(cl.state().is_zeroed());
    }
}

#[test]
fn reading_at_minimum_is_safe() {
    let mut cl = with_policy(ScriptedSensor::constant(30.0), SafetyPolicy::default());
    assert!(matches!(cl.tick(), TickOutcome::Actuated { measurement, .. } if measurement == 30.0));
    assert_eq!(cl.stats().safety_stops, 0);
}

#[test]
fn sensor_fault_and_implausible_readings_trip() {
    let mut sensor = ScriptedSensor::new([80.0]);
    sensor.push_fault("echo timeout");
    let mut cl = with_policy(sensor, SafetyPolicy::default());
    cl.tick();
    assert_eq!(cl.tick(), TickOutcome::SafetyStop(SafetyTrip::SensorFault));
    assert_eq!(cl.stats().evaluations, 1);

    let mut cl = with_policy(ScriptedSensor::constant(f64::NAN), SafetyPolicy::default());
    assert!(matches!(
        cl.tick(),
        TickOutcome::SafetyStop(SafetyTrip::InvalidReading { .. })
    ));
    assert_eq!(cl.stats().evaluations, 0);
}

#[test]
fn overflowing_reading_trips_and_restart_is_clean() {
    let sensor = ScriptedSensor::new([1.0e307, 80.0, 80.0, 60.0, 40.0]);
    let mut cl = with_policy(sensor, SafetyPolicy::default());

    assert_eq!(
        cl.tick(),
        TickOutcome::SafetyStop(SafetyTrip::InvalidReading { value: 1.0e307 })
    );
    assert_eq!(cl.stats().evaluations, 0);
    assert!(cl.state().is_zeroed());

    cl.run_control_mut().set_running(false);
    assert_eq!(cl.tick(), TickOutcome::Idle);
    cl.run_control_mut().set_running(true);

    // kp·20 + ki·0.2 ≈ 0.0892 → 22 counts, inverted.
    assert!(matches!(
        cl.tick(),
        TickOutcome::Actuated { command: -22, .. }
    ));
    for _ in 0..3 {
        let outcome = cl.tick();
        assert!(
            matches!(outcome, TickOutcome::Actuated { command, .. } if command != 0),
            "{outcome:?}"
        );
    }
    assert!(cl.state().filtered_derivative().is_finite());
    assert_eq!(cl.stats().safety_stops, 1);
}

#[test]
fn halted_loop_requires_rearm() {
    let mut sensor = ScriptedSensor::new([80.0, 10.0]);
    sensor.push(90.0);
    let mut cl = with_policy(sensor, SafetyPolicy::default());

    assert!(matches!(cl.tick(), TickOutcome::Actuated { .. }));
    assert!(matches!(cl.tick(), TickOutcome::SafetyStop(_)));

    // Start intent still held: stays Halted, no actuation, no reads.
    for _ in 0..5 {
        assert_eq!(cl.tick(), TickOutcome::Halted);
    }
    assert_eq!(cl.sensor_mut().reads(), 2);
    assert_eq!(cl.actuator().stop_count(), 1);

    // Operator re-arms (stop), then starts again.
    cl.run_control_mut().set_running(false);
    assert_eq!(cl.tick(), TickOutcome::Idle);
    assert_eq!(cl.phase(), LoopPhase::Idle);
    cl.run_control_mut().set_running(true);
    assert!(matches!(
        cl.tick(),
        TickOutcome::Actuated {
            measurement,
            command: -11,
            ..
        } if measurement == 90.0
    ));
    assert_eq!(
        cl.diagnostics().events(),
        &[
            DiagnosticEvent::Started,
            DiagnosticEvent::SafetyStop {
                trip: SafetyTrip::TooClose {
                    distance: 10.0,
                    minimum: 30.0
                }
            },
            DiagnosticEvent::Rearmed,
            DiagnosticEvent::Started,
        ]
    );
}
