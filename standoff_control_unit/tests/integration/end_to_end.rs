//! Integration test: the reference three-step session.
//!
//! 1. Measurement equal to the setpoint: zero output, zero command
//! 2. Vehicle at 50 cm: positive output, inverted command drives backward
//! 3. Obstacle at 5 cm: interlock stops the motor, controller is reset

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

fn session(readings: &[f64]) -> ScriptedLoop {
    ControlLoop::new(
        LoopConfig::default(),
        ScriptedSensor::new(readings.iter().copied()),
        RecordingActuator::new(),
        ManualTimeBase::always(),
        HeldRunControl::new(true),
        RecordingDiagnostics::new(),
    )
}

#[test]
fn three_step_session() {
    let mut cl = session(&[100.0, 50.0, 5.0]);

    // Step 1
    assert_eq!(
        cl.tick(),
        TickOutcome::Actuated {
            measurement: 100.0,
            output: 0.0,
            command: 0
        }
    );
    assert_eq!(cl.actuator().last_call(), Some(ActuatorCall::Drive(0)));

    // Step 2
    let TickOutcome::Actuated {
        measurement,
        output,
        command,
    } = cl.tick()
    else {
        panic!("second step did not actuate");
    };
    assert_eq!(measurement, 50.0);
    assert!(output > 0.0 && output < 1.0);
    assert!((output - 0.2229257522860385).abs() < 1e-9, "output = {output}");
    assert_eq!(command, -56);
    assert!((cl.state().integral_accumulator() - 0.5).abs() < 1e-12);
    assert_eq!(cl.stats().evaluations, 2);

    // Step 3
    let outcome = cl.tick();
    assert_eq!(
        outcome,
        TickOutcome::SafetyStop(SafetyTrip::TooClose {
            distance: 5.0,
            minimum: 30.0
        })
    );
    assert_eq!(cl.actuator().last_call(), Some(ActuatorCall::Stop));
    assert_eq!(cl.actuator().drive_count(), 2);
    assert!(cl.state().is_zeroed());
    assert_eq!(cl.stats().evaluations, 2);
    assert_eq!(cl.stats().control_cycles, 3);
    assert_eq!(cl.stats().safety_stops, 1);
    assert_eq!(cl.phase(), LoopPhase::Halted);

    assert_eq!(
        cl.diagnostics().events(),
        &[
            DiagnosticEvent::Started,
            DiagnosticEvent::SafetyStop {
                trip: SafetyTrip::TooClose {
                    distance: 5.0,
                    minimum: 30.0
                }
            },
        ]
    );
}

#[test]
fn operator_stop_and_restart_starts_from_clean_history() {
    let mut cl = session(&[50.0, 50.0, 50.0]);
    let first = cl.tick();
    cl.tick();
    assert!(cl.state().integral_accumulator() > 0.0);

    cl.run_control_mut().set_running(false);
    assert_eq!(cl.tick(), TickOutcome::Idle);
    assert!(cl.state().is_zeroed());
    assert_eq!(cl.actuator().last_call(), Some(ActuatorCall::Stop));

    cl.run_control_mut().set_running(true);
    assert_eq!(cl.tick(), first);
    assert_eq!(
        cl.diagnostics().events(),
        &[
            DiagnosticEvent::Started,
            DiagnosticEvent::Stopped,
            DiagnosticEvent::Started
        ]
    );
}

#[test]
fn ticks_between_periods_do_nothing() {
    let mut cl = session(&[80.0]);
    cl.tick();
    let calls = cl.actuator().calls().len();
    cl.time_base_mut().set_due(false);
    for _ in 0..10 {
        assert_eq!(cl.tick(), TickOutcome::Waiting);
    }
    assert_eq!(cl.actuator().calls().len(), calls);
    assert_eq!(cl.sensor_mut().reads(), 1);
    assert_eq!(cl.stats().ticks, 11);
    assert_eq!(cl.stats().control_cycles, 1);
}
