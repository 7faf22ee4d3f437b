//! Integration test: closed-loop runs against the simulated rig.
//!
//! The harness advances the rig physics by one sample period, then ticks the
//! loop, which is admitted by the rig's own clock.

use std::time::Duration;

use standoff_common::control_unit::config::TelemetryConfig;
use standoff_common::control_unit::event::SafetyTrip;
use standoff_common::control_unit::state::LoopPhase;
use standoff_common::hal::driver::NullDiagnostics;
use standoff_control_unit::cycle::{ControlLoop, LoopConfig, TickOutcome};
use standoff_hal::drivers::simulation::{
    HeldRunControl, RecordingDiagnostics, RigClock, RigConfig, RigMotor, RigSensor, SimulatedRig,
};

const PERIOD_US: u64 = 10_000;
const PERIOD: Duration = Duration::from_micros(PERIOD_US);

type RigLoop<D> = ControlLoop<RigSensor, RigMotor, RigClock, HeldRunControl, D>;

fn rig_loop<D>(rig: &SimulatedRig, config: LoopConfig, diagnostics: D) -> RigLoop<D>
where
    D: standoff_common::hal::driver::Diagnostics,
{
    ControlLoop::new(
        config,
        rig.sensor(),
        rig.motor(),
        rig.clock(PERIOD_US),
        HeldRunControl::new(true),
        diagnostics,
    )
}

/// Run `ticks` periods; returns (min, max) distance seen and the first trip.
fn run<D>(rig: &SimulatedRig, cl: &mut RigLoop<D>, ticks: usize) -> (f64, f64, Option<SafetyTrip>)
where
    D: standoff_common::hal::driver::Diagnostics,
{
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut trip = None;
    for _ in 0..ticks {
        rig.step(PERIOD);
        if let TickOutcome::SafetyStop(t) = cl.tick() {
            trip.get_or_insert(t);
        }
        lo = lo.min(rig.distance());
        hi = hi.max(rig.distance());
    }
    (lo, hi, trip)
}

fn rig_at(initial_distance: f64) -> SimulatedRig {
    SimulatedRig::new(RigConfig {
        initial_distance,
        ..Default::default()
    })
}

#[test]
fn backs_away_to_setpoint_from_60() {
    let rig = rig_at(60.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);

    let (lo, hi, trip) = run(&rig, &mut cl, 6000);

    assert_eq!(trip, None);
    assert!((rig.distance() - 100.0).abs() < 1.5, "final {}", rig.distance());
    assert!(lo >= 59.9, "min {lo}");
    assert!(hi < 135.0, "max {hi}");
    assert!(!rig.collided());
    assert_eq!(cl.stats().control_cycles, 6000);
    assert_eq!(cl.stats().evaluations, 6000);
}

#[test]
fn closes_in_to_setpoint_from_140() {
    let rig = rig_at(140.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);

    let (lo, _, trip) = run(&rig, &mut cl, 6000);

    assert_eq!(trip, None);
    assert!((rig.distance() - 100.0).abs() < 1.5, "final {}", rig.distance());
    assert!(lo > 60.0, "min {lo}");
}

#[test]
fn at_setpoint_stays_put() {
    let rig = rig_at(100.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);
    run(&rig, &mut cl, 1000);
    assert_eq!(rig.distance(), 100.0);
    assert_eq!(rig.command(), 0);
}

#[test]
fn follows_slow_moving_obstacle() {
    for speed in [5.0, -5.0] {
        let rig = SimulatedRig::new(RigConfig {
            initial_distance: 100.0,
            obstacle_speed: speed,
            ..Default::default()
        });
        let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);

        let (lo, hi, trip) = run(&rig, &mut cl, 6000);

        assert_eq!(trip, None, "speed {speed}");
        assert!(lo > 90.0 && hi < 110.0, "speed {speed}: [{lo}, {hi}]");
        assert!((rig.distance() - 100.0).abs() < 1.0, "speed {speed}");
    }
}

#[test]
fn fast_approaching_obstacle_trips_before_collision() {
    // Faster than the vehicle can reverse.
    let rig = SimulatedRig::new(RigConfig {
        initial_distance: 60.0,
        obstacle_speed: -100.0,
        ..Default::default()
    });
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);

    let (_, _, trip) = run(&rig, &mut cl, 200);

    assert!(matches!(trip, Some(SafetyTrip::TooClose { .. })), "{trip:?}");
    assert_eq!(cl.phase(), LoopPhase::Halted);
    assert_eq!(cl.stats().safety_stops, 1);
    assert_eq!(rig.command(), 0);
}

#[test]
fn sensor_fault_mid_run_stops_motor() {
    let rig = rig_at(60.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);
    run(&rig, &mut cl, 100);
    assert_ne!(rig.command(), 0);

    rig.set_sensor_fault(true);
    rig.step(PERIOD);
    assert_eq!(cl.tick(), TickOutcome::SafetyStop(SafetyTrip::SensorFault));
    assert_eq!(rig.command(), 0);
    assert_eq!(rig.velocity(), 0.0);
    assert!(cl.state().is_zeroed());
}

#[test]
fn unadmitted_ticks_do_not_sample() {
    let rig = rig_at(60.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);
    rig.step(PERIOD);
    assert!(matches!(cl.tick(), TickOutcome::Actuated { .. }));
    // No simulated time elapsed.
    for _ in 0..5 {
        assert_eq!(cl.tick(), TickOutcome::Waiting);
    }
    assert_eq!(cl.stats().control_cycles, 1);
    assert_eq!(cl.stats().ticks, 6);
}

#[test]
fn restarted_session_is_admitted_without_waiting() {
    let rig = rig_at(100.0);
    let mut cl = rig_loop(&rig, LoopConfig::default(), NullDiagnostics);

    rig.step(PERIOD);
    assert!(matches!(cl.tick(), TickOutcome::Actuated { .. }));

    // Stop and restart within the same sample period.
    cl.run_control_mut().set_running(false);
    assert_eq!(cl.tick(), TickOutcome::Idle);
    cl.run_control_mut().set_running(true);
    assert!(matches!(cl.tick(), TickOutcome::Actuated { .. }));
    assert_eq!(cl.tick(), TickOutcome::Waiting);
    assert_eq!(cl.stats().evaluations, 2);
}

#[test]
fn telemetry_every_interval() {
    let rig = rig_at(60.0);
    let config = LoopConfig {
        telemetry: TelemetryConfig { interval_ticks: 50 },
        ..Default::default()
    };
    let mut cl = rig_loop(&rig, config, RecordingDiagnostics::new());

    run(&rig, &mut cl, 1000);

    assert_eq!(cl.diagnostics().telemetry_count(), 20);
}
