//! Fixed-period control loop: poll → interlock → evaluate → actuate.
//!
//! [`ControlLoop::tick`] is the single transition function. Any scheduling
//! primitive may call it (host loop, timer callback, test harness); it never
//! blocks and decides on its own, through the [`TimeBase`], whether a
//! control step is due.
//!
//! ## Tick Sequence
//! 1. Poll the operator input and apply start / stop / re-arm. A start
//!    also restarts the TimeBase, so the first step runs immediately.
//! 2. Outside Running: return.
//! 3. Ask the TimeBase for admission; not due → `Waiting`.
//! 4. Read the sensor and evaluate the safety interlock.
//!    Trip → stop actuator, reset controller, Halted, report.
//! 5. Evaluate the PID, map to a command, drive the actuator.
//!
//! Collaborator failures never escape `tick`: sensor and drive failures
//! trip the interlock, stop and diagnostics failures are logged and counted.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.

use std::time::{Duration, Instant};

use standoff_common::control_unit::config::{
    ActuatorConfig, ControllerConfig, SafetyPolicy, TelemetryConfig,
};
use standoff_common::control_unit::event::{DiagnosticEvent, SafetyTrip};
use standoff_common::control_unit::state::LoopPhase;
use standoff_common::hal::driver::{Actuator, Diagnostics, RunControl, Sensor, TimeBase};
use standoff_common::hal::time::PeriodGate;
use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::control::output::to_actuator_command;
use crate::control::pid::{ControllerState, evaluate};
use crate::safety::interlock::{InterlockVerdict, evaluate_interlock};
use crate::state::machine::{LoopEvent, LoopPhaseMachine, TransitionResult};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick counters and control-step timing.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Calls to `tick`.
    pub ticks: u64,
    /// Admitted control steps (interlock evaluated).
    pub control_cycles: u64,
    /// PID evaluations.
    pub evaluations: u64,
    /// Safety interlock trips.
    pub safety_stops: u64,
    /// Events the diagnostics sink rejected.
    pub diagnostic_failures: u64,
    /// Control steps longer than the sample period.
    pub overruns: u64,
    /// Last control-step duration [ns].
    pub last_body_ns: u64,
    /// Minimum control-step duration [ns].
    pub min_body_ns: u64,
    /// Maximum control-step duration [ns].
    pub max_body_ns: u64,
    /// Running sum for average computation.
    pub sum_body_ns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            control_cycles: 0,
            evaluations: 0,
            safety_stops: 0,
            diagnostic_failures: 0,
            overruns: 0,
            last_body_ns: 0,
            min_body_ns: u64::MAX,
            max_body_ns: 0,
            sum_body_ns: 0,
        }
    }

    /// Record a control-step duration. O(1), no allocation.
    #[inline]
    pub fn record_body(&mut self, duration_ns: u64, budget_ns: u64) {
        self.last_body_ns = duration_ns;
        self.min_body_ns = self.min_body_ns.min(duration_ns);
        self.max_body_ns = self.max_body_ns.max(duration_ns);
        self.sum_body_ns = self.sum_body_ns.saturating_add(duration_ns);
        if duration_ns > budget_ns {
            self.overruns += 1;
        }
    }

    /// Average control-step duration [ns] (0 before the first step).
    #[inline]
    pub fn avg_body_ns(&self) -> u64 {
        if self.control_cycles == 0 {
            0
        } else {
            self.sum_body_ns / self.control_cycles
        }
    }
}

// ─── Tick Outcome ───────────────────────────────────────────────────

/// What one call to [`ControlLoop::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No control session.
    Idle,
    /// Waiting for operator re-arm after a safety stop.
    Halted,
    /// Running, but the sample period has not elapsed.
    Waiting,
    /// Control step executed and the actuator commanded.
    Actuated {
        /// Distance the controller acted on.
        measurement: f64,
        /// Saturated normalized output.
        output: f64,
        /// Command sent to the actuator.
        command: i32,
    },
    /// Interlock tripped this tick; the loop is now Halted.
    SafetyStop(SafetyTrip),
}

// ─── Control Loop ───────────────────────────────────────────────────

/// Immutable parameters of a control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopConfig {
    pub controller: ControllerConfig,
    pub safety: SafetyPolicy,
    pub actuator: ActuatorConfig,
    pub telemetry: TelemetryConfig,
}

/// Scheduler owning the controller state and all collaborators.
pub struct ControlLoop<S, A, T, R, D> {
    config: LoopConfig,
    budget_ns: u64,
    sensor: S,
    actuator: A,
    time_base: T,
    run_control: R,
    diagnostics: D,
    machine: LoopPhaseMachine,
    state: ControllerState,
    stats: CycleStats,
}

impl<S, A, T, R, D> ControlLoop<S, A, T, R, D>
where
    S: Sensor,
    A: Actuator,
    T: TimeBase,
    R: RunControl,
    D: Diagnostics,
{
    pub fn new(
        config: LoopConfig,
        sensor: S,
        actuator: A,
        time_base: T,
        run_control: R,
        diagnostics: D,
    ) -> Self {
        let budget_ns = (config.controller.sample_period * 1e9).round() as u64;
        Self {
            config,
            budget_ns,
            sensor,
            actuator,
            time_base,
            run_control,
            diagnostics,
            machine: LoopPhaseMachine::new(),
            state: ControllerState::default(),
            stats: CycleStats::new(),
        }
    }

    /// Run one tick. See the module docs for the sequence.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        self.run_control.poll_start_stop();
        let intent = self.run_control.is_running();
        match (self.machine.phase(), intent) {
            (LoopPhase::Idle, true) => self.start(),
            (LoopPhase::Running, false) => self.stop(),
            (LoopPhase::Halted, false) => self.rearm(),
            // Halted + intent: operator has not re-armed yet.
            _ => {}
        }

        match self.machine.phase() {
            LoopPhase::Idle => return TickOutcome::Idle,
            LoopPhase::Halted => return TickOutcome::Halted,
            LoopPhase::Running => {}
        }

        if !self.time_base.tick_due() {
            return TickOutcome::Waiting;
        }

        let started = Instant::now();
        let outcome = self.control_step();
        let elapsed_ns = started.elapsed().as_nanos() as u64;
        self.stats.record_body(elapsed_ns, self.budget_ns);
        if elapsed_ns > self.budget_ns {
            debug!(
                "Control step overrun: {elapsed_ns}ns > {}ns budget",
                self.budget_ns
            );
        }
        outcome
    }

    /// Stop the actuator and leave any active session, e.g. before exit.
    pub fn shutdown(&mut self) {
        match self.machine.phase() {
            LoopPhase::Running => self.stop(),
            LoopPhase::Halted => {
                self.stop_actuator();
                self.rearm();
            }
            LoopPhase::Idle => self.stop_actuator(),
        }
    }

    fn control_step(&mut self) -> TickOutcome {
        self.stats.control_cycles += 1;

        let reading = self.sensor.read_distance();
        if let Err(e) = &reading {
            debug!("Sensor read failed: {e}");
        }
        let measurement = match evaluate_interlock(reading, &self.config.safety) {
            InterlockVerdict::Clear(distance) => distance,
            InterlockVerdict::Trip(trip) => return self.safety_stop(trip),
        };

        let reference = self.config.safety.reference_setpoint;
        let output = evaluate(reference, measurement, &mut self.state, &self.config.controller);
        self.stats.evaluations += 1;

        let command = to_actuator_command(output, &self.config.actuator);
        if let Err(e) = self.actuator.drive(command) {
            error!("Actuator drive({command}) failed: {e}");
            return self.safety_stop(SafetyTrip::ActuatorFault);
        }
        trace!(measurement, output, command, "control step");

        if self.config.telemetry.is_due(self.stats.control_cycles) {
            self.report(DiagnosticEvent::Telemetry {
                measurement,
                reference,
                error: reference - measurement,
                output,
                command,
            });
        }

        TickOutcome::Actuated {
            measurement,
            output,
            command,
        }
    }

    fn start(&mut self) {
        if let TransitionResult::Ok(_) = self.machine.handle_event(LoopEvent::Start) {
            self.state.reset();
            self.time_base.restart();
            info!("LoopPhase: Idle → Running");
            self.report(DiagnosticEvent::Started);
        }
    }

    fn stop(&mut self) {
        self.stop_actuator();
        self.state.reset();
        if let TransitionResult::Ok(_) = self.machine.handle_event(LoopEvent::Stop) {
            info!("LoopPhase: Running → Idle");
            self.report(DiagnosticEvent::Stopped);
        }
    }

    fn rearm(&mut self) {
        if let TransitionResult::Ok(_) = self.machine.handle_event(LoopEvent::Stop) {
            info!("LoopPhase: Halted → Idle (re-armed)");
            self.report(DiagnosticEvent::Rearmed);
        }
    }

    fn safety_stop(&mut self, trip: SafetyTrip) -> TickOutcome {
        self.stop_actuator();
        self.state.reset();
        self.machine.handle_event(LoopEvent::SafetyTrip);
        self.stats.safety_stops += 1;
        info!("LoopPhase: Running → Halted ({trip})");
        self.report(DiagnosticEvent::SafetyStop { trip });
        TickOutcome::SafetyStop(trip)
    }

    fn stop_actuator(&mut self) {
        if let Err(e) = self.actuator.stop() {
            error!("Actuator stop failed: {e}");
        }
    }

    fn report(&mut self, event: DiagnosticEvent) {
        if let Err(e) = self.diagnostics.report(&event) {
            self.stats.diagnostic_failures += 1;
            debug!("Diagnostics sink rejected event: {e}");
        }
    }
}

impl<S, A, T, R, D> ControlLoop<S, A, T, R, D> {
    #[inline]
    pub fn phase(&self) -> LoopPhase {
        self.machine.phase()
    }

    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn time_base(&self) -> &T {
        &self.time_base
    }

    pub fn time_base_mut(&mut self) -> &mut T {
        &mut self.time_base
    }

    pub fn run_control_mut(&mut self) -> &mut R {
        &mut self.run_control
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }
}

// ─── Monotonic Time Base ────────────────────────────────────────────

/// [`TimeBase`] over `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicTimeBase {
    origin: Instant,
    gate: PeriodGate,
}

impl MonotonicTimeBase {
    pub fn new(period: Duration) -> Self {
        Self {
            origin: Instant::now(),
            gate: PeriodGate::new(period.as_micros() as u64),
        }
    }
}

impl TimeBase for MonotonicTimeBase {
    fn tick_due(&mut self) -> bool {
        let now_us = self.origin.elapsed().as_micros() as u64;
        self.gate.admit(now_us)
    }

    fn restart(&mut self) {
        self.gate.reset();
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT host setup.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}

/// Lock all current and future memory pages.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the control path never faults it in.
#[cfg(feature = "rt")]
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(not(feature = "rt"))]
fn prefault_stack() {}

/// Pin the current thread to a CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

/// Switch the calling thread to SCHED_FIFO.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Perform the RT setup sequence before entering the loop.
///
/// Without the `rt` feature every step is a no-op.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
