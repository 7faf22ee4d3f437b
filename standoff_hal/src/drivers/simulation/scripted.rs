//! Scripted collaborators for deterministic control-loop runs.
//!
//! Each double records what the loop asked of it so tests and benches can
//! assert on the exact call sequence.

use std::collections::VecDeque;

use standoff_common::control_unit::event::DiagnosticEvent;
use standoff_common::hal::driver::{
    Actuator, Diagnostics, HalError, RunControl, Sensor, TimeBase,
};

/// Sensor that replays a queue of readings.
///
/// Once the queue is drained the last successful reading is repeated.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: VecDeque<Result<f64, HalError>>,
    last: Option<f64>,
    reads: u64,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: readings.into_iter().map(Ok).collect(),
            last: None,
            reads: 0,
        }
    }

    /// Sensor that always reports `distance`.
    pub fn constant(distance: f64) -> Self {
        Self {
            script: VecDeque::new(),
            last: Some(distance),
            reads: 0,
        }
    }

    pub fn push(&mut self, distance: f64) {
        self.script.push_back(Ok(distance));
    }

    pub fn push_fault(&mut self, reason: &str) {
        self.script
            .push_back(Err(HalError::Sensor(reason.to_string())));
    }

    /// Number of `read_distance` calls so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl Sensor for ScriptedSensor {
    fn read_distance(&mut self) -> Result<f64, HalError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Ok(value)) => {
                self.last = Some(value);
                Ok(value)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .ok_or_else(|| HalError::Sensor("script exhausted".to_string())),
        }
    }
}

/// One call received by a [`RecordingActuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Drive(i32),
    Stop,
}

/// Actuator that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    calls: Vec<ActuatorCall>,
    fail_drive: bool,
    fail_stop: bool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[ActuatorCall] {
        &self.calls
    }

    pub fn last_call(&self) -> Option<ActuatorCall> {
        self.calls.last().copied()
    }

    /// Most recent drive command, ignoring stops.
    pub fn last_command(&self) -> Option<i32> {
        self.calls.iter().rev().find_map(|call| match call {
            ActuatorCall::Drive(cmd) => Some(*cmd),
            ActuatorCall::Stop => None,
        })
    }

    pub fn drive_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Drive(_)))
            .count()
    }

    pub fn stop_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Stop))
            .count()
    }

    pub fn set_fail_drive(&mut self, fail: bool) {
        self.fail_drive = fail;
    }

    pub fn set_fail_stop(&mut self, fail: bool) {
        self.fail_stop = fail;
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Actuator for RecordingActuator {
    fn drive(&mut self, command: i32) -> Result<(), HalError> {
        self.calls.push(ActuatorCall::Drive(command));
        if self.fail_drive {
            return Err(HalError::Actuator("driver fault".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HalError> {
        self.calls.push(ActuatorCall::Stop);
        if self.fail_stop {
            return Err(HalError::Actuator("brake fault".to_string()));
        }
        Ok(())
    }
}

/// Time base whose answer is set by the test.
#[derive(Debug)]
pub struct ManualTimeBase {
    due: bool,
    polls: u64,
    restarts: u64,
}

impl ManualTimeBase {
    /// Every poll is due.
    pub fn always() -> Self {
        Self {
            due: true,
            polls: 0,
            restarts: 0,
        }
    }

    /// No poll is due until [`set_due`](Self::set_due).
    pub fn never() -> Self {
        Self {
            due: false,
            polls: 0,
            restarts: 0,
        }
    }

    pub fn set_due(&mut self, due: bool) {
        self.due = due;
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Sessions started against this time base.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }
}

impl TimeBase for ManualTimeBase {
    fn tick_due(&mut self) -> bool {
        self.polls += 1;
        self.due
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}

/// Run control held at a fixed intent until changed.
#[derive(Debug, Default)]
pub struct HeldRunControl {
    running: bool,
    polls: u64,
}

impl HeldRunControl {
    pub fn new(running: bool) -> Self {
        Self { running, polls: 0 }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl RunControl for HeldRunControl {
    fn poll_start_stop(&mut self) {
        self.polls += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Diagnostics sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Vec<DiagnosticEvent>,
    failing: bool,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every event.
    pub fn failing() -> Self {
        Self {
            events: Vec::new(),
            failing: true,
        }
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn telemetry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::Telemetry { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        if self.failing {
            return Err(HalError::Diagnostics("sink unavailable".to_string()));
        }
        self.events.push(*event);
        Ok(())
    }
}
