//! LoopPhase transitions.
//!
//! Control session lifecycle: Idle → Running → Idle on operator start/stop,
//! Running → Halted on a safety trip. Halted never resumes by itself; the
//! operator must stop (re-arm to Idle) and start again.

use standoff_common::control_unit::state::LoopPhase;

/// Result of a LoopPhase transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition accepted, new phase.
    Ok(LoopPhase),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Event that can trigger a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Operator start intent.
    Start,
    /// Operator stop intent.
    Stop,
    /// Safety interlock tripped.
    SafetyTrip,
}

/// LoopPhase holder. Starts in Idle.
#[derive(Debug, Clone, Default)]
pub struct LoopPhaseMachine {
    phase: LoopPhase,
}

impl LoopPhaseMachine {
    pub const fn new() -> Self {
        Self {
            phase: LoopPhase::Idle,
        }
    }

    /// Current phase.
    #[inline]
    pub const fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LoopEvent) -> TransitionResult {
        use LoopEvent::*;
        use LoopPhase::*;

        let next = match (self.phase, event) {
            (Idle, Start) => Running,
            (Running, Stop) => Idle,
            (Running, SafetyTrip) => Halted,
            // Re-arm after a safety stop.
            (Halted, Stop) => Idle,
            // Idempotent.
            (Halted, SafetyTrip) => Halted,
            (Idle, Stop) => Idle,
            _ => return TransitionResult::Rejected(invalid_transition_reason(self.phase, event)),
        };

        self.phase = next;
        TransitionResult::Ok(next)
    }

    /// Whether the controller may command the actuator.
    #[inline]
    pub const fn allows_motion(&self) -> bool {
        matches!(self.phase, LoopPhase::Running)
    }
}

fn invalid_transition_reason(phase: LoopPhase, event: LoopEvent) -> &'static str {
    use LoopEvent::*;
    use LoopPhase::*;
    match (phase, event) {
        (Halted, Start) => "Halted: operator must stop (re-arm) before starting",
        (Running, Start) => "Running: already started",
        (Idle, SafetyTrip) => "Idle: no control session to trip",
        _ => "invalid event for current phase",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
