//! Simulation driver module.
//!
//! A software rig for development and closed-loop testing without the
//! physical platform, plus scripted collaborators for deterministic tests.

mod input;
mod rig;
mod scripted;

pub use input::{ButtonHandle, LatchButton};
pub use rig::{RigClock, RigConfig, RigMotor, RigSensor, SimulatedRig};
pub use scripted::{
    ActuatorCall, HeldRunControl, ManualTimeBase, RecordingActuator, RecordingDiagnostics,
    ScriptedSensor,
};
