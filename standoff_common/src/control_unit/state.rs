//! Loop phase of the control-loop scheduler.

use serde::{Deserialize, Serialize};

/// Phase of the control loop.
///
/// `Halted` is entered only through the safety interlock and is left only
/// through an explicit operator stop, never automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LoopPhase {
    /// Waiting for a start signal. Actuator stopped.
    #[default]
    Idle = 0,
    /// Executing one control step per admitted tick.
    Running = 1,
    /// Safety interlock tripped; waiting for operator re-arm.
    Halted = 2,
}

impl LoopPhase {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Running),
            2 => Some(Self::Halted),
            _ => None,
        }
    }

    /// Lowercase name, matches the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Halted => "halted",
        }
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
