//! Minimum-distance safety interlock.
//!
//! Evaluated on every running tick before the controller. A reading that is
//! missing, non-finite, beyond the plausibility ceiling or closer than the
//! configured minimum yields a trip; only a clear reading may reach the PID
//! math.

use standoff_common::control_unit::config::SafetyPolicy;
use standoff_common::control_unit::event::SafetyTrip;
use standoff_common::hal::driver::HalError;

/// Outcome of the interlock check for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterlockVerdict {
    /// Safe to control; carries the validated distance.
    Clear(f64),
    /// Force the actuator off.
    Trip(SafetyTrip),
}

impl InterlockVerdict {
    #[inline]
    pub const fn is_trip(&self) -> bool {
        matches!(self, Self::Trip(_))
    }
}

/// Check a sensor result against the policy.
///
/// Both bounds are inclusive: a distance exactly equal to
/// `minimum_safe_distance` or `maximum_plausible_distance` is safe.
#[inline]
pub fn evaluate_interlock(reading: Result<f64, HalError>, policy: &SafetyPolicy) -> InterlockVerdict {
    let distance = match reading {
        Ok(d) => d,
        Err(_) => return InterlockVerdict::Trip(SafetyTrip::SensorFault),
    };
    if !distance.is_finite() || distance > policy.maximum_plausible_distance {
        return InterlockVerdict::Trip(SafetyTrip::InvalidReading { value: distance });
    }
    if distance < policy.minimum_safe_distance {
        return InterlockVerdict::Trip(SafetyTrip::TooClose {
            distance,
            minimum: policy.minimum_safe_distance,
        });
    }
    InterlockVerdict::Clear(distance)
}
