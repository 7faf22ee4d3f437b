//! Actuator command mapping.
//!
//! Scales the normalized controller output to the motor's native signed
//! range. The cast truncates toward zero, so outputs smaller than one
//! command step produce 0.

use standoff_common::control_unit::config::ActuatorConfig;

/// Map a normalized output in `[-1, 1]` to a signed actuator command.
///
/// With `invert_direction` a positive output (measurement short of the
/// setpoint) drives backward, away from the obstacle.
#[inline]
pub fn to_actuator_command(output: f64, config: &ActuatorConfig) -> i32 {
    let magnitude = (output * config.max_command as f64) as i32;
    if config.invert_direction {
        -magnitude
    } else {
        magnitude
    }
}
