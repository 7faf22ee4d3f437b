//! Simulated standoff rig.
//!
//! A single-axis vehicle facing an obstacle. The motor responds to the drive
//! command as a first-order lag towards `command / max_command * max_speed`;
//! positive commands move the vehicle forward, shrinking the distance.
//!
//! The rig owns one shared physical state. The control loop receives
//! separate handles for the capabilities it needs ([`RigSensor`],
//! [`RigMotor`], [`RigClock`]) while the harness advances time with
//! [`SimulatedRig::step`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use standoff_common::config::ConfigError;
use standoff_common::hal::driver::{Actuator, HalError, Sensor, TimeBase};
use standoff_common::hal::time::PeriodGate;
use tracing::{debug, trace, warn};

/// Physical parameters of the simulated rig.
///
/// # TOML Example
///
/// ```toml
/// [simulation]
/// initial_distance = 60.0
/// max_speed = 50.0
/// motor_time_constant = 0.2
/// noise_amplitude = 0.5
/// seed = 7
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    /// Distance to the obstacle at t = 0 [cm].
    pub initial_distance: f64,
    /// Speed at full-scale command [cm/s].
    pub max_speed: f64,
    /// Motor first-order lag [s].
    pub motor_time_constant: f64,
    /// Command magnitude that maps to `max_speed`.
    pub max_command: i32,
    /// Obstacle velocity, positive = moving away [cm/s].
    pub obstacle_speed: f64,
    /// Half-width of uniform measurement noise [cm]. 0 disables noise.
    pub noise_amplitude: f64,
    /// Noise generator seed.
    pub seed: u64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            initial_distance: 60.0,
            max_speed: 50.0,
            motor_time_constant: 0.2,
            max_command: 255,
            obstacle_speed: 0.0,
            noise_amplitude: 0.0,
            seed: 0,
        }
    }
}

impl RigConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("initial_distance", self.initial_distance, self.initial_distance >= 0.0),
            ("max_speed", self.max_speed, self.max_speed > 0.0),
            (
                "motor_time_constant",
                self.motor_time_constant,
                self.motor_time_constant > 0.0,
            ),
            ("noise_amplitude", self.noise_amplitude, self.noise_amplitude >= 0.0),
            ("obstacle_speed", self.obstacle_speed, true),
        ];
        for (name, value, ok) in checks {
            if !(value.is_finite() && ok) {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.{name} has invalid value {value}"
                )));
            }
        }
        if self.max_command <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation.max_command {} must be > 0",
                self.max_command
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct RigState {
    config: RigConfig,
    distance: f64,
    velocity: f64,
    command: i32,
    now_us: u64,
    collided: bool,
    sensor_fault: bool,
    rng: StdRng,
}

impl RigState {
    fn advance(&mut self, dt: Duration) {
        let dt_s = dt.as_secs_f64();
        let target = self.command as f64 / self.config.max_command as f64 * self.config.max_speed;
        // Explicit Euler on the motor lag; stable while dt < 2·tau.
        self.velocity += (target - self.velocity) * dt_s / self.config.motor_time_constant;
        self.distance += (self.config.obstacle_speed - self.velocity) * dt_s;
        if self.distance <= 0.0 {
            if !self.collided {
                warn!(
                    "Rig collided with obstacle at t={:.3}s",
                    self.now_us as f64 / 1e6
                );
            }
            self.distance = 0.0;
            self.velocity = 0.0;
            self.collided = true;
        }
        self.now_us += dt.as_micros() as u64;
        trace!(
            distance = self.distance,
            velocity = self.velocity,
            command = self.command,
            "rig step"
        );
    }
}

/// Shared simulated plant.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Rc<RefCell<RigState>>,
}

impl SimulatedRig {
    pub fn new(config: RigConfig) -> Self {
        debug!(
            "Simulated rig: start {:.1} cm, max speed {:.1} cm/s, tau {:.3} s",
            config.initial_distance, config.max_speed, config.motor_time_constant
        );
        Self {
            state: Rc::new(RefCell::new(RigState {
                config,
                distance: config.initial_distance,
                velocity: 0.0,
                command: 0,
                now_us: 0,
                collided: false,
                sensor_fault: false,
                rng: StdRng::seed_from_u64(config.seed),
            })),
        }
    }

    /// Ranging sensor handle.
    pub fn sensor(&self) -> RigSensor {
        RigSensor {
            state: Rc::clone(&self.state),
        }
    }

    /// Motor handle.
    pub fn motor(&self) -> RigMotor {
        RigMotor {
            state: Rc::clone(&self.state),
        }
    }

    /// Tick source running on simulated time.
    pub fn clock(&self, period_us: u64) -> RigClock {
        RigClock {
            state: Rc::clone(&self.state),
            gate: PeriodGate::new(period_us),
        }
    }

    /// Advance the physics by `dt`.
    pub fn step(&self, dt: Duration) {
        self.state.borrow_mut().advance(dt);
    }

    /// True distance to the obstacle [cm], without noise.
    pub fn distance(&self) -> f64 {
        self.state.borrow().distance
    }

    /// Vehicle velocity, positive = towards the obstacle [cm/s].
    pub fn velocity(&self) -> f64 {
        self.state.borrow().velocity
    }

    /// Command currently applied to the motor.
    pub fn command(&self) -> i32 {
        self.state.borrow().command
    }

    /// Simulated time since creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.state.borrow().now_us)
    }

    pub fn collided(&self) -> bool {
        self.state.borrow().collided
    }

    pub fn set_obstacle_speed(&self, speed: f64) {
        self.state.borrow_mut().config.obstacle_speed = speed;
    }

    /// Make every subsequent sensor read fail until cleared.
    pub fn set_sensor_fault(&self, fault: bool) {
        self.state.borrow_mut().sensor_fault = fault;
    }
}

/// Distance sensor of a [`SimulatedRig`].
#[derive(Debug)]
pub struct RigSensor {
    state: Rc<RefCell<RigState>>,
}

impl Sensor for RigSensor {
    fn read_distance(&mut self) -> Result<f64, HalError> {
        let mut state = self.state.borrow_mut();
        if state.sensor_fault {
            return Err(HalError::Sensor("simulated echo timeout".to_string()));
        }
        let amplitude = state.config.noise_amplitude;
        let noise = if amplitude > 0.0 {
            state.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        };
        Ok(state.distance + noise)
    }
}

/// Motor driver of a [`SimulatedRig`].
#[derive(Debug)]
pub struct RigMotor {
    state: Rc<RefCell<RigState>>,
}

impl Actuator for RigMotor {
    fn drive(&mut self, command: i32) -> Result<(), HalError> {
        let mut state = self.state.borrow_mut();
        let limit = state.config.max_command;
        state.command = command.clamp(-limit, limit);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HalError> {
        let mut state = self.state.borrow_mut();
        state.command = 0;
        state.velocity = 0.0;
        debug!("Rig motor stopped at {:.2} cm", state.distance);
        Ok(())
    }
}

/// Tick admission on the rig's simulated clock.
#[derive(Debug)]
pub struct RigClock {
    state: Rc<RefCell<RigState>>,
    gate: PeriodGate,
}

impl TimeBase for RigClock {
    fn tick_due(&mut self) -> bool {
        let now = self.state.borrow().now_us;
        self.gate.admit(now)
    }

    fn restart(&mut self) {
        self.gate.reset();
    }
}
