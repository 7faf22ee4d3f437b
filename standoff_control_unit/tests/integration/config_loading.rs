//! Integration test: configuration files on disk.

use std::io::Write;
use std::path::PathBuf;

use standoff_common::config::{ConfigError, LogLevel};
use standoff_common::control_unit::config::ControllerConfig;
use standoff_control_unit::config::{load_config, load_tuning_config};
use tempfile::NamedTempFile;

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join(name)
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn shipped_control_unit_config_is_firmware_tuning() {
    let cfg = load_config(&shipped("standoff.toml")).unwrap();
    assert_eq!(cfg.controller, ControllerConfig::default());
    assert_eq!(cfg.shared.service_name, "standoff");
    assert_eq!(cfg.shared.log_level, LogLevel::Info);
    assert_eq!(cfg.telemetry.interval_ticks, 50);
    let sim = cfg.simulation.unwrap();
    assert_eq!(sim.initial_distance, 60.0);
    assert_eq!(sim.seed, 1);
}

#[test]
fn shipped_tuning_config_loads() {
    let cfg = load_tuning_config(&shipped("tune.toml")).unwrap();
    assert_eq!(cfg.shared.service_name, "standoff-tune");
    assert_eq!(cfg.plant.denominator, vec![1.0, -1.9990, 0.9985]);
    assert_eq!(cfg.design.auxiliary_pole_multiple, 37.0);
    assert_eq!(cfg.targets.max_overshoot, 0.30);
}

#[test]
fn temp_file_round_trip() {
    let file = write_temp(
        r#"
[controller]
sample_period = 0.02
kp = 0.01

[safety]
minimum_safe_distance = 20.0
reference_setpoint = 80.0

[actuator]
max_command = 1000
invert_direction = false
"#,
    );
    let cfg = load_config(file.path()).unwrap();
    assert_eq!(cfg.controller.sample_period, 0.02);
    assert_eq!(cfg.controller.sample_period_us(), 20_000);
    let lc = cfg.loop_config();
    assert_eq!(lc.safety.reference_setpoint, 80.0);
    assert_eq!(lc.actuator.max_command, 1000);
    assert!(!lc.actuator.invert_direction);
}

#[test]
fn plausibility_ceiling_below_setpoint_is_rejected() {
    let file = write_temp(
        "[safety]\nreference_setpoint = 100.0\nmaximum_plausible_distance = 90.0\n",
    );
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn missing_file_is_reported() {
    let err = load_config(&PathBuf::from("/nonexistent/standoff.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn malformed_toml_is_parse_error() {
    let file = write_temp("[controller\nkp = ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn setpoint_below_minimum_is_rejected() {
    let file = write_temp("[safety]\nminimum_safe_distance = 50.0\nreference_setpoint = 40.0\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn bad_simulation_section_is_rejected() {
    let file = write_temp("[simulation]\nmotor_time_constant = -1.0\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn tuning_file_needs_design_section() {
    let file = write_temp("[targets]\nmax_overshoot = 0.3\nsettling_time = 3.0\n");
    assert!(matches!(
        load_tuning_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}
