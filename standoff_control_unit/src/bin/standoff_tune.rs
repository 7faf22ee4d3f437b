//! # Standoff Tune
//!
//! Offline gain design report: requirements from the performance targets,
//! pole-placement gains for the configured plant, Jury verdicts for the
//! open and closed loop, and step-response metrics checked against the
//! targets. Also reports the same analysis for the gains currently in the
//! control-unit defaults.

use clap::Parser;
use serde::Serialize;
use standoff_common::control_unit::config::ControllerConfig;
use standoff_control_unit::config::{TuningConfig, load_tuning_config};
use standoff_control_unit::control::response::{StepMetrics, step_response};
use standoff_control_unit::control::stability::jury_stable;
use standoff_control_unit::control::tuning::{
    DesignedGains, SecondOrderPlant, closed_loop_characteristic, design_gains,
};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Standoff Tune: pole-placement PID design for the distance plant
#[derive(Parser, Debug)]
#[command(name = "standoff_tune")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Offline PID gain design and closed-loop validation")]
struct Args {
    /// Path to the tuning configuration TOML.
    #[arg(default_value = "config/tune.toml")]
    config: PathBuf,

    /// Step-response length in samples.
    #[arg(long, default_value_t = 600)]
    samples: usize,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Analysis of one gain set.
#[derive(Debug, Serialize)]
struct GainReport {
    gains: DesignedGains,
    characteristic: [f64; 5],
    stable: bool,
    step: Option<StepMetrics>,
    meets_targets: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    min_damping_ratio: f64,
    min_natural_frequency: f64,
    open_loop_stable: bool,
    dc_gain: Option<f64>,
    desired_poles: [f64; 4],
    designed: GainReport,
    deployed: GainReport,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_tuning_config(&args.config)?;
    info!("Loaded tuning config from {}", args.config.display());

    let report = analyze(&config, args.samples)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&config, &report);
    }

    if !report.designed.stable {
        warn!("Designed closed loop is not stable");
    }
    if !report.deployed.stable {
        warn!("Deployed controller gains do not stabilize the plant");
    }
    Ok(())
}

fn analyze(config: &TuningConfig, samples: usize) -> Result<Report, Box<dyn std::error::Error>> {
    let plant = SecondOrderPlant::try_from(&config.plant)?;
    let zeta_min = config.targets.min_damping_ratio();
    let wn_min = config.targets.min_natural_frequency(zeta_min);

    if config.design.damping_ratio < zeta_min {
        warn!(
            "Design damping {} below overshoot requirement {zeta_min:.4}",
            config.design.damping_ratio
        );
    }
    if config.design.natural_frequency < wn_min {
        warn!(
            "Design natural frequency {} below settling requirement {wn_min:.4}",
            config.design.natural_frequency
        );
    }

    let poles = config.design.poles(plant.sample_period);
    let designed = design_gains(&plant, &config.design)?;
    let deployed = DesignedGains::from(&ControllerConfig::default());

    Ok(Report {
        min_damping_ratio: zeta_min,
        min_natural_frequency: wn_min,
        open_loop_stable: jury_stable(&plant.denominator()),
        dc_gain: config.plant.dc_gain(),
        desired_poles: [poles.radius, poles.angle, poles.auxiliary, poles.origin],
        designed: gain_report(config, &plant, designed, samples),
        deployed: gain_report(config, &plant, deployed, samples),
    })
}

fn gain_report(
    config: &TuningConfig,
    plant: &SecondOrderPlant,
    gains: DesignedGains,
    samples: usize,
) -> GainReport {
    let characteristic = closed_loop_characteristic(plant, &gains);
    let stable = jury_stable(&characteristic);
    let step = step_response(plant, &gains, samples).metrics();
    let meets_targets = stable
        && step.is_some_and(|m| {
            m.overshoot_percent <= config.targets.max_overshoot * 100.0
                && m.settling_time <= config.targets.settling_time
        });
    GainReport {
        gains,
        characteristic,
        stable,
        step,
        meets_targets,
    }
}

fn print_report(config: &TuningConfig, report: &Report) {
    let t = &config.targets;
    println!("== Requirements ==");
    println!(
        "  overshoot <= {:.1} %  ->  zeta >= {:.4}",
        t.max_overshoot * 100.0,
        report.min_damping_ratio
    );
    println!(
        "  settling  <= {:.2} s  ->  wn >= {:.4} rad/s",
        t.settling_time, report.min_natural_frequency
    );
    println!();
    println!("== Plant ==");
    println!("  numerator   {:?}", config.plant.numerator);
    println!("  denominator {:?}", config.plant.denominator);
    match report.dc_gain {
        Some(g) => println!("  DC gain     {g:.4}"),
        None => println!("  DC gain     (pole at z = 1)"),
    }
    println!("  open loop   {}", verdict(report.open_loop_stable));
    println!();
    println!("== Desired poles ==");
    let [r, theta, z3, z4] = report.desired_poles;
    println!("  dominant    {r:.6} ∠ ±{theta:.6} rad");
    println!("  auxiliary   {z3:.6}");
    println!("  origin      {z4:.6}");
    println!();
    print_gains("Designed gains", &report.designed);
    print_gains("Deployed gains", &report.deployed);
}

fn print_gains(title: &str, report: &GainReport) {
    println!("== {title} ==");
    println!(
        "  Kp = {:.10}  Ki = {:.10}  Kd = {:.10}",
        report.gains.kp, report.gains.ki, report.gains.kd
    );
    println!("  characteristic {:?}", report.characteristic);
    println!("  closed loop    {}", verdict(report.stable));
    if let Some(m) = report.step {
        println!(
            "  step: peak {:.4}, final {:.4}, overshoot {:.2} %, settling {:.2} s, max |u| {:.3}",
            m.peak, m.final_value, m.overshoot_percent, m.settling_time, m.peak_control
        );
    }
    println!(
        "  targets        {}",
        if report.meets_targets { "met" } else { "NOT met" }
    );
    println!();
}

fn verdict(stable: bool) -> &'static str {
    if stable { "stable (Jury)" } else { "UNSTABLE (Jury)" }
}

fn setup_tracing(args: &Args) {
    let directive = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
