//! # Standoff Control Unit
//!
//! Runs the distance control loop against the simulated rig.
//!
//! - Real-time mode (default): the loop is paced by the host clock and the
//!   rig physics advance by the wall time elapsed between iterations.
//! - Fast mode (`--fast`): no sleeping; the rig advances one sample period
//!   per iteration and the loop is admitted by the rig's simulated clock.
//!
//! Ctrl-C presses the operator button and ends the host loop; the motor is
//! stopped before exit.

use clap::Parser;
use standoff_common::config::LogLevel;
use standoff_common::hal::driver::{Diagnostics, TimeBase};
use standoff_control_unit::config::{LoadedConfig, load_config};
use standoff_control_unit::cycle::{ControlLoop, MonotonicTimeBase, TickOutcome, rt_setup};
use standoff_control_unit::diagnostics::{ChannelDiagnostics, TeeDiagnostics, TracingDiagnostics};
use standoff_hal::drivers::simulation::{LatchButton, RigConfig, SimulatedRig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Diagnostic events buffered ahead of the stdout writer thread.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Standoff Control Unit: fixed-rate distance controller
#[derive(Parser, Debug)]
#[command(name = "standoff_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-rate PID distance controller with safety interlock")]
struct Args {
    /// Path to the control-unit configuration TOML.
    #[arg(default_value = "config/standoff.toml")]
    config: PathBuf,

    /// Stop after this many seconds of (simulated) time.
    #[arg(long, value_name = "SECS")]
    duration: Option<f64>,

    /// Run as fast as possible on simulated time.
    #[arg(long)]
    fast: bool,

    /// Wait for Enter on stdin before starting instead of starting at once.
    #[arg(long)]
    manual_start: bool,

    /// Write diagnostic events as JSON lines to stdout.
    #[arg(long)]
    events_json: bool,

    /// CPU core to pin the control thread to.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let loaded = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            setup_tracing(&args, LogLevel::Info);
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, loaded.shared.log_level);

    info!(
        "Standoff Control Unit v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        loaded.shared.service_name
    );

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Standoff Control Unit shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: Ts={}s kp={} ki={} kd={} setpoint={} min={}",
        loaded.controller.sample_period,
        loaded.controller.kp,
        loaded.controller.ki,
        loaded.controller.kd,
        loaded.safety.reference_setpoint,
        loaded.safety.minimum_safe_distance,
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let rig_config = loaded.simulation.unwrap_or_else(|| {
        warn!("No [simulation] section, using default rig");
        RigConfig::default()
    });
    let rig = SimulatedRig::new(rig_config);

    let button = LatchButton::new(false);
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let handle = button.handle();
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
            handle.press();
        })?;
    }

    if args.manual_start {
        info!("Press Enter to start the control session");
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
    }
    button.press();

    let tracing_sink = TracingDiagnostics::new(loaded.shared.service_name.clone());
    let mut event_writer = None;
    let diagnostics: Box<dyn Diagnostics> = if args.events_json {
        let (events, worker) =
            ChannelDiagnostics::spawn(std::io::stdout(), EVENT_QUEUE_CAPACITY)?;
        event_writer = Some(worker);
        Box::new(TeeDiagnostics::new(tracing_sink, events))
    } else {
        Box::new(tracing_sink)
    };

    let period = Duration::from_micros(loaded.controller.sample_period_us());
    let limit = args.duration.map(Duration::from_secs_f64);

    let result = if args.fast {
        let clock = rig.clock(loaded.controller.sample_period_us());
        let control = ControlLoop::new(
            loaded.loop_config(),
            rig.sensor(),
            rig.motor(),
            clock,
            button,
            diagnostics,
        );
        drive(control, &rig, period, limit, &shutdown, true)
    } else {
        let control = ControlLoop::new(
            loaded.loop_config(),
            rig.sensor(),
            rig.motor(),
            MonotonicTimeBase::new(period),
            button,
            diagnostics,
        );
        drive(control, &rig, period, limit, &shutdown, false)
    };

    // The loop, and with it the event sender, is gone; let the writer drain.
    if let Some(worker) = event_writer {
        if worker.join().is_err() {
            warn!("Event writer thread panicked");
        }
    }
    result
}

type RigLoop<T> = ControlLoop<
    standoff_hal::drivers::simulation::RigSensor,
    standoff_hal::drivers::simulation::RigMotor,
    T,
    LatchButton,
    Box<dyn Diagnostics>,
>;

/// Host loop: advance the rig, tick, pace.
fn drive<T: TimeBase>(
    mut control: RigLoop<T>,
    rig: &SimulatedRig,
    period: Duration,
    limit: Option<Duration>,
    shutdown: &AtomicBool,
    fast: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last = Instant::now();
    let mut next_wake = last;

    loop {
        let iteration_start = Instant::now();
        if fast {
            rig.step(period);
        } else {
            rig.step(iteration_start - last);
            last = iteration_start;
        }

        if let TickOutcome::SafetyStop(trip) = control.tick() {
            warn!(
                "Safety stop at t={:.2}s: {trip}; press Ctrl-C to exit",
                rig.elapsed().as_secs_f64()
            );
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        if limit.is_some_and(|l| rig.elapsed() >= l) {
            info!("Run duration reached");
            break;
        }

        if !fast {
            // Absolute schedule, no drift; admission stays with the TimeBase.
            next_wake += period;
            if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                std::thread::sleep(remaining);
            }
        }
    }

    control.shutdown();

    let stats = control.stats();
    info!(
        "Ran {:.2}s: {} control cycles, {} evaluations, {} safety stops, {} overruns, \
         avg step {}ns (max {}ns), final distance {:.2} cm",
        rig.elapsed().as_secs_f64(),
        stats.control_cycles,
        stats.evaluations,
        stats.safety_stops,
        stats.overruns,
        stats.avg_body_ns(),
        stats.max_body_ns,
        rig.distance()
    );
    if stats.diagnostic_failures > 0 {
        warn!("{} diagnostic events were dropped", stats.diagnostic_failures);
    }
    Ok(())
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
