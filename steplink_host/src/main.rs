//! # steplink host
//!
//! Loads the host configuration, performs RT setup and runs the periodic
//! cycle against a link transport. Without a hardware transport the binary
//! runs against the in-process simulated device (`--simulate`), commanding a
//! slow sine on every axis.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use steplink_common::config::{ConfigError, ConfigLoader, LogLevel, Validate};
use steplink_common::consts::NUM_AXES;
use steplink_host::HostDriver;
use steplink_host::config::HostConfig;
use steplink_host::cycle::{CycleRunner, rt_setup};
use steplink_host::pins::HostPins;
use steplink_host::transport::{LinkTransport, SimTiming, SimulatedLink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sine amplitude of the simulated command [user units].
const DEMO_AMPLITUDE: f64 = 1.0;
/// Sine period of the simulated command [s].
const DEMO_PERIOD_S: f64 = 4.0;

/// steplink host: periodic stepper link driver
#[derive(Parser, Debug)]
#[command(name = "steplink_host")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Accel-limited stepper velocity planner and link driver")]
struct Args {
    /// Path to the host configuration TOML. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run against the in-process simulated device.
    #[arg(long)]
    simulate: bool,

    /// Stop after this many cycles.
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
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
    let config = load_config(&args);
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("steplink host v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("steplink host shutdown complete");
}

fn load_config(args: &Args) -> Result<HostConfig, ConfigError> {
    match &args.config {
        Some(path) => HostConfig::load_validated(path),
        None => {
            let config = HostConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn run(args: &Args, config: &HostConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        cycle_time_us = config.link.cycle_time_us,
        step_width = config.link.step_width,
        pwm_freq_hz = config.link.pwm_freq_hz,
        "config OK"
    );

    if !args.simulate {
        return Err("no hardware transport available in this build; use --simulate".into());
    }
    let link = SimulatedLink::new(SimTiming::for_cycle(config.link.cycle_time_us));
    run_with(args, config, link)
}

fn run_with<T: LinkTransport>(
    args: &Args,
    config: &HostConfig,
    transport: T,
) -> Result<(), Box<dyn std::error::Error>> {
    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let driver = HostDriver::new(config, transport)?;
    let mut runner = CycleRunner::new(
        driver,
        HostPins::from_config(config),
        config.link.cycle_time_ns(),
    );
    if let Some(n) = args.cycles {
        runner = runner.with_max_cycles(n);
    }

    let running = runner.running();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let dt = config.link.cycle_time().as_secs_f64();
    let omega = std::f64::consts::TAU / DEMO_PERIOD_S;
    runner.run(|pins, cycle| {
        let target = DEMO_AMPLITUDE * (omega * cycle as f64 * dt).sin();
        pins.position_cmd = [target; NUM_AXES];
        pins.motor_enable = true;
    })?;

    let (pins, stats) = runner.shutdown()?;
    info!(
        cycles = stats.cycle_count,
        overruns = stats.overruns,
        spi_fault = pins.spi_fault,
        position_fb = ?pins.position_fb,
        "final state"
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

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
