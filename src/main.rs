//! Attitude control core binary. See spec §6.9.
//!
//! No flags: this is a daemon, not a CLI tool with subcommands (configuration
//! is through tunable setters invoked by the out-of-scope command peer).
//! Exit codes: 0 on clean shutdown, a distinct non-zero code per failed
//! init subsystem (`error::InitError::exit_code`).

mod bootcount;
mod buffers;
mod control;
mod core_state;
mod derive;
mod drivers;
mod error;
mod filter;
mod loop_driver;
mod mode;
mod ring;
mod sampler;
mod sensor_frame;
mod telemetry;
mod tunables;
mod vector3;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use core_state::ControlCore;
use drivers::DeviceSet;
use drivers::sim::Sim;
use error::InitError;
use tunables::Tunables;
use vector3::Vector3;

const BOOTCOUNT_PATH: &str = "bootcount.txt";
const TUNABLES_PATH: &str = "tunables.toml";
const TELEMETRY_ADDR: &str = "127.0.0.1:7878";

fn init_devices() -> Result<DeviceSet, InitError> {
    // Real I²C/SPI bus access is out of scope (spec §1): these traits are
    // the external-interface boundary, and the simulated backend is what
    // stands in for the hardware this process doesn't own.
    let sim = Sim::new(Vector3::new(0.05, -0.03, 0.4));
    Ok(DeviceSet {
        mag: Box::new(sim.magnetometer()),
        mux: Box::new(sim.mux()),
        lux: Box::new(sim.lux()),
        fine_sun: Box::new(sim.fine_sun()),
        hbridge: Box::new(sim.hbridge()),
    })
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let exit_code = match run() {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "init failed");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), InitError> {
    let boot = bootcount::increment(Path::new(BOOTCOUNT_PATH))?;
    info!(boot, "bootcount incremented");

    let tunables = Tunables::load_from_path(Path::new(TUNABLES_PATH)).unwrap_or_default();

    let mut devices = init_devices()?;
    let t_start_us = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    let mut core = ControlCore::new(tunables, t_start_us);

    if boot == 1 {
        info!("first boot: warm-up pulse on all three axes");
        let min_fire_us = core.tunables.min_fire_us();
        for axis in 0..3 {
            devices.hbridge.set_output(axis, drivers::hbridge::Direction::Positive);
        }
        let _ = devices.hbridge.exec();
        std::thread::sleep(std::time::Duration::from_micros(min_fire_us));
        devices.hbridge.disable_all();
    }

    let snapshot = telemetry::shared_snapshot();
    if let Err(e) = telemetry::spawn_publisher(TELEMETRY_ADDR, snapshot.clone(), std::time::Duration::from_millis(100)) {
        error!(error = %e, "telemetry publisher failed to bind, continuing without it");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })
    .expect("failed to install signal handler");

    loop_driver::run(&mut devices, &mut core, &snapshot, &shutdown);

    Ok(())
}
