//! Fixed-period scheduler: the `main` event loop. See spec §4.H.
//!
//! Generalizes the teacher's RTIC timer ISR (`update_isr`) into a single
//! `std::thread`-driven cooperative loop using `Instant`/`thread::sleep`,
//! per spec §5 ("single cooperative worker... suspension points only at
//! sleep calls"). Dispatch on `ControlState` is a plain `match` (spec §9:
//! "no virtual dispatch is required").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::control::{detumble, sunpoint};
use crate::core_state::ControlCore;
use crate::derive;
use crate::drivers::DeviceSet;
use crate::mode::ControlState;
use crate::sampler;
use crate::telemetry::{SharedSnapshot, TelemetrySnapshot, mode_byte};

fn now_us() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_micros() as u64
}

/// Runs ticks until `shutdown` is set, then tears down devices and returns.
pub fn run(devices: &mut DeviceSet, core: &mut ControlCore, snapshot: &SharedSnapshot, shutdown: &Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        run_tick(devices, core, snapshot);
    }

    devices.mux.disable().ok();
    devices.hbridge.disable_all();
    info!("loop driver shut down cleanly");
}

/// One tick, in the exact order of spec §4.H.
fn run_tick(devices: &mut DeviceSet, core: &mut ControlCore, snapshot: &SharedSnapshot) {
    let t_s = Instant::now();
    core.tick += 1;

    let frame = sampler::sample(devices, &mut core.mux_skip);
    let derivation = frame.as_ref().ok().and_then(|frame| {
        derive::run(
            &mut core.buffers,
            &core.b_filter,
            &core.bt_filter,
            &core.w_filter,
            frame.b_field,
            frame.fine_sun,
            frame.css,
            core.tunables.tstep_us(),
            core.tunables.css_lux_threshold(),
        )
        .ok()
    });

    if frame.is_err() || derivation.is_none() {
        warn!("sample or derivation failed, flushing buffers and forcing NIGHT");
        core.flush_and_force_night();
    }

    publish_snapshot(core, snapshot);

    if core.buffers.w.is_filled() && core.buffers.s.is_filled() {
        let omega_mean = core.buffers.mean_w();
        let sun_latest = core.buffers.s.latest().unwrap_or(crate::vector3::Vector3::<f32>::ZERO);
        core.mode.step(
            omega_mean,
            sun_latest,
            core.tunables.wtarget_z(),
            core.tunables.leeway_factor(),
            core.tunables.min_detumble_angle_deg(),
            core.tunables.min_sun_angle_deg(),
        );
    }

    let tstep_us = core.tunables.tstep_us();
    let measure_us = core.tunables.measure_us();
    let elapsed = t_s.elapsed();

    let measure_remaining = measure_us as i64 - elapsed.as_micros() as i64;
    if measure_remaining < 0 {
        warn!("measurement phase overran budget, skipping actuation this cycle");
        let residual = (tstep_us as i64 - elapsed.as_micros() as i64).max(0) as u64;
        std::thread::sleep(Duration::from_micros(residual));
        return;
    }
    std::thread::sleep(Duration::from_micros(measure_remaining as u64));

    let budget_us = tstep_us - measure_us;
    match core.mode.state {
        ControlState::Detumble => match (core.buffers.b.latest(), core.buffers.w.latest()) {
            (Some(b_now), Some(w_now)) => {
                let plan = detumble::compute_plan(
                    b_now,
                    w_now,
                    core.tunables.moi(),
                    core.tunables.wtarget_z(),
                    core.tunables.dipole_moment(),
                    core.tunables.min_fire_us(),
                    budget_us,
                );
                detumble::execute(&mut *devices.hbridge, plan);
            }
            _ => {
                warn!("B/W buffers not yet populated, idling detumble this tick");
                std::thread::sleep(Duration::from_micros(budget_us));
            }
        },
        ControlState::Sunpoint => match (core.buffers.b.latest(), core.buffers.w.latest(), core.buffers.s.latest()) {
            (Some(b_now), Some(w_now), Some(s_now)) => {
                let plan = sunpoint::compute_plan(b_now, w_now, s_now, core.tunables.moi(), core.tunables.sunpoint_duty_us(), budget_us);
                sunpoint::execute(&mut *devices.hbridge, plan);
            }
            _ => {
                warn!("B/W/S buffers not yet populated, idling sunpoint this tick");
                std::thread::sleep(Duration::from_micros(budget_us));
            }
        },
        ControlState::Night | ControlState::Ready | ControlState::XbandReady => {
            std::thread::sleep(Duration::from_micros(budget_us));
        }
    }
}

fn publish_snapshot(core: &ControlCore, snapshot: &SharedSnapshot) {
    let b = core.buffers.b.latest().unwrap_or(crate::vector3::Vector3::<f64>::ZERO).to_f32();
    let bt = core.buffers.bt.latest().unwrap_or(crate::vector3::Vector3::<f64>::ZERO).to_f32();
    let w = core.buffers.w.latest().unwrap_or(crate::vector3::Vector3::<f32>::ZERO);
    let s = core.buffers.s.latest().unwrap_or(crate::vector3::Vector3::<f32>::ZERO);

    let snap = TelemetrySnapshot {
        tick: core.tick,
        t_now_us: now_us(),
        t_start_us: core.t_start_us,
        mode: mode_byte(core.mode.state),
        b,
        bt,
        w,
        s,
    };
    *snapshot.lock().unwrap() = snap;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::sim::Sim;
    use crate::tunables::Tunables;

    fn device_set(sim: &Sim) -> DeviceSet {
        DeviceSet {
            mag: Box::new(sim.magnetometer()),
            mux: Box::new(sim.mux()),
            lux: Box::new(sim.lux()),
            fine_sun: Box::new(sim.fine_sun()),
            hbridge: Box::new(sim.hbridge()),
        }
    }

    #[test]
    fn a_handful_of_ticks_run_without_panicking() {
        let mut tunables = Tunables::default();
        tunables.set_tstep_ms(100);
        tunables.set_measure_ms(20);
        let mut core = ControlCore::new(tunables, 0);
        let sim = Sim::new(crate::vector3::Vector3::new(0.0, 0.0, 0.2));
        let mut devices = device_set(&sim);
        let snapshot = crate::telemetry::shared_snapshot();

        for _ in 0..5 {
            run_tick(&mut devices, &mut core, &snapshot);
        }
        assert_eq!(core.tick, 5);
    }
}
