//! Sensor Sampler. See spec §4.A.
//!
//! Grounded on `readSensors` in `examples/original_source/src/acs.c`: the
//! magnetometer-then-three-mux-channels-then-fine-sun-then-mux-disable
//! ordering, and the per-channel "all reads failed" latch rule, are carried
//! over exactly; the per-channel-to-lux-id mapping (channel 0 -> css[0..2],
//! channel 1 -> css[3..5], channel 2 -> css[6]) matches the original wiring.

use tracing::warn;

use crate::drivers::DeviceSet;
use crate::drivers::mux::MUX_DISABLE;
use crate::sensor_frame::{CssReadings, FineSunReading, MuxSkipMask, SensorFrame, mag_to_body_field};

/// Lux sensor ids read on each of the three mux channels.
const CHANNEL_SENSOR_IDS: [&[u8]; 3] = [&[0, 1, 2], &[3, 4, 5], &[6]];

/// Produces one `SensorFrame`. A mux channel whose every lux read fails
/// latches into `mux_skip` and is skipped entirely on subsequent calls,
/// until process restart (spec §4.A, §3.3).
pub fn sample(devices: &mut DeviceSet, mux_skip: &mut MuxSkipMask) -> Result<SensorFrame, crate::error::SampleError> {
    let mut b_field = crate::vector3::Vector3::<f64>::ZERO;
    let mag_read_failed = match devices.mag.read_mag() {
        Ok([x, y, z]) => {
            b_field = mag_to_body_field(x, y, z);
            false
        }
        Err(e) => {
            warn!(error = %e, "magnetometer read failed");
            true
        }
    };

    let mut css: CssReadings = [0; 7];
    for (channel, sensor_ids) in CHANNEL_SENSOR_IDS.iter().enumerate() {
        let mask = MuxSkipMask::for_channel(channel as u8);
        if mux_skip.contains(mask) {
            continue;
        }
        if let Err(e) = devices.mux.select(channel as u8) {
            warn!(error = %e, channel = channel as u64, "mux channel select failed");
            continue;
        }

        let mut any_ok = false;
        for &sensor_id in *sensor_ids {
            match devices.lux.measure(sensor_id) {
                Ok(reading) => {
                    css[sensor_id as usize] = (reading & 0xffff) as u16;
                    any_ok = true;
                }
                Err(e) => warn!(error = %e, sensor_id = sensor_id as u64, "lux read failed"),
            }
        }
        if !any_ok {
            warn!(channel = channel as u64, "every lux read on channel failed, latching skip");
            *mux_skip |= mask;
        }
    }

    let (theta_x_deg, theta_y_deg, status) = match devices.fine_sun.read() {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "fine sun sensor read failed");
            (0.0, 0.0, crate::sensor_frame::SunStatus::DIV_ZERO)
        }
    };

    if let Err(e) = devices.mux.select(MUX_DISABLE) {
        warn!(error = %e, "mux disable failed");
    }

    Ok(SensorFrame {
        b_field,
        css,
        fine_sun: FineSunReading { theta_x_deg, theta_y_deg, status },
        mux_skip: *mux_skip,
        mag_read_failed,
    })
}
