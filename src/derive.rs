//! Derivation pipeline: Ḃ by first difference, ω by consecutive Ḃ samples,
//! and the sun vector from fine- or coarse-sun readings. See spec §4.D.

use crate::buffers::DerivedBuffers;
use crate::error::SampleError;
use crate::filter::Filter;
use crate::sensor_frame::{CssReadings, FineSunReading};
use crate::vector3::Vector3;

/// One tick's worth of freshly-derived values, for the filter and mode
/// controller to consume. `bt`/`w` are `None` on ticks where there isn't yet
/// enough history (spec §4.B's "iff at least two ... samples").
pub struct DerivationOutcome {
    pub bt: Option<Vector3<f64>>,
    pub w: Option<Vector3<f32>>,
    pub s: Vector3<f32>,
    pub night: bool,
}

/// Runs the B -> Bt -> W chain and the independent sun-vector derivation for
/// one tick, writing into `buffers` in the order spec §4.B requires.
///
/// The Bessel filter (spec §4.C) is applied in place once on B just after
/// insertion, once on Bt just after insertion, and once on W just after
/// computation, mirroring `APPLY_DBESSEL`/`APPLY_FBESSEL` in
/// `examples/original_source/include/bessel.h`: each channel's buffer holds
/// filtered values from here on, not raw samples. `S` is never filtered.
pub fn run(
    buffers: &mut DerivedBuffers,
    b_filter: &Filter<64>,
    bt_filter: &Filter<64>,
    w_filter: &Filter<64>,
    b_field: Vector3<f64>,
    fine_sun: FineSunReading,
    css: CssReadings,
    tstep_us: u64,
    css_lux_threshold: f64,
) -> Result<DerivationOutcome, SampleError> {
    if !b_field.is_finite() {
        return Err(SampleError::NonFinite { channel: "B" });
    }
    buffers.b.push(b_field);
    buffers.b.set_latest(b_filter.apply(&buffers.b));

    let bt = derive_bdot(buffers, tstep_us);
    if let Some(bt) = bt {
        if !bt.is_finite() {
            return Err(SampleError::NonFinite { channel: "Bt" });
        }
        buffers.bt.push(bt);
        buffers.bt.set_latest(bt_filter.apply(&buffers.bt));
    }

    let w = derive_omega(buffers, tstep_us);
    if let Some(w) = w {
        if !w.is_finite() {
            return Err(SampleError::NonFinite { channel: "W" });
        }
        buffers.w.push(w);
        buffers.w.set_latest(w_filter.apply(&buffers.w));
    }

    let (s, night) = derive_sun(fine_sun, css, css_lux_threshold);
    if !s.is_finite() {
        return Err(SampleError::NonFinite { channel: "S" });
    }
    buffers.s.push(s);

    Ok(DerivationOutcome { bt: bt.and(buffers.bt.latest()), w: w.and(buffers.w.latest()), s, night })
}

/// `Bt[head] = (B[m1] - B[m0]) / Δt`, once at least two B samples exist.
fn derive_bdot(buffers: &DerivedBuffers, tstep_us: u64) -> Option<Vector3<f64>> {
    if buffers.b.len() < 2 {
        return None;
    }
    let m1 = buffers.b.get(0)?;
    let m0 = buffers.b.get(1)?;
    let dt_seconds = tstep_us as f64 / 1_000_000.0;
    Some((m1 - m0) / dt_seconds)
}

/// `W[head] = (Bt[m1] x Bt[m0]) * (1/Δt) / ‖Bt[m0]‖²`, once at least two Bt
/// samples exist. The inertia-coupling correction term is omitted (spec §9);
/// see `control` for the tunable that would re-enable it.
fn derive_omega(buffers: &DerivedBuffers, tstep_us: u64) -> Option<Vector3<f32>> {
    if buffers.bt.len() < 2 {
        return None;
    }
    let m1 = buffers.bt.get(0)?;
    let m0 = buffers.bt.get(1)?;
    let freq = 1_000_000.0 / tstep_us as f64;
    let norm2 = m0.norm_squared();
    if norm2 == 0.0 {
        return Some(Vector3::<f32>::ZERO);
    }
    let w = (m1.cross(m0) * (freq / norm2)).to_f32();
    Some(w)
}

/// Sun vector from the fine sensor when it reports no error bits, otherwise
/// from differential coarse-sun illuminance, with night detection.
fn derive_sun(fine_sun: FineSunReading, css: CssReadings, css_lux_threshold: f64) -> (Vector3<f32>, bool) {
    if fine_sun.status.is_ok() {
        let theta_x = -(fine_sun.theta_x_deg as f64) * std::f64::consts::PI / 180.0;
        let theta_y = -(fine_sun.theta_y_deg as f64) * std::f64::consts::PI / 180.0;
        let s = Vector3::new(theta_x.tan(), theta_y.tan(), 1.0).normalize().to_f32();
        return (s, false);
    }

    let znavg = (css[5] as f64 + css[6] as f64) / 2.0;
    let raw = Vector3::new(
        css[0] as f64 - css[1] as f64,
        css[2] as f64 - css[3] as f64,
        css[4] as f64 - znavg,
    );
    if raw.norm() < css_lux_threshold {
        (Vector3::<f32>::ZERO, true)
    } else {
        (raw.normalize().to_f32(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_frame::SunStatus;

    fn frame_ok(tx: f32, ty: f32) -> FineSunReading {
        FineSunReading { theta_x_deg: tx, theta_y_deg: ty, status: SunStatus::empty() }
    }

    #[test]
    fn bdot_requires_two_b_samples() {
        let mut buffers = DerivedBuffers::new();
        buffers.b.push(Vector3::new(1.0, 0.0, 0.0));
        assert!(derive_bdot(&buffers, 100_000).is_none());
        buffers.b.push(Vector3::new(2.0, 0.0, 0.0));
        assert!(derive_bdot(&buffers, 100_000).is_some());
    }

    #[test]
    fn omega_requires_two_bt_samples() {
        let mut buffers = DerivedBuffers::new();
        buffers.bt.push(Vector3::new(1.0, 0.0, 0.0));
        assert!(derive_omega(&buffers, 100_000).is_none());
        buffers.bt.push(Vector3::new(0.0, 1.0, 0.0));
        assert!(derive_omega(&buffers, 100_000).is_some());
    }

    #[test]
    fn fine_sun_path_used_when_status_ok() {
        let (s, night) = derive_sun(frame_ok(0.0, 0.0), [0; 7], 20_000.0);
        assert!(!night);
        assert!((s.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn coarse_path_used_on_fine_sun_error() {
        let err = FineSunReading { theta_x_deg: 0.0, theta_y_deg: 0.0, status: SunStatus::DIV_ZERO };
        let css: CssReadings = [30_000, 0, 0, 0, 30_000, 0, 0];
        let (s, night) = derive_sun(err, css, 20_000.0);
        assert!(!night);
        assert!(s.x > 0.0);
    }

    #[test]
    fn below_threshold_coarse_reading_is_night() {
        let err = FineSunReading { theta_x_deg: 0.0, theta_y_deg: 0.0, status: SunStatus::DIV_ZERO };
        let css: CssReadings = [1, 1, 1, 1, 1, 1, 1];
        let (s, night) = derive_sun(err, css, 20_000.0);
        assert!(night);
        assert_eq!(s, Vector3::<f32>::ZERO);
    }

    #[test]
    fn nan_b_field_is_rejected() {
        let mut buffers = DerivedBuffers::new();
        let frame = frame_ok(0.0, 0.0);
        let (bf, btf, wf) = filters();
        let result = run(&mut buffers, &bf, &btf, &wf, Vector3::new(f64::NAN, 0.0, 0.0), frame, [0; 7], 100_000, 20_000.0);
        assert!(result.is_err());
    }

    fn filters() -> (Filter<64>, Filter<64>, Filter<64>) {
        (Filter::new(), Filter::new(), Filter::new())
    }

    #[test]
    fn constant_b_field_filters_to_itself_in_place() {
        // The in-place filter feeds its own prior output back in (mirroring
        // `APPLY_DBESSEL`'s read-then-overwrite-same-slot recursion), so a
        // constant input converges toward itself gradually rather than
        // landing there after one buffer fill; run well past that settling
        // time rather than asserting tight convergence after only N ticks.
        let mut buffers = DerivedBuffers::new();
        let frame = frame_ok(0.0, 0.0);
        let (bf, btf, wf) = filters();
        for _ in 0..1000 {
            run(&mut buffers, &bf, &btf, &wf, Vector3::new(1.0, -2.0, 0.5), frame, [0; 7], 100_000, 20_000.0).unwrap();
        }
        let b = buffers.b.latest().unwrap();
        assert!((b.x - 1.0).abs() < 1e-3);
        assert!((b.y + 2.0).abs() < 1e-3);
        assert!((b.z - 0.5).abs() < 1e-3);
    }
}
