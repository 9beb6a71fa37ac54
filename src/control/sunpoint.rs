//! Z-axis PWM sunpoint law. See spec §4.G.
//!
//! Grounded on `sunpointAction` in `examples/original_source/src/acs.c`: the
//! S_B_hat/L_B_hat projection, the triple-product steering signal, the gain
//! and quantization arithmetic, and the repeat-until-budget-exhausted firing
//! loop are carried over exactly.

use std::time::Duration;

use crate::drivers::hbridge::{Direction, HBridge};
use crate::tunables::Matrix3;
use crate::vector3::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmPlan {
    pub direction: Direction,
    /// On-time within one `sunpoint_duty_us` window, after quantization.
    pub on_us: u64,
    pub off_us: u64,
    pub duty_us: u64,
    pub budget_us: u64,
}

/// Computes the quantized on/off schedule from the current B, ω, and sun
/// vector. Pure and side-effect-free so it can be unit tested without a
/// driver.
pub fn compute_plan(
    b_now: Vector3<f64>,
    w_now: Vector3<f32>,
    s_now: Vector3<f32>,
    moi: Matrix3,
    duty_us: u64,
    budget_us: u64,
) -> PwmPlan {
    let b_hat = b_now.normalize();
    let l = moi.mul_vec(w_now.to_f64());

    let s = s_now.to_f64();
    let s_perp = (s - b_hat * s.dot(b_hat)).normalize();
    let l_perp = (l - b_hat * l.dot(b_hat)).normalize();

    let sigma = s_perp.cross(l_perp).dot(b_hat);
    let gain = (32.0 * s.z.abs()).round().max(1.0);
    let t_on_raw = sigma * duty_us as f64 * gain;

    let direction = if t_on_raw >= 0.0 { Direction::Positive } else { Direction::Negative };
    let mut t_on = t_on_raw.abs();

    t_on = t_on.min(duty_us as f64);
    if (2_500.0..5_000.0).contains(&t_on) {
        t_on = 5_000.0;
    }
    t_on = 10_000.0 * (t_on / 10_000.0).round();
    let on_us = ((t_on as u64) / 5_000) * 5_000;

    let off_us = duty_us.saturating_sub(on_us);

    PwmPlan { direction, on_us, off_us, duty_us, budget_us }
}

/// Repeatedly fires +Z/-Z for `on_us`, disables for `off_us`, until the
/// actuation budget is exhausted, then disables (spec §4.G step 8).
pub fn execute(hbridge: &mut dyn HBridge, plan: PwmPlan) {
    let mut remaining = plan.budget_us as i64;
    while remaining > 0 {
        hbridge.set_output(2, plan.direction);
        let _ = hbridge.exec();
        std::thread::sleep(Duration::from_micros(plan.on_us.max(1)));
        if plan.off_us > 0 {
            hbridge.disable(2);
            std::thread::sleep(Duration::from_micros(plan.off_us));
        }
        remaining -= plan.duty_us as i64;
    }
    hbridge.disable(2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_time_is_multiple_of_5000() {
        let plan = compute_plan(
            Vector3::new(100.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.2),
            Matrix3::diagonal(0.02, 0.02, 0.02),
            20_000,
            900_000,
        );
        assert_eq!(plan.on_us % 5_000, 0);
        assert_eq!(plan.on_us + plan.off_us, plan.duty_us);
    }

    #[test]
    fn on_time_clamped_to_duty_cycle() {
        let plan = compute_plan(
            Vector3::new(0.0, 100.0, 0.0),
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::new(1.0, 0.0, 0.0),
            Matrix3::diagonal(0.02, 0.02, 0.02),
            20_000,
            900_000,
        );
        assert!(plan.on_us <= plan.duty_us);
    }

    struct RecordingHBridge {
        sets: Vec<Direction>,
        disables: usize,
    }
    impl HBridge for RecordingHBridge {
        fn set_output(&mut self, _axis: usize, direction: Direction) {
            self.sets.push(direction);
        }
        fn exec(&mut self) -> Result<(), crate::error::DriverError> {
            Ok(())
        }
        fn disable(&mut self, _axis: usize) {
            self.disables += 1;
        }
    }

    #[test]
    fn execute_repeats_until_budget_exhausted() {
        let plan = PwmPlan { direction: Direction::Positive, on_us: 5_000, off_us: 15_000, duty_us: 20_000, budget_us: 45_000 };
        let mut hb = RecordingHBridge { sets: vec![], disables: 0 };
        execute(&mut hb, plan);
        // 45_000 / 20_000 budget => 3 iterations before the loop exits.
        assert_eq!(hb.sets.len(), 3);
    }
}
