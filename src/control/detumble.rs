//! Bang-bang detumble law. See spec §4.F.
//!
//! Grounded on `detumbleAction` in `examples/original_source/src/acs.c`:
//! the firing-direction-then-firing-time derivation, the three-element
//! insertion sort, and the sequential axis-disable schedule are carried over
//! exactly; only the vector/matrix plumbing and the sleep mechanism change.

use std::time::Duration;

use crate::drivers::hbridge::{Direction, HBridge};
use crate::tunables::Matrix3;
use crate::vector3::Vector3;

/// Per-axis firing direction and firing duration, before sorting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiringPlan {
    pub directions: [Direction; 3],
    /// Clamped firing time in microseconds, axis-indexed (0=x, 1=y, 2=z).
    pub firing_us: [u64; 3],
    /// Budget for the whole actuation phase (`tstep_us - measure_us`).
    pub budget_us: u64,
}

/// Computes the firing plan from the current B/ω and the momentum-error
/// target. Pure and side-effect-free so it can be unit tested without a
/// driver.
pub fn compute_plan(
    b_now: Vector3<f64>,
    w_now: Vector3<f32>,
    moi: Matrix3,
    wtarget_z: f64,
    dipole_moment: f64,
    min_fire_us: u64,
    budget_us: u64,
) -> FiringPlan {
    let w_now = w_now.to_f64();
    let l_target = moi.mul_vec(Vector3::new(0.0, 0.0, wtarget_z));
    let l_now = moi.mul_vec(w_now);
    let l_err = l_target - l_now;

    let b_hat = b_now.normalize();
    let l_err_hat = l_err.normalize();
    let firing_dir = b_hat.cross(l_err_hat);

    let commit = |component: f64| -> Direction {
        if component.abs() > 0.01 { Direction::from_sign(component) } else { Direction::Off }
    };
    let directions = [commit(firing_dir.x), commit(firing_dir.y), commit(firing_dir.z)];

    let mu = Vector3::new(
        directions[0] as i8 as f64,
        directions[1] as i8 as f64,
        directions[2] as i8 as f64,
    ) * (dipole_moment * 1e-7);
    let torque = mu.cross(b_now);

    let raw_time = |err: f64, tau: f64| -> u64 {
        if tau == 0.0 {
            return 0;
        }
        let t = err / tau * 1e6;
        if t > budget_us as f64 {
            budget_us
        } else if t < min_fire_us as f64 {
            0
        } else {
            t as u64
        }
    };

    let firing_us = [
        raw_time(l_err.x, torque.x),
        raw_time(l_err.y, torque.y),
        raw_time(l_err.z, torque.z),
    ];

    FiringPlan { directions, firing_us, budget_us }
}

/// Sorts axes by firing time ascending (insertion sort on three elements;
/// stability is not required, spec §4.F) and returns `(order, sorted_times)`.
fn sort_axes(firing_us: [u64; 3]) -> ([usize; 3], [u64; 3]) {
    let mut order = [0usize, 1, 2];
    let mut times = firing_us;
    for i in 1..3 {
        let (key_t, key_o) = (times[i], order[i]);
        let mut j = i;
        while j > 0 && times[j - 1] > key_t {
            times[j] = times[j - 1];
            order[j] = order[j - 1];
            j -= 1;
        }
        times[j] = key_t;
        order[j] = key_o;
    }
    (order, times)
}

/// Executes one detumble actuation phase: enables all three axes
/// simultaneously in their planned directions, then disables them in
/// ascending firing-time order, sleeping the gaps between, and finally
/// sleeps out the remainder of the actuation budget (spec §4.F step 6).
pub fn execute(hbridge: &mut dyn HBridge, plan: FiringPlan) {
    let (order, sorted) = sort_axes(plan.firing_us);
    let final_wait = plan.budget_us.saturating_sub(sorted[2]);
    let gap1 = sorted[1] - sorted[0];
    let gap2 = sorted[2] - sorted[1];

    for axis in 0..3 {
        hbridge.set_output(axis, plan.directions[axis]);
    }
    let _ = hbridge.exec();

    std::thread::sleep(Duration::from_micros(sorted[0].max(1)));
    hbridge.disable(order[0]);

    std::thread::sleep(Duration::from_micros(gap1.max(1)));
    hbridge.disable(order[1]);

    std::thread::sleep(Duration::from_micros(gap2.max(1)));
    hbridge.disable(order[2]);

    std::thread::sleep(Duration::from_micros(final_wait.max(1)));
    hbridge.disable_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_axes_is_ascending() {
        let (order, times) = sort_axes([45_000, 3_000, 200_000]);
        assert_eq!(times, [3_000, 45_000, 200_000]);
        assert_eq!(order, [1, 0, 2]);
    }

    #[test]
    fn firing_time_clamped_to_budget() {
        let plan = compute_plan(
            Vector3::new(100.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
            Matrix3::diagonal(0.02, 0.02, 0.02),
            0.1,
            0.22,
            10_000,
            900_000,
        );
        for t in plan.firing_us {
            assert!(t == 0 || (10_000..=900_000).contains(&t));
        }
    }

    #[test]
    fn zero_torque_axis_does_not_fire() {
        let plan = compute_plan(Vector3::<f64>::ZERO, Vector3::new(0.0, 0.0, 1.0), Matrix3::diagonal(0.02, 0.02, 0.02), 0.1, 0.22, 10_000, 900_000);
        // With B == 0, torque is always zero regardless of direction.
        assert_eq!(plan.firing_us, [0, 0, 0]);
    }

    struct RecordingHBridge {
        sets: Vec<(usize, Direction)>,
        disables: Vec<usize>,
    }
    impl HBridge for RecordingHBridge {
        fn set_output(&mut self, axis: usize, direction: Direction) {
            self.sets.push((axis, direction));
        }
        fn exec(&mut self) -> Result<(), crate::error::DriverError> {
            Ok(())
        }
        fn disable(&mut self, axis: usize) {
            self.disables.push(axis);
        }
    }

    #[test]
    fn execute_disables_all_axes_in_order() {
        let plan = FiringPlan {
            directions: [Direction::Positive, Direction::Negative, Direction::Positive],
            firing_us: [1, 1, 1],
            budget_us: 10,
        };
        let mut hb = RecordingHBridge { sets: vec![], disables: vec![] };
        execute(&mut hb, plan);
        assert_eq!(hb.sets.len(), 3);
        assert!(hb.disables.len() >= 3);
    }
}
