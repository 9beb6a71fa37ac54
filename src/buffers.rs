//! Derived-signal ring buffers. See spec §4.B.
//!
//! Update ordering within a tick is strictly B -> Bt -> W, with S written
//! independently; enforced by `derive`, not by this struct.

use crate::ring::Ring;
use crate::vector3::Vector3;

#[derive(Default)]
pub struct DerivedBuffers {
    pub b: Ring<Vector3<f64>>,
    pub bt: Ring<Vector3<f64>>,
    pub w: Ring<Vector3<f32>>,
    pub s: Ring<Vector3<f32>>,
}

impl DerivedBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushes all four buffers: heads reset to empty, `filled` cleared.
    /// Invoked on the hard-error path (spec §4.H step 2).
    pub fn reset_all(&mut self) {
        self.b.reset();
        self.bt.reset();
        self.w.reset();
        self.s.reset();
    }

    /// `ω̄ = mean(W)`, a plain arithmetic average over every currently-valid
    /// `W` sample (spec §4.E) — not another filter pass; `W` already holds
    /// Bessel-filtered values by the time this runs (spec §4.C, `derive`).
    /// Returns zero on an empty buffer.
    pub fn mean_w(&self) -> Vector3<f32> {
        let n = self.w.len();
        if n == 0 {
            return Vector3::<f32>::ZERO;
        }
        let sum = self.w.iter().fold(Vector3::<f32>::ZERO, |acc, v| acc + v);
        sum / n as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_all_clears_every_channel() {
        let mut buf = DerivedBuffers::new();
        buf.b.push(Vector3::new(1.0, 0.0, 0.0));
        buf.w.push(Vector3::new(0.1, 0.0, 0.0));
        buf.reset_all();
        assert!(buf.b.is_empty());
        assert!(buf.bt.is_empty());
        assert!(buf.w.is_empty());
        assert!(buf.s.is_empty());
    }

    #[test]
    fn mean_w_is_a_plain_average_not_a_filter() {
        let mut buf = DerivedBuffers::new();
        buf.w.push(Vector3::new(1.0, 0.0, 0.0));
        buf.w.push(Vector3::new(3.0, 0.0, 0.0));
        let mean = buf.mean_w();
        assert!((mean.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn mean_w_of_empty_buffer_is_zero() {
        let buf = DerivedBuffers::new();
        assert_eq!(buf.mean_w(), Vector3::<f32>::ZERO);
    }
}
