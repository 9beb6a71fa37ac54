//! Fixed Bessel-weighted moving average applied to the newest end of a ring
//! buffer. Same weight kernel for scalar and vector channels. See spec §4.C.
//!
//! Grounded directly on `calculateBessel`/`ffilterBessel` in
//! `examples/original_source/src/bessel.c`: reverse Bessel polynomial
//! coefficients, a weighted walk backward through a circular buffer that
//! stops once a coefficient drops below threshold, wraps back to the start,
//! or exhausts the kernel.

use crate::ring::Ring;

pub const FILTER_ORDER: usize = 3;
pub const FILTER_CUTOFF: f64 = 5.0;
pub const FILTER_MIN_COEFF: f64 = 0.001;

fn factorial(n: u64) -> u64 {
    (1..=n).product::<u64>().max(1)
}

/// A value a [`Filter`] can form a weighted sum of: zero, scale by a weight,
/// and add two partial sums together. Implemented for the scalar and
/// `Vector3` channel types the filter is applied to.
pub trait FilterSample: Copy + Default {
    fn zero() -> Self;
    fn scale(self, w: f64) -> Self;
    fn add(self, rhs: Self) -> Self;
}

impl FilterSample for f32 {
    fn zero() -> Self {
        0.0
    }
    fn scale(self, w: f64) -> Self {
        self * w as f32
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl FilterSample for f64 {
    fn zero() -> Self {
        0.0
    }
    fn scale(self, w: f64) -> Self {
        self * w
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl FilterSample for crate::vector3::Vector3<f32> {
    fn zero() -> Self {
        Self::ZERO
    }
    fn scale(self, w: f64) -> Self {
        self * (w as f32)
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl FilterSample for crate::vector3::Vector3<f64> {
    fn zero() -> Self {
        Self::ZERO
    }
    fn scale(self, w: f64) -> Self {
        self * w
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

/// A precomputed Bessel-derived FIR kernel, one set of coefficients shared by
/// every filtered channel.
pub struct Filter<const N: usize> {
    weights: [f64; N],
    /// Index of the first coefficient below [`FILTER_MIN_COEFF`]; the kernel
    /// never walks past this many steps.
    active_len: usize,
}

impl<const N: usize> Filter<N> {
    /// Computes the N-tap kernel for a 3rd-order Bessel filter at cutoff `FILTER_CUTOFF`.
    pub fn new() -> Self {
        let order = FILTER_ORDER.min(5);
        let coeff: Vec<f64> = (0..=order)
            .map(|i| {
                let num = factorial((2 * order - i) as u64) as f64;
                let den = ((1u64 << (order - i)) * factorial(i as u64) * factorial((order - i) as u64)) as f64;
                num / den
            })
            .collect();

        let mut weights = [0.0; N];
        for (j, w) in weights.iter_mut().enumerate() {
            let mut denom = 0.0;
            let mut pow_num = 1.0;
            for &c in &coeff {
                denom += c * pow_num;
                pow_num *= j as f64 / FILTER_CUTOFF;
            }
            *w = coeff[0] / denom;
        }

        let active_len = weights
            .iter()
            .position(|&w| w.abs() < FILTER_MIN_COEFF)
            .unwrap_or(N);

        Self { weights, active_len }
    }

    /// Applies the kernel to `ring`, walking backward from its most recent
    /// sample. Returns `T::zero()` if the ring is empty.
    pub fn apply<T: FilterSample>(&self, ring: &Ring<T, N>) -> T {
        let Some(head) = ring.head() else {
            return T::zero();
        };

        let mut sum = T::zero();
        let mut weight_sum = 0.0;
        let mut idx = head;
        let mut coeff_idx = 0;

        loop {
            let value = ring_value_at(ring, idx);
            let w = self.weights[coeff_idx];
            sum = sum.add(value.scale(w));
            weight_sum += w;

            idx = if idx == 0 { N - 1 } else { idx - 1 };
            coeff_idx += 1;

            if idx == head || coeff_idx >= self.active_len || coeff_idx >= N {
                break;
            }
        }

        if weight_sum == 0.0 {
            T::zero()
        } else {
            sum.scale(1.0 / weight_sum)
        }
    }
}

/// Reads the raw storage slot `idx` (not a "k-th most recent" offset) out of
/// `ring`, via the k-th-most-recent accessor it already exposes.
fn ring_value_at<T: FilterSample, const N: usize>(ring: &Ring<T, N>, idx: usize) -> T {
    let head = ring.head().expect("ring_value_at called on empty ring");
    let k = (head + N - idx) % N;
    ring.get(k).unwrap_or(T::zero())
}

impl<const N: usize> Default for Filter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_buffer_filters_to_itself() {
        let filter: Filter<64> = Filter::new();
        let mut ring: Ring<f32, 64> = Ring::new();
        for _ in 0..64 {
            ring.push(3.5);
        }
        let out = filter.apply(&ring);
        assert!((out - 3.5).abs() < 1e-4, "got {out}");
    }

    #[test]
    fn empty_ring_filters_to_zero() {
        let filter: Filter<64> = Filter::new();
        let ring: Ring<f32, 64> = Ring::new();
        assert_eq!(filter.apply(&ring), 0.0);
    }

    #[test]
    fn kernel_terminates_early_below_threshold() {
        let filter: Filter<64> = Filter::new();
        assert!(filter.active_len <= 64);
        assert!(filter.active_len > 0);
    }

    #[test]
    fn vector_channel_filters_componentwise() {
        let filter: Filter<64> = Filter::new();
        let mut ring: Ring<crate::vector3::Vector3<f32>, 64> = Ring::new();
        for _ in 0..64 {
            ring.push(crate::vector3::Vector3::new(1.0, -2.0, 0.5));
        }
        let out = filter.apply(&ring);
        assert!((out.x - 1.0).abs() < 1e-4);
        assert!((out.y + 2.0).abs() < 1e-4);
        assert!((out.z - 0.5).abs() < 1e-4);
    }
}
