//! Fixed-capacity circular buffer shared by the B, Ḃ, ω, and sun-vector
//! channels. See spec §3.2.

#[derive(Debug, Clone)]
pub struct Ring<T, const N: usize = 64> {
    storage: [T; N],
    /// Index of the most recent sample. -1 (represented as `None`) means empty.
    head: Option<usize>,
    /// Latches true once `head` has visited every slot; never clears without `reset`.
    filled: bool,
}

impl<T: Copy + Default, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self {
            storage: [T::default(); N],
            head: None,
            filled: false,
        }
    }
}

impl<T: Copy + Default, const N: usize> Ring<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Index of the most recent sample, or `None` if nothing has been pushed yet.
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn push(&mut self, value: T) {
        let next = match self.head {
            None => 0,
            Some(h) => {
                let next = (h + 1) % N;
                if next == 0 {
                    self.filled = true;
                }
                next
            }
        };
        self.storage[next] = value;
        self.head = Some(next);
    }

    /// The k-th most recent element (k=0 is the newest). Wraps to stale data if
    /// `k` exceeds the buffer's history; callers must consult `head`/`is_filled` first.
    pub fn get(&self, k: usize) -> Option<T> {
        let h = self.head?;
        let idx = (h + N - (k % N)) % N;
        Some(self.storage[idx])
    }

    pub fn latest(&self) -> Option<T> {
        self.get(0)
    }

    /// Overwrites the most recent sample in place, without advancing `head`.
    /// No-op if nothing has been pushed yet.
    pub fn set_latest(&mut self, value: T) {
        if let Some(h) = self.head {
            self.storage[h] = value;
        }
    }

    /// Number of samples ever pushed, saturating at `N` once filled.
    pub fn len(&self) -> usize {
        match self.head {
            None => 0,
            Some(h) => {
                if self.filled {
                    N
                } else {
                    h + 1
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn reset(&mut self) {
        self.head = None;
        self.filled = false;
    }

    /// Iterate over all currently-valid samples (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let n = self.len();
        (0..n).rev().map(move |k| self.get(k).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let r: Ring<f32, 4> = Ring::new();
        assert_eq!(r.head(), None);
        assert!(!r.is_filled());
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn push_advances_head_and_reads_back() {
        let mut r: Ring<f32, 4> = Ring::new();
        r.push(1.0);
        r.push(2.0);
        assert_eq!(r.head(), Some(1));
        assert_eq!(r.latest(), Some(2.0));
        assert_eq!(r.get(1), Some(1.0));
    }

    #[test]
    fn set_latest_overwrites_without_advancing_head() {
        let mut r: Ring<f32, 4> = Ring::new();
        r.push(1.0);
        r.push(2.0);
        r.set_latest(9.0);
        assert_eq!(r.head(), Some(1));
        assert_eq!(r.latest(), Some(9.0));
        assert_eq!(r.get(1), Some(1.0));
    }

    #[test]
    fn set_latest_on_empty_ring_is_a_no_op() {
        let mut r: Ring<f32, 4> = Ring::new();
        r.set_latest(9.0);
        assert!(r.is_empty());
    }

    #[test]
    fn filled_latches_once_head_wraps() {
        let mut r: Ring<f32, 3> = Ring::new();
        for v in [1.0, 2.0, 3.0] {
            r.push(v);
        }
        assert!(!r.is_filled());
        r.push(4.0);
        assert!(r.is_filled());
        // wrapped over slot 0: latest is 4.0, oldest still-valid is 2.0
        assert_eq!(r.latest(), Some(4.0));
        assert_eq!(r.get(2), Some(2.0));
    }

    #[test]
    fn filled_stays_latched_until_explicit_reset() {
        let mut r: Ring<f32, 2> = Ring::new();
        r.push(1.0);
        r.push(2.0);
        r.push(3.0);
        assert!(r.is_filled());
        r.push(4.0);
        assert!(r.is_filled());
        r.reset();
        assert!(!r.is_filled());
        assert_eq!(r.head(), None);
    }

    #[test]
    fn constant_buffer_iterates_to_same_value() {
        let mut r: Ring<f32, 4> = Ring::new();
        for _ in 0..6 {
            r.push(7.0);
        }
        assert!(r.iter().all(|v| v == 7.0));
    }
}
