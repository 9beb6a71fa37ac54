//! H-bridge (magnetorquer driver) contract. See spec §6.5.

use crate::error::DriverError;

/// Firing direction for one torquer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Negative = -1,
    Off = 0,
    Positive = 1,
}

impl Direction {
    pub fn from_sign(v: f64) -> Self {
        if v > 0.0 {
            Direction::Positive
        } else if v < 0.0 {
            Direction::Negative
        } else {
            Direction::Off
        }
    }
}

pub trait HBridge: Send {
    fn set_output(&mut self, axis: usize, direction: Direction);
    fn exec(&mut self) -> Result<(), DriverError>;
    fn disable(&mut self, axis: usize);
    fn disable_all(&mut self) {
        for axis in 0..3 {
            self.disable(axis);
        }
    }
}
