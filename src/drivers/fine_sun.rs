//! Fine sun sensor driver contract. See spec §6.4.

use crate::error::DriverError;
use crate::sensor_frame::SunStatus;

pub trait FineSunSensor: Send {
    /// Returns the two incidence angles in degrees, plus a status bitmask.
    fn read(&mut self) -> Result<(f32, f32, SunStatus), DriverError>;
}
