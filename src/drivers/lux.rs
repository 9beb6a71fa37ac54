//! Lux (coarse sun sensor) driver contract. See spec §6.2.

use crate::error::DriverError;

pub trait LuxSensor: Send {
    /// Returns a raw reading whose low 16 bits are the illuminance value.
    fn measure(&mut self, sensor_id: u8) -> Result<u32, DriverError>;
}
