//! Magnetometer driver contract. See spec §6.1.

use crate::error::DriverError;

/// Three raw 16-bit signed words, in the device's native axis order and LSB
/// scale; sign correction and the 6.842 LSB/mG scale factor are applied by
/// `sensor_frame::mag_to_body_field`, not here.
pub trait Magnetometer: Send {
    fn read_mag(&mut self) -> Result<[i16; 3], DriverError>;
}
