//! I²C multiplexer driver contract. See spec §6.3.

use crate::error::DriverError;

/// Channel `8` disables all channels.
pub const MUX_DISABLE: u8 = 8;

pub trait I2cMux: Send {
    fn select(&mut self, channel: u8) -> Result<(), DriverError>;

    fn disable(&mut self) -> Result<(), DriverError> {
        self.select(MUX_DISABLE)
    }
}
