//! Drivers for the devices named in spec §6, each in its own sub-module.
//! These are the external-interface boundary (spec §1): the ACS core talks
//! to traits here, never to bus-level I²C/SPI details, which are out of scope.

pub mod fine_sun;
pub mod hbridge;
pub mod lux;
pub mod magnetometer;
pub mod mux;
pub mod sim;

use crate::error::DriverError;

pub use fine_sun::FineSunSensor;
pub use hbridge::HBridge;
pub use lux::LuxSensor;
pub use magnetometer::Magnetometer;
pub use mux::I2cMux;

/// Bundles one of each device trait object, owned exclusively by the sampler.
pub struct DeviceSet {
    pub mag: Box<dyn Magnetometer>,
    pub mux: Box<dyn I2cMux>,
    pub lux: Box<dyn LuxSensor>,
    pub fine_sun: Box<dyn FineSunSensor>,
    pub hbridge: Box<dyn HBridge>,
}

pub type DriverResult<T> = Result<T, DriverError>;
