//! Typed errors for the ACS core. Per spec §7, these never cross a tick
//! boundary as exceptions: each tick converts its `Result` into either a
//! continuation or a buffer-flush-and-NIGHT request (see `loop_driver`).

use thiserror::Error;

/// A device could not be brought up at process start (spec §7 "Init failure").
/// Each variant carries a distinct process exit code (spec §6.9).
#[derive(Debug, Error)]
pub enum InitError {
    #[error("magnetometer init failed: {0}")]
    Magnetometer(String),
    #[error("i2c mux init failed: {0}")]
    Mux(String),
    #[error("fine sun sensor init failed: {0}")]
    FineSun(String),
    #[error("h-bridge init failed: {0}")]
    HBridge(String),
    #[error("bootcount file could not be read or written: {0}")]
    Bootcount(#[from] std::io::Error),
}

impl InitError {
    /// Distinct non-zero process exit code per device, per spec §6.9.
    pub fn exit_code(&self) -> i32 {
        match self {
            InitError::Magnetometer(_) => 1,
            InitError::Mux(_) => 2,
            InitError::FineSun(_) => 3,
            InitError::HBridge(_) => 4,
            InitError::Bootcount(_) => 5,
        }
    }
}

/// A per-tick driver failure reported by a device read or actuation call.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i2c error on device {device}: {detail}")]
    I2c { device: &'static str, detail: String },
    #[error("spi error: {0}")]
    Spi(String),
}

/// The outcome of one sampling pass (spec §4.A/§4.H). A hard error (NaN
/// downstream, or a newly-latched mux mask that denies all coarse sun input
/// during day) triggers the buffer-flush path; soft errors are folded into
/// the returned `SensorFrame` and only logged.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("derivation produced a non-finite value in {channel}")]
    NonFinite { channel: &'static str },
}
