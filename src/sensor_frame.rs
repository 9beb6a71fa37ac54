//! One tick of raw measurements, and the status bitmasks attached to them.
//! See spec §3.3.

use bitflags::bitflags;

use crate::vector3::Vector3;

/// LSB/mG scale factor for the raw magnetometer words. See spec §3.3.
pub const MAG_LSB_PER_MILLIGAUSS: f64 = 6.842;

bitflags! {
    /// Fine-sun-sensor status bitmask, per spec §3.3 and §6.4.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SunStatus: u32 {
        const INDEX_MIN = 1;
        const INDEX_MAX = 2;
        const ANGLE_X   = 4;
        const ANGLE_Y   = 8;
        const DIV_ZERO  = 16;
    }
}

impl SunStatus {
    pub const ERROR_BITS: Self = Self::INDEX_MIN
        .union(Self::INDEX_MAX)
        .union(Self::ANGLE_X)
        .union(Self::ANGLE_Y)
        .union(Self::DIV_ZERO);

    pub fn is_ok(self) -> bool {
        !self.intersects(Self::ERROR_BITS)
    }
}

bitflags! {
    /// Per-mux-channel failure latch. Once a channel fails, it's skipped on
    /// subsequent ticks until process restart (spec §3.3, §4.A).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MuxSkipMask: u8 {
        const CHANNEL_0 = 0b001;
        const CHANNEL_1 = 0b010;
        const CHANNEL_2 = 0b100;
    }
}

impl MuxSkipMask {
    pub fn for_channel(channel: u8) -> Self {
        match channel {
            0 => Self::CHANNEL_0,
            1 => Self::CHANNEL_1,
            2 => Self::CHANNEL_2,
            _ => Self::empty(),
        }
    }
}

/// Raw magnetometer words, already sign-corrected and scaled into the
/// body-frame convention (spec §3.3): `Bx = -mag_y/6.842`, `By = mag_x/6.842`,
/// `Bz = mag_z/6.842`.
pub fn mag_to_body_field(mag_x: i16, mag_y: i16, mag_z: i16) -> Vector3<f64> {
    Vector3::new(
        -(mag_y as f64) / MAG_LSB_PER_MILLIGAUSS,
        (mag_x as f64) / MAG_LSB_PER_MILLIGAUSS,
        (mag_z as f64) / MAG_LSB_PER_MILLIGAUSS,
    )
}

/// Seven coarse-sun-sensor illuminance channels, in lux.
pub type CssReadings = [u16; 7];

#[derive(Debug, Clone, Copy)]
pub struct FineSunReading {
    pub theta_x_deg: f32,
    pub theta_y_deg: f32,
    pub status: SunStatus,
}

/// One tick of raw sensor measurements, per spec §3.3.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub b_field: Vector3<f64>,
    pub css: CssReadings,
    pub fine_sun: FineSunReading,
    /// Per-channel mux failure latches, accumulated across the process lifetime.
    pub mux_skip: MuxSkipMask,
    /// True if the magnetometer read itself failed this tick (soft error; the
    /// tick still proceeds with the stale/zeroed `b_field`).
    pub mag_read_failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_frame_sign_convention() {
        let b = mag_to_body_field(100, 200, 300);
        assert!((b.x - (-200.0 / MAG_LSB_PER_MILLIGAUSS)).abs() < 1e-9);
        assert!((b.y - (100.0 / MAG_LSB_PER_MILLIGAUSS)).abs() < 1e-9);
        assert!((b.z - (300.0 / MAG_LSB_PER_MILLIGAUSS)).abs() < 1e-9);
    }

    #[test]
    fn sun_status_ok_only_with_no_error_bits() {
        assert!(SunStatus::empty().is_ok());
        assert!(!SunStatus::DIV_ZERO.is_ok());
        assert!(!(SunStatus::INDEX_MIN | SunStatus::ANGLE_Y).is_ok());
    }

    #[test]
    fn mux_skip_mask_tracks_individual_channels() {
        let mut mask = MuxSkipMask::empty();
        mask |= MuxSkipMask::for_channel(1);
        assert!(mask.contains(MuxSkipMask::CHANNEL_1));
        assert!(!mask.contains(MuxSkipMask::CHANNEL_0));
    }
}
