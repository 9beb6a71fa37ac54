//! Ground-commanded configuration record. See spec §3.5/§6.7.
//!
//! Every setter clamps before storing; getters always return the stored
//! post-clamp value. Persisted to a TOML file, the filesystem-backed
//! equivalent of the teacher's `cfg_storage.rs` flash-backed `UserCfg`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::vector3::Vector3;

pub const DEFAULT_DIPOLE_MOMENT: f64 = 0.22;
pub const MIN_FIRE_US_DEFAULT: u64 = 10_000;
pub const SUNPOINT_DUTY_US_DEFAULT: u64 = 20_000;
pub const CSS_LUX_THRESHOLD_DEFAULT: f64 = 20_000.0;
pub const DEFAULT_LEEWAY_FACTOR: f64 = 0.1;
pub const DEFAULT_MIN_DETUMBLE_ANGLE_DEG: f64 = 10.0;
pub const DEFAULT_MIN_SUN_ANGLE_DEG: f64 = 20.0;

/// A 3x3 matrix, stored densely even though MOI/IMOI are diagonal in
/// practice (spec §3.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub rows: [[f64; 3]; 3],
}

impl Matrix3 {
    pub const fn diagonal(x: f64, y: f64, z: f64) -> Self {
        Self {
            rows: [[x, 0.0, 0.0], [0.0, y, 0.0], [0.0, 0.0, z]],
        }
    }

    pub fn mul_vec(&self, v: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.rows[0][0] * v.x + self.rows[0][1] * v.y + self.rows[0][2] * v.z,
            self.rows[1][0] * v.x + self.rows[1][1] * v.y + self.rows[1][2] * v.z,
            self.rows[2][0] * v.x + self.rows[2][1] * v.y + self.rows[2][2] * v.z,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunables {
    dipole_moment: f64,
    tstep_us: u64,
    measure_us: u64,
    min_fire_us: u64,
    sunpoint_duty_us: u64,
    css_lux_threshold: f64,
    leeway_factor: f64,
    wtarget_z: f64,
    min_detumble_angle_deg: f64,
    min_sun_angle_deg: f64,
    moi: Matrix3,
    imoi: Matrix3,
    /// Re-enables the legacy ω-correction term (spec §9); off by default.
    pub re_enable_inertia_correction: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        let moi = Matrix3::diagonal(0.02, 0.02, 0.02);
        let imoi = Matrix3::diagonal(1.0 / 0.02, 1.0 / 0.02, 1.0 / 0.02);
        Self {
            dipole_moment: DEFAULT_DIPOLE_MOMENT,
            tstep_us: 1_000_000,
            measure_us: 50_000,
            min_fire_us: MIN_FIRE_US_DEFAULT,
            sunpoint_duty_us: SUNPOINT_DUTY_US_DEFAULT,
            css_lux_threshold: CSS_LUX_THRESHOLD_DEFAULT,
            leeway_factor: DEFAULT_LEEWAY_FACTOR,
            wtarget_z: 0.1,
            min_detumble_angle_deg: DEFAULT_MIN_DETUMBLE_ANGLE_DEG,
            min_sun_angle_deg: DEFAULT_MIN_SUN_ANGLE_DEG,
            moi,
            imoi,
            re_enable_inertia_correction: false,
        }
    }
}

impl Tunables {
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn dipole_moment(&self) -> f64 {
        self.dipole_moment
    }
    /// Clamps `value <= 0` back to the default (spec §3.5).
    pub fn set_dipole_moment(&mut self, value: f64) {
        self.dipole_moment = if value > 0.0 { value } else { DEFAULT_DIPOLE_MOMENT };
    }

    pub fn tstep_us(&self) -> u64 {
        self.tstep_us
    }
    /// Takes a period in milliseconds, rounds down to a multiple of 10 ms,
    /// with a 100 ms floor (spec §3.5).
    pub fn set_tstep_ms(&mut self, ms: u64) {
        let rounded = (ms / 10) * 10;
        self.tstep_us = rounded.max(100) * 1_000;
    }
    pub fn get_tstep_ms(&self) -> u64 {
        self.tstep_us / 1_000
    }

    pub fn measure_us(&self) -> u64 {
        self.measure_us
    }
    /// Takes a budget in milliseconds, rounds to the nearest 10 ms, clamped
    /// to [20, 50] ms (spec §3.5).
    pub fn set_measure_ms(&mut self, ms: u64) {
        let rounded = ((ms + 5) / 10) * 10;
        self.measure_us = rounded.clamp(20, 50) * 1_000;
    }

    pub fn min_fire_us(&self) -> u64 {
        self.min_fire_us
    }
    pub fn sunpoint_duty_us(&self) -> u64 {
        self.sunpoint_duty_us
    }
    pub fn css_lux_threshold(&self) -> f64 {
        self.css_lux_threshold
    }

    pub fn leeway_factor(&self) -> f64 {
        self.leeway_factor
    }
    /// Takes an integer percent in [5, 50] and stores `1/percent` (spec §3.5).
    pub fn set_leeway_percent(&mut self, percent: u32) {
        let clamped = percent.clamp(5, 50);
        self.leeway_factor = 1.0 / clamped as f64;
    }

    pub fn wtarget_z(&self) -> f64 {
        self.wtarget_z
    }
    /// Clamps magnitude to [0.1, 2.0], preserving sign (spec §3.5).
    pub fn set_wtarget(&mut self, value: f64) {
        let mag = value.abs().clamp(0.1, 2.0);
        self.wtarget_z = if value < 0.0 { -mag } else { mag };
    }
    pub fn get_wtarget(&self) -> f64 {
        self.wtarget_z
    }

    pub fn min_detumble_angle_deg(&self) -> f64 {
        self.min_detumble_angle_deg
    }
    /// Clamps to <=45 degrees; out-of-range resets to 20 (spec §3.5).
    pub fn set_min_detumble_angle_deg(&mut self, deg: f64) {
        self.min_detumble_angle_deg = if deg <= 45.0 { deg } else { 20.0 };
    }

    pub fn min_sun_angle_deg(&self) -> f64 {
        self.min_sun_angle_deg
    }
    pub fn set_min_sun_angle_deg(&mut self, deg: f64) {
        self.min_sun_angle_deg = if deg <= 45.0 { deg } else { 20.0 };
    }

    pub fn moi(&self) -> Matrix3 {
        self.moi
    }
    pub fn imoi(&self) -> Matrix3 {
        self.imoi
    }
}
