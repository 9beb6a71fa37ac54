//! A simulated device backend, standing in for real I²C/SPI hardware.
//!
//! The spec treats the device layer as an external collaborator (§1): real
//! bus access is out of scope. Something still has to implement the driver
//! traits so the pipeline can run and be tested end to end, the same role
//! the teacher's `setup::init_sensors` plays for its own HAL-backed sensors.
//! This is new code, not a translation of the original's SITL serial shim.
//!
//! The model: a rigid body with angular velocity `omega` tumbling in a fixed
//! inertial field `b_inertial`. Between reads, `db/dt = -omega x b` (the
//! field appears to rotate in the body frame as the body turns) and
//! `domega/dt = IMOI * (mu x b)` from any torquer dipole currently commanded,
//! which is exactly the physics the detumble law (spec §4.F) is built to
//! cancel out.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::drivers::hbridge::Direction;
use crate::error::DriverError;
use crate::sensor_frame::{MAG_LSB_PER_MILLIGAUSS, SunStatus};
use crate::vector3::Vector3;

use super::{FineSunSensor, HBridge, I2cMux, LuxSensor, Magnetometer};

pub struct SimPhysics {
    pub b_inertial: Vector3<f64>,
    pub omega: Vector3<f64>,
    pub sun_inertial: Vector3<f64>,
    pub dipole_moment: f64,
    pub imoi_diag: Vector3<f64>,
    last_update: Instant,
    commanded: [Direction; 3],
}

impl SimPhysics {
    pub fn new(omega0: Vector3<f64>) -> Self {
        Self {
            b_inertial: Vector3::new(180.0, -60.0, 320.0),
            omega: omega0,
            sun_inertial: Vector3::new(0.0, 0.0, 1.0),
            dipole_moment: 0.22,
            imoi_diag: Vector3::new(1.0 / 0.02, 1.0 / 0.02, 1.0 / 0.02),
            last_update: Instant::now(),
            commanded: [Direction::Off; 3],
        }
    }

}

/// Shared simulated state plus the per-driver adapters over it.
pub struct Sim {
    pub physics: Arc<Mutex<SimPhysicsState>>,
}

/// Extends [`SimPhysics`] with the mutable body-frame field the original
/// struct integrates; split out so `advance` can borrow both halves.
pub struct SimPhysicsState {
    pub inner: SimPhysics,
    pub b_body_state: Vector3<f64>,
}

impl Sim {
    pub fn new(omega0: Vector3<f64>) -> Self {
        let inner = SimPhysics::new(omega0);
        let b_body_state = inner.b_inertial;
        Self {
            physics: Arc::new(Mutex::new(SimPhysicsState { inner, b_body_state })),
        }
    }

    pub fn magnetometer(&self) -> SimMagnetometer {
        SimMagnetometer { physics: self.physics.clone() }
    }
    pub fn mux(&self) -> SimMux {
        SimMux
    }
    pub fn lux(&self) -> SimLux {
        SimLux { physics: self.physics.clone() }
    }
    pub fn fine_sun(&self) -> SimFineSun {
        SimFineSun { physics: self.physics.clone() }
    }
    pub fn hbridge(&self) -> SimHBridge {
        SimHBridge { physics: self.physics.clone() }
    }
}

fn advance_locked(state: &mut SimPhysicsState) {
    let now = Instant::now();
    let dt = now.duration_since(state.inner.last_update).as_secs_f64();
    state.inner.last_update = now;
    if dt <= 0.0 {
        return;
    }

    let b = state.b_body_state;
    let mu = Vector3::new(
        state.inner.commanded[0] as i8 as f64,
        state.inner.commanded[1] as i8 as f64,
        state.inner.commanded[2] as i8 as f64,
    ) * (state.inner.dipole_moment * 1e-7);
    let torque = mu.cross(b);
    let domega = Vector3::new(
        torque.x * state.inner.imoi_diag.x,
        torque.y * state.inner.imoi_diag.y,
        torque.z * state.inner.imoi_diag.z,
    );

    let db = state.inner.omega.cross(b) * -1.0;
    state.b_body_state = b + db * dt;
    state.inner.omega = state.inner.omega + domega * dt;
}

pub struct SimMagnetometer {
    physics: Arc<Mutex<SimPhysicsState>>,
}

impl Magnetometer for SimMagnetometer {
    fn read_mag(&mut self) -> Result<[i16; 3], DriverError> {
        let mut state = self.physics.lock().unwrap();
        advance_locked(&mut state);
        let b = state.b_body_state;
        // Invert `sensor_frame::mag_to_body_field`'s sign/scale convention.
        let mag_x = (b.y * MAG_LSB_PER_MILLIGAUSS) as i16;
        let mag_y = (-b.x * MAG_LSB_PER_MILLIGAUSS) as i16;
        let mag_z = (b.z * MAG_LSB_PER_MILLIGAUSS) as i16;
        Ok([mag_x, mag_y, mag_z])
    }
}

pub struct SimMux;

impl I2cMux for SimMux {
    fn select(&mut self, _channel: u8) -> Result<(), DriverError> {
        Ok(())
    }
}

pub struct SimLux {
    physics: Arc<Mutex<SimPhysicsState>>,
}

impl LuxSensor for SimLux {
    fn measure(&mut self, sensor_id: u8) -> Result<u32, DriverError> {
        let state = self.physics.lock().unwrap();
        let sun = state.inner.sun_inertial.normalize();
        // Channels pair up as +/-X, +/-Y, +Z, and two redundant -Z readings,
        // matching the differencing the derivation step expects (spec §4.D).
        let illum = match sensor_id {
            0 => (sun.x.max(0.0) * 20_000.0) as u32,
            1 => ((-sun.x).max(0.0) * 20_000.0) as u32,
            2 => (sun.y.max(0.0) * 20_000.0) as u32,
            3 => ((-sun.y).max(0.0) * 20_000.0) as u32,
            4 => (sun.z.max(0.0) * 20_000.0) as u32,
            5 | 6 => ((-sun.z).max(0.0) * 10_000.0) as u32,
            _ => 0,
        };
        Ok(illum)
    }
}

pub struct SimFineSun {
    physics: Arc<Mutex<SimPhysicsState>>,
}

impl FineSunSensor for SimFineSun {
    fn read(&mut self) -> Result<(f32, f32, SunStatus), DriverError> {
        let state = self.physics.lock().unwrap();
        let sun = state.inner.sun_inertial.normalize();
        if sun.z <= 0.05 {
            // Sun is behind the sensor's field of view: report an index fault
            // rather than a nonsensical angle, same as the real sensor would.
            return Ok((0.0, 0.0, SunStatus::INDEX_MIN));
        }
        let theta_x = (-(sun.x / sun.z).atan()).to_degrees() as f32;
        let theta_y = (-(sun.y / sun.z).atan()).to_degrees() as f32;
        Ok((theta_x, theta_y, SunStatus::empty()))
    }
}

pub struct SimHBridge {
    physics: Arc<Mutex<SimPhysicsState>>,
}

impl HBridge for SimHBridge {
    fn set_output(&mut self, axis: usize, direction: Direction) {
        let mut state = self.physics.lock().unwrap();
        advance_locked(&mut state);
        state.inner.commanded[axis] = direction;
    }

    fn exec(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn disable(&mut self, axis: usize) {
        let mut state = self.physics.lock().unwrap();
        advance_locked(&mut state);
        state.inner.commanded[axis] = Direction::Off;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnetometer_round_trips_through_sign_convention() {
        let sim = Sim::new(Vector3::<f64>::ZERO);
        let mut mag = sim.magnetometer();
        let raw = mag.read_mag().unwrap();
        let b = crate::sensor_frame::mag_to_body_field(raw[0], raw[1], raw[2]);
        // With omega == 0, the body field shouldn't have drifted from the
        // inertial field set at construction.
        assert!((b.x - 180.0).abs() < 1.0);
        assert!((b.z - 320.0).abs() < 1.0);
    }

    #[test]
    fn lux_channels_prefer_the_sunward_hemisphere() {
        let sim = Sim::new(Vector3::<f64>::ZERO);
        let mut lux = sim.lux();
        let plus_z = lux.measure(4).unwrap();
        let minus_z = lux.measure(5).unwrap();
        assert!(plus_z > minus_z);
    }
}
