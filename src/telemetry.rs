//! Telemetry port: publishes one fixed-layout record per tick over TCP. See
//! spec §6.6.
//!
//! Grounded on the original's `datavis.c`/`sitl_comm.h` TCP broadcast
//! publisher, generalized from a bespoke C struct wire format to an explicit
//! `to_bytes`/`from_bytes` pair so the byte layout stays pinned regardless
//! of how the in-memory `TelemetrySnapshot` is declared.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::mode::ControlState;
use crate::vector3::Vector3;

pub const FBEGIN: &[u8; 6] = b"FBEGIN";
pub const FEND: &[u8; 4] = b"FEND";

#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetrySnapshot {
    pub tick: u64,
    pub t_now_us: u64,
    pub t_start_us: u64,
    pub mode: u8,
    pub b: Vector3<f32>,
    pub bt: Vector3<f32>,
    pub w: Vector3<f32>,
    pub s: Vector3<f32>,
}

pub fn mode_byte(state: ControlState) -> u8 {
    match state {
        ControlState::Detumble => 0,
        ControlState::Sunpoint => 1,
        ControlState::Night => 2,
        ControlState::Ready => 3,
        ControlState::XbandReady => 4,
    }
}

impl TelemetrySnapshot {
    /// Fixed binary layout: `FBEGIN` (6B) + tick (u64) + t_now (u64) +
    /// t_start (u64) + mode (u8) + 12 f32s (B, Ḃ, ω, S) + `FEND` (4B).
    pub fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + 8 + 8 + 8 + 1 + 12 * 4 + 4);
        out.extend_from_slice(FBEGIN);
        out.extend_from_slice(&self.tick.to_le_bytes());
        out.extend_from_slice(&self.t_now_us.to_le_bytes());
        out.extend_from_slice(&self.t_start_us.to_le_bytes());
        out.push(self.mode);
        for v in [self.b, self.bt, self.w, self.s] {
            out.extend_from_slice(&v.x.to_le_bytes());
            out.extend_from_slice(&v.y.to_le_bytes());
            out.extend_from_slice(&v.z.to_le_bytes());
        }
        out.extend_from_slice(FEND);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 6 + 8 + 8 + 8 + 1 + 48 + 4 {
            return None;
        }
        if &bytes[0..6] != FBEGIN || &bytes[bytes.len() - 4..] != FEND {
            return None;
        }
        let mut cursor = 6;
        let read_u64 = |buf: &[u8], at: usize| u64::from_le_bytes(buf[at..at + 8].try_into().unwrap());
        let tick = read_u64(bytes, cursor);
        cursor += 8;
        let t_now_us = read_u64(bytes, cursor);
        cursor += 8;
        let t_start_us = read_u64(bytes, cursor);
        cursor += 8;
        let mode = bytes[cursor];
        cursor += 1;

        let mut vectors: [Vector3<f32>; 4] = [Vector3::<f32>::ZERO; 4];
        for v in vectors.iter_mut() {
            let x = f32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
            let y = f32::from_le_bytes(bytes[cursor + 4..cursor + 8].try_into().unwrap());
            let z = f32::from_le_bytes(bytes[cursor + 8..cursor + 12].try_into().unwrap());
            *v = Vector3::new(x, y, z);
            cursor += 12;
        }

        Some(Self { tick, t_now_us, t_start_us, mode, b: vectors[0], bt: vectors[1], w: vectors[2], s: vectors[3] })
    }
}

/// A peer-visible single-writer snapshot, updated once per tick by the loop
/// driver and read by the publisher thread (spec §5's "peer-visible region
/// under a short exclusive lock").
pub type SharedSnapshot = Arc<Mutex<TelemetrySnapshot>>;

pub fn shared_snapshot() -> SharedSnapshot {
    Arc::new(Mutex::new(TelemetrySnapshot::default()))
}

/// Spawns the telemetry publisher thread: accepts connections on `addr` and
/// pushes the latest snapshot to every connected peer once per tick. Any
/// consumer of this port is out of scope (spec §1); this just serves bytes.
pub fn spawn_publisher(addr: &str, snapshot: SharedSnapshot, period: std::time::Duration) -> std::io::Result<std::thread::JoinHandle<()>> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(std::thread::spawn(move || {
        let mut peers: Vec<TcpStream> = Vec::new();
        loop {
            while let Ok((stream, _)) = listener.accept() {
                debug!("telemetry peer connected");
                peers.push(stream);
            }
            let bytes = snapshot.lock().unwrap().to_bytes();
            peers.retain_mut(|peer| match peer.write_all(&bytes) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "telemetry peer dropped");
                    false
                }
            });
            std::thread::sleep(period);
        }
    }))
}
