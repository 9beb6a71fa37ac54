//! The `ControlCore` aggregate: every piece of state the loop driver owns
//! exclusively across ticks. See spec §9 ("a systems-language re-architecture
//! should encapsulate these in a single `ControlCore` aggregate").
//!
//! Generalizes the teacher's RTIC `Shared` struct (which centralizes
//! `Params`, `StateVolatile`, `SystemStatus` under one owner locked per
//! field) to a plain struct passed by `&mut` — no RTIC resource locking is
//! needed since this core has a single owner thread.

use crate::buffers::DerivedBuffers;
use crate::filter::Filter;
use crate::mode::ModeState;
use crate::sensor_frame::MuxSkipMask;
use crate::tunables::Tunables;

pub struct ControlCore {
    pub tunables: Tunables,
    pub buffers: DerivedBuffers,
    pub mode: ModeState,
    pub mux_skip: MuxSkipMask,
    pub b_filter: Filter<64>,
    pub bt_filter: Filter<64>,
    pub w_filter: Filter<64>,
    pub tick: u64,
    pub t_start_us: u64,
    /// Consecutive ticks since the buffers last stabilized; exposed via
    /// telemetry as the structural-failure counter (spec §7).
    pub unstable_ticks: u64,
}

impl ControlCore {
    pub fn new(tunables: Tunables, t_start_us: u64) -> Self {
        Self {
            tunables,
            buffers: DerivedBuffers::new(),
            mode: ModeState::new(),
            mux_skip: MuxSkipMask::empty(),
            b_filter: Filter::new(),
            bt_filter: Filter::new(),
            w_filter: Filter::new(),
            tick: 0,
            t_start_us,
            unstable_ticks: 0,
        }
    }

    /// Buffer-flush-and-NIGHT path (spec §4.H step 2, §7 "per-tick hard
    /// error"). `first_detumble_done` is not cleared (spec §9, open
    /// question a).
    pub fn flush_and_force_night(&mut self) {
        self.buffers.reset_all();
        self.mode.state = crate::mode::ControlState::Night;
        self.unstable_ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_resets_buffers_but_not_first_detumble_latch() {
        use crate::vector3::Vector3;
        let mut core = ControlCore::new(Tunables::default(), 0);
        core.buffers.b.push(Vector3::new(1.0, 0.0, 0.0));
        core.mode.first_detumble_done = true;
        core.flush_and_force_night();
        assert!(core.buffers.b.is_empty());
        assert!(core.mode.first_detumble_done);
        assert_eq!(core.mode.state, crate::mode::ControlState::Night);
    }
}
