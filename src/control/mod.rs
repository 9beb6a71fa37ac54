//! Control laws dispatched by mode. See spec §4.F/§4.G.

pub mod detumble;
pub mod sunpoint;
