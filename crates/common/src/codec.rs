//! Binary encoding of [`VesselReport`](crate::domain::VesselReport) and
//! subject routing for the bus.

mod msgpack;

pub use msgpack::*;
