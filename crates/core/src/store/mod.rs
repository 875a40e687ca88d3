//! Store ports

pub mod ports;

pub use ports::*;
