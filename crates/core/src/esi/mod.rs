//! ESI capability port

pub mod ports;

pub use ports::EsiClient;
