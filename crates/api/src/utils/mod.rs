//! Helpers shared by the binary and the routes

pub mod logging;
