//! Subject management rules

pub mod service;

pub use service::SubjectService;
