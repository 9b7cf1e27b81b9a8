//! Structured logging infrastructure.

pub mod logger;

pub use logger::init;
