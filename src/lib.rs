pub mod geography;
pub mod net;
pub mod config;
pub mod log;
pub mod collections;
pub mod error;
pub mod report;
pub mod session;
