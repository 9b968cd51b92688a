// src/lib.rs
//! GPS Gateway Library
//!
//! Reads NMEA-0183 sentences from a serial GPS receiver, keeps the most
//! recent validated position fix, and serves it to UDP clients.

pub mod config;
pub mod dump;
pub mod error;
pub mod gateway;
pub mod gps;
pub mod network;

// Re-export main types for convenience
pub use config::GatewayConfig;
pub use error::{GpsError, Result};
pub use gateway::GpsGateway;
pub use gps::data::PositionFix;
pub use gps::nmea::NmeaDecoder;
