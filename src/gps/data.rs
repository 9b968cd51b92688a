// src/gps/data.rs
//! Position fix record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The most recent validated position fix.
///
/// Coordinates are kept exactly as the receiver sent them (sexagesimal text,
/// e.g. "4916.45") together with their hemisphere markers. A fresh record is
/// built for every valid sentence and swapped in whole, so a partially
/// applied sentence cannot be observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: String,
    pub latitude_ns: String,
    pub longitude: String,
    pub longitude_ew: String,
    pub altitude_feet: f64,
    pub speed_knots: f64,
    pub bearing_degrees: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PositionFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the record holds a position from a validated sentence
    pub fn has_fix(&self) -> bool {
        !self.latitude.is_empty() && !self.longitude.is_empty()
    }

    /// Get the age of the fix in seconds
    pub fn age_seconds(&self) -> Option<i64> {
        self.timestamp
            .map(|ts| Utc::now().signed_duration_since(ts).num_seconds())
    }

    /// Check if the fix is recent (within 10 seconds)
    pub fn is_recent(&self) -> bool {
        self.age_seconds().map_or(false, |age| age < 10)
    }

    /// Update the timestamp to now
    pub fn update_timestamp(&mut self) {
        self.timestamp = Some(Utc::now());
    }

    /// Format the position for display, e.g. "4807.038N 01131.000E"
    pub fn format_position(&self) -> String {
        if self.has_fix() {
            format!(
                "{}{} {}{}",
                self.latitude, self.latitude_ns, self.longitude, self.longitude_ew
            )
        } else {
            "No fix".to_string()
        }
    }
}
