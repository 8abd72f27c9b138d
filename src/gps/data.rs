// src/gps/data.rs
//! Shared position state fed by the active source

use chrono::{DateTime, Utc};

/// Latest device position and the derived fields shown in the UI.
#[derive(Debug, Clone, Default)]
pub struct PositionData {
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,          // meters, horizontal
    pub altitude: Option<f64>,          // meters
    pub altitude_accuracy: Option<f64>, // meters
    pub heading: Option<f64>,           // degrees, true
    pub speed: Option<f64>,             // km/h
    pub fix_quality: Option<u8>,
    pub source: Option<String>,
    pub raw_data: String,
    pub raw_history: Vec<String>,
}

impl PositionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a usable position fix is present.
    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Age of the newest reading in seconds.
    pub fn age_seconds(&self) -> Option<i64> {
        self.timestamp
            .map(|ts| Utc::now().signed_duration_since(ts).num_seconds())
    }

    /// Fresh within the last 10 seconds.
    pub fn is_recent(&self) -> bool {
        self.age_seconds().map_or(false, |age| age < 10)
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = Some(Utc::now());
    }

    pub fn set_source(&mut self, source: &str) {
        self.source = Some(source.to_string());
    }

    /// Record a raw sentence, keeping the last five for display.
    pub fn add_raw_sentence(&mut self, sentence: &str) {
        self.raw_data = sentence.to_string();
        self.raw_history.push(sentence.to_string());
        if self.raw_history.len() > 5 {
            self.raw_history.remove(0);
        }
    }

    pub fn fix_description(&self) -> String {
        match self.fix_quality {
            Some(0) => "No fix".to_string(),
            Some(1) => "GPS".to_string(),
            Some(2) => "DGPS".to_string(),
            Some(3) => "PPS".to_string(),
            Some(4) => "RTK".to_string(),
            Some(5) => "Float RTK".to_string(),
            Some(6) => "Estimated".to_string(),
            Some(q) => format!("Unknown ({})", q),
            None => "Unknown".to_string(),
        }
    }

    pub fn format_coordinate(coord: Option<f64>) -> String {
        match coord {
            Some(val) => format!("{:.6}\u{b0}", val),
            None => "No fix".to_string(),
        }
    }

    pub fn format_value<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
        match value {
            Some(val) => format!("{:.1} {}", val, unit),
            None => "undefined".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_fix_requires_both_coordinates() {
        let mut data = PositionData::new();
        assert!(!data.has_fix());
        data.latitude = Some(42.0);
        assert!(!data.has_fix());
        data.longitude = Some(-71.0);
        assert!(data.has_fix());
    }

    #[test]
    fn test_raw_history_keeps_last_five() {
        let mut data = PositionData::new();
        for i in 0..8 {
            data.add_raw_sentence(&format!("$GPRMC,{}", i));
        }
        assert_eq!(data.raw_history.len(), 5);
        assert_eq!(data.raw_history[0], "$GPRMC,3");
        assert_eq!(data.raw_data, "$GPRMC,7");
    }

    #[test]
    fn test_format_value_undefined_without_reading() {
        let missing: Option<f64> = None;
        assert_eq!(PositionData::format_value(missing, "m"), "undefined");
        assert_eq!(PositionData::format_value(Some(3.25), "m"), "3.2 m");
    }
}
