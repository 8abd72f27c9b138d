// src/gps/nmea.rs
//! NMEA sentence parsing for the serial stream and manual entry

use super::data::PositionData;
use crate::error::{AppError, Result};
use serde::Serialize;

const KNOTS_TO_KMH: f64 = 1.852;

/// Fields derived from one manually entered sentence, displayed next to
/// the plotted marker (and echoed as JSON).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceSummary {
    pub sentence: String,
    pub talker: String,
    pub latitude: f64,
    pub longitude: f64,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellites: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdop: Option<f64>,
}

/// Parse one pasted RMC or GGA sentence into a plot-ready summary.
///
/// The sentence must carry coordinates; the checksum, when present, must
/// match. Failures come back as a message string for the info row.
pub fn parse_sentence(raw: &str) -> Result<SentenceSummary> {
    let line = raw.trim();
    if line.is_empty() {
        return Err(AppError::Parse("Empty sentence".to_string()));
    }
    if !line.starts_with('$') {
        return Err(AppError::Parse("Sentence must start with '$'".to_string()));
    }
    verify_checksum(line)?;

    let body = strip_checksum(line);
    let parts: Vec<&str> = body.split(',').collect();
    let header = parts[0].trim_start_matches('$');
    if header.len() < 5 || !header.is_ascii() {
        return Err(AppError::Parse(format!("Malformed header: {}", parts[0])));
    }
    let (talker, kind) = header.split_at(2);

    match kind {
        "RMC" => summarize_rmc(talker, &parts),
        "GGA" => summarize_gga(talker, &parts),
        other => Err(AppError::Parse(format!(
            "Unsupported sentence type: {}",
            other
        ))),
    }
}

fn summarize_rmc(talker: &str, parts: &[&str]) -> Result<SentenceSummary> {
    if parts.len() < 10 {
        return Err(AppError::Parse("Truncated RMC sentence".to_string()));
    }
    let (latitude, longitude) = parse_position(parts[3], parts[4], parts[5], parts[6])?;
    Ok(SentenceSummary {
        sentence: "RMC".to_string(),
        talker: talker.to_string(),
        latitude,
        longitude,
        valid: parts[2] == "A",
        speed_kmh: parse_field::<f64>(parts[7]).map(|kn| kn * KNOTS_TO_KMH),
        course: parse_field(parts[8]),
        altitude: None,
        fix_quality: None,
        satellites: None,
        hdop: None,
    })
}

fn summarize_gga(talker: &str, parts: &[&str]) -> Result<SentenceSummary> {
    if parts.len() < 10 {
        return Err(AppError::Parse("Truncated GGA sentence".to_string()));
    }
    let (latitude, longitude) = parse_position(parts[2], parts[3], parts[4], parts[5])?;
    let fix_quality = parse_field::<u8>(parts[6]);
    Ok(SentenceSummary {
        sentence: "GGA".to_string(),
        talker: talker.to_string(),
        latitude,
        longitude,
        valid: fix_quality.map_or(false, |q| q > 0),
        speed_kmh: None,
        course: None,
        altitude: parse_field(parts[9]),
        fix_quality,
        satellites: parse_field(parts[7]),
        hdop: parse_field(parts[8]),
    })
}

/// Apply a sentence from the live serial stream to the shared state.
/// Unknown sentence types are ignored.
pub fn apply_sentence(data: &mut PositionData, line: &str) {
    let body = strip_checksum(line);
    let parts: Vec<&str> = body.split(',').collect();

    if line.starts_with("$GPRMC") || line.starts_with("$GNRMC") {
        apply_rmc(data, &parts);
    } else if line.starts_with("$GPGGA") || line.starts_with("$GNGGA") {
        apply_gga(data, &parts);
    }
}

fn apply_rmc(data: &mut PositionData, parts: &[&str]) {
    if parts.len() < 10 {
        return;
    }
    if let Ok((lat, lon)) = parse_position(parts[3], parts[4], parts[5], parts[6]) {
        data.latitude = Some(lat);
        data.longitude = Some(lon);
    }
    if let Some(speed_knots) = parse_field::<f64>(parts[7]) {
        data.speed = Some(speed_knots * KNOTS_TO_KMH);
    }
    if let Some(course) = parse_field(parts[8]) {
        data.heading = Some(course);
    }
}

fn apply_gga(data: &mut PositionData, parts: &[&str]) {
    if parts.len() < 15 {
        return;
    }
    if let Ok((lat, lon)) = parse_position(parts[2], parts[3], parts[4], parts[5]) {
        data.latitude = Some(lat);
        data.longitude = Some(lon);
    }
    if let Some(quality) = parse_field(parts[6]) {
        data.fix_quality = Some(quality);
    }
    if let Some(alt) = parse_field(parts[9]) {
        data.altitude = Some(alt);
    }
}

/// Convert the ddmm.mmmm / hemisphere field pair into signed decimal
/// degrees.
fn parse_position(lat: &str, ns: &str, lon: &str, ew: &str) -> Result<(f64, f64)> {
    if lat.is_empty() || lon.is_empty() {
        return Err(AppError::Parse("Sentence carries no position".to_string()));
    }

    let lat_raw: f64 = lat
        .parse()
        .map_err(|_| AppError::Parse(format!("Bad latitude field: {}", lat)))?;
    let lon_raw: f64 = lon
        .parse()
        .map_err(|_| AppError::Parse(format!("Bad longitude field: {}", lon)))?;

    let mut latitude = (lat_raw / 100.0).trunc() + (lat_raw % 100.0) / 60.0;
    if ns == "S" {
        latitude = -latitude;
    }
    let mut longitude = (lon_raw / 100.0).trunc() + (lon_raw % 100.0) / 60.0;
    if ew == "W" {
        longitude = -longitude;
    }
    Ok((latitude, longitude))
}

fn parse_field<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() {
        None
    } else {
        field.parse().ok()
    }
}

fn strip_checksum(line: &str) -> &str {
    line.split('*').next().unwrap_or(line)
}

/// Validate the trailing `*HH` checksum when one is present. The
/// checksum is the XOR of every byte between `$` and `*`.
fn verify_checksum(line: &str) -> Result<()> {
    let Some(star) = line.rfind('*') else {
        return Ok(());
    };

    let given = &line[star + 1..];
    let expected = u8::from_str_radix(given.trim(), 16)
        .map_err(|_| AppError::Parse(format!("Malformed checksum: *{}", given)))?;

    let computed = line[1..star].bytes().fold(0u8, |acc, b| acc ^ b);
    if computed != expected {
        return Err(AppError::Parse(format!(
            "Checksum mismatch: computed {:02X}, sentence says {:02X}",
            computed, expected
        )));
    }
    Ok(())
}
