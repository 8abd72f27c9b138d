// src/gps/gpsd.rs
//! gpsd client, the desktop stand-in for a platform geolocation API

use super::data::PositionData;
use crate::error::{AppError, Result};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Connect to a gpsd daemon and switch it into JSON watch mode.
pub async fn connect(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| {
            AppError::Connection(format!(
                "Failed to connect to gpsd at {}:{}: {}",
                host, port, e
            ))
        })?;

    let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
    stream
        .write_all(watch_cmd.as_bytes())
        .await
        .map_err(|e| AppError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// Apply one line of gpsd JSON to the shared position state.
pub fn apply_report(data: &mut PositionData, line: &str) -> Result<()> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| AppError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    match msg.class.as_str() {
        "TPV" => apply_tpv(data, &msg.data),
        "VERSION" => {
            if let Some(release) = msg.data.get("release").and_then(|v| v.as_str()) {
                info!("Connected to gpsd version {}", release);
            }
        }
        "DEVICES" => {
            if let Some(devices) = msg.data.get("devices").and_then(|v| v.as_array()) {
                info!("gpsd managing {} device(s)", devices.len());
            }
        }
        _ => {}
    }

    Ok(())
}

/// TPV carries position, velocity, and the error estimates that feed
/// the accuracy readouts.
fn apply_tpv(data: &mut PositionData, fields: &HashMap<String, serde_json::Value>) {
    let get = |key: &str| fields.get(key).and_then(|v| v.as_f64());

    if let Some(lat) = get("lat") {
        data.latitude = Some(lat);
    }
    if let Some(lon) = get("lon") {
        data.longitude = Some(lon);
    }
    if let Some(alt) = get("alt") {
        data.altitude = Some(alt);
    }
    if let Some(speed) = get("speed") {
        data.speed = Some(speed * 3.6); // m/s to km/h
    }
    if let Some(track) = get("track") {
        data.heading = Some(track);
    }

    // Horizontal accuracy: eph when the daemon provides it, otherwise
    // the larger of the per-axis estimates.
    match (get("eph"), get("epx"), get("epy")) {
        (Some(eph), _, _) => data.accuracy = Some(eph),
        (None, Some(epx), Some(epy)) => data.accuracy = Some(epx.max(epy)),
        (None, Some(ep), None) | (None, None, Some(ep)) => data.accuracy = Some(ep),
        (None, None, None) => {}
    }
    if let Some(epv) = get("epv") {
        data.altitude_accuracy = Some(epv);
    }
}
