// src/gps/tracker.rs
//! Position acquisition from the configured source

use crate::{
    error::{AppError, Result},
    gps::{data::PositionData, gpsd, nmea},
};
use log::{error, info};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::SerialPortBuilderExt;

/// Where position readings come from.
#[derive(Debug, Clone)]
pub enum PositionSource {
    Serial { port: String, baudrate: u32 },
    Gpsd { host: String, port: u16 },
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSource::Serial { port, .. } => write!(f, "serial ({})", port),
            PositionSource::Gpsd { host, port } => write!(f, "gpsd ({}:{})", host, port),
        }
    }
}

/// Owns the shared position state and the reader task feeding it.
///
/// `tracking` mirrors the UI checkbox: while it is off, incoming
/// readings are discarded and the position overlay stands still.
pub struct PositionTracker {
    data: Arc<RwLock<PositionData>>,
    tracking: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(PositionData::new())),
            tracking: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(true)),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Connect to the source and spawn its reader task.
    pub async fn start(&self, source: PositionSource) -> Result<()> {
        info!("Starting position source: {}", source);
        match source {
            PositionSource::Serial { port, baudrate } => self.read_serial(&port, baudrate).await,
            PositionSource::Gpsd { host, port } => self.read_gpsd(&host, port).await,
        }
    }

    async fn read_serial(&self, port: &str, baudrate: u32) -> Result<()> {
        let serial = tokio_serial::new(port, baudrate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(|e| {
                AppError::Connection(format!("Failed to open serial port {}: {}", port, e))
            })?;

        let data = Arc::clone(&self.data);
        let tracking = Arc::clone(&self.tracking);
        let running = Arc::clone(&self.running);
        let last_error = Arc::clone(&self.last_error);

        tokio::spawn(async move {
            let mut reader = BufReader::new(serial);
            let mut line = String::new();

            while running.load(Ordering::Relaxed) {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() || !tracking.load(Ordering::Relaxed) {
                            continue;
                        }
                        let mut guard = data.write().unwrap();
                        guard.update_timestamp();
                        guard.add_raw_sentence(line);
                        guard.set_source("Serial GPS");
                        nmea::apply_sentence(&mut guard, line);
                    }
                    Err(e) => {
                        error!("Serial read error: {}", e);
                        *last_error.write().unwrap() = Some(format!("Serial read error: {}", e));
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn read_gpsd(&self, host: &str, port: u16) -> Result<()> {
        let mut reader = gpsd::connect(host, port).await?;
        info!("Connected to gpsd at {}:{}", host, port);

        let data = Arc::clone(&self.data);
        let tracking = Arc::clone(&self.tracking);
        let running = Arc::clone(&self.running);
        let last_error = Arc::clone(&self.last_error);

        tokio::spawn(async move {
            let mut line = String::new();

            while running.load(Ordering::Relaxed) {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() || !tracking.load(Ordering::Relaxed) {
                            continue;
                        }
                        let mut guard = data.write().unwrap();
                        guard.update_timestamp();
                        guard.add_raw_sentence(line);
                        guard.set_source("gpsd");
                        if let Err(e) = gpsd::apply_report(&mut guard, line) {
                            error!("gpsd report error: {}", e);
                        }
                    }
                    Err(e) => {
                        error!("gpsd read error: {}", e);
                        *last_error.write().unwrap() = Some(format!("gpsd read error: {}", e));
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Toggle whether incoming readings are applied.
    pub fn set_tracking(&self, enabled: bool) {
        self.tracking.store(enabled, Ordering::Relaxed);
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Clone of the current position state.
    pub fn snapshot(&self) -> PositionData {
        self.data.read().unwrap().clone()
    }

    /// Shared handle for display loops.
    pub fn shared_data(&self) -> Arc<RwLock<PositionData>> {
        Arc::clone(&self.data)
    }

    /// Record a source failure for the info row.
    pub fn report_error(&self, message: String) {
        *self.last_error.write().unwrap() = Some(message);
    }

    /// Most recent source failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// List serial ports a GPS device could be attached to.
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| AppError::Other(format!("Failed to list serial ports: {}", e)))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_defaults_off() {
        let tracker = PositionTracker::new();
        assert!(!tracker.is_tracking());
        tracker.set_tracking(true);
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_error_reporting_round_trip() {
        let tracker = PositionTracker::new();
        assert!(tracker.last_error().is_none());
        tracker.report_error("Connection refused".to_string());
        assert_eq!(tracker.last_error().as_deref(), Some("Connection refused"));
    }

    #[test]
    fn test_stop_clears_running() {
        let tracker = PositionTracker::new();
        assert!(tracker.is_running());
        tracker.stop();
        assert!(!tracker.is_running());
    }
}
