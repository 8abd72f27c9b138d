// src/main.rs
//! geoflash - slippy-map position viewer with pulsing markers

use clap::Parser;
use geoflash::{
    config::AppConfig,
    display,
    error::Result,
    gps::{tracker, PositionTracker},
};
use log::warn;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "geoflash", version, about = "Map position viewer with NMEA plotting")]
struct Args {
    /// Position source override: "gpsd" or "serial"
    #[arg(long)]
    source: Option<String>,

    /// gpsd host override
    #[arg(long)]
    gpsd_host: Option<String>,

    /// gpsd port override
    #[arg(long)]
    gpsd_port: Option<u16>,

    /// Serial device override, e.g. /dev/ttyUSB0
    #[arg(long)]
    serial_port: Option<String>,

    /// Serial baud rate override
    #[arg(long)]
    serial_baudrate: Option<u32>,

    /// Run the terminal readout instead of the map window
    #[arg(long)]
    headless: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_ports {
        let ports = tracker::list_serial_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        } else {
            println!("Available serial ports:");
            for port in ports {
                println!("  {}", port);
            }
        }
        return Ok(());
    }

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(source) = args.source {
        config.source.source_type = source;
    }
    if let Some(host) = args.gpsd_host {
        config.source.gpsd_host = host;
    }
    if let Some(port) = args.gpsd_port {
        config.source.gpsd_port = port;
    }
    if let Some(port) = args.serial_port {
        config.source.source_type = "serial".to_string();
        config.source.serial_port = Some(port);
    }
    if let Some(baudrate) = args.serial_baudrate {
        config.source.serial_baudrate = baudrate;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let position_tracker = Arc::new(PositionTracker::new());

    // A dead source is not fatal: the window still opens and the
    // failure message lands in the info row.
    match config.source.position_source() {
        Ok(source) => {
            if let Err(e) = runtime.block_on(position_tracker.start(source)) {
                warn!("Position source unavailable: {}", e);
                position_tracker.report_error(e.to_string());
            }
        }
        Err(e) => {
            warn!("{}", e);
            position_tracker.report_error(e.to_string());
        }
    }

    if args.headless || !display::should_use_gui() {
        position_tracker.set_tracking(true);
        let terminal = display::terminal::TerminalDisplay::new();
        return runtime.block_on(terminal.run(position_tracker));
    }

    run_gui(&config, position_tracker)
}

#[cfg(feature = "gui")]
fn run_gui(config: &AppConfig, position_tracker: Arc<PositionTracker>) -> Result<()> {
    let app = geoflash::GeoflashApp::new(config, Arc::clone(&position_tracker))?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("geoflash")
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "geoflash",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(eframe::egui::Visuals::dark());
            Ok(Box::new(app))
        }),
    )?;

    position_tracker.stop();
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: &AppConfig, _position_tracker: Arc<PositionTracker>) -> Result<()> {
    Err(geoflash::AppError::Other(
        "GUI support not compiled in; run with --headless".to_string(),
    ))
}
