// src/lib.rs
//! geoflash library
//!
//! Slippy-map position viewer: live device position, manually plotted
//! NMEA coordinates, and a pulsing animation on every new marker.

pub mod animate;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod geom;
pub mod gps;
pub mod map;
pub mod render;

// Re-export main types for convenience
pub use animate::{Easing, Pulse, PulseStyle};
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AppError, Result};
pub use geom::Point;
pub use gps::{PositionData, PositionSource, PositionTracker};

#[cfg(feature = "gui")]
pub use display::gui::GeoflashApp;
