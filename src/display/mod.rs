// src/display/mod.rs
//! Display front ends: egui map window and terminal readout

pub mod terminal;

#[cfg(feature = "gui")]
pub mod gui;

/// Whether a graphical session is available.
#[cfg(feature = "gui")]
pub fn should_use_gui() -> bool {
    std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
}

#[cfg(not(feature = "gui"))]
pub fn should_use_gui() -> bool {
    false
}
