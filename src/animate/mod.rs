// src/animate/mod.rs
//! Marker pulse animation

pub mod ease;
pub mod pulse;

pub use ease::Easing;
pub use pulse::{flash, Pulse, PulseFrame, PulseStyle};
