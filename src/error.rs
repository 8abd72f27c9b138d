// src/error.rs
//! Error types for geoflash

use std::fmt;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Parse(String),
    #[cfg(feature = "gui")]
    Gui(eframe::Error),
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "IO error: {}", e),
            AppError::Serial(e) => write!(f, "Serial error: {}", e),
            AppError::Json(e) => write!(f, "JSON error: {}", e),
            AppError::Connection(msg) => write!(f, "Connection error: {}", msg),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            #[cfg(feature = "gui")]
            AppError::Gui(e) => write!(f, "GUI error: {}", e),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Io(error)
    }
}

impl From<tokio_serial::Error> for AppError {
    fn from(error: tokio_serial::Error) -> Self {
        AppError::Serial(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Json(error)
    }
}

#[cfg(feature = "gui")]
impl From<eframe::Error> for AppError {
    fn from(error: eframe::Error) -> Self {
        AppError::Gui(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Other(error.to_string())
    }
}
