// src/display/terminal.rs
//! Terminal readout of the live position fields

use crate::{error::Result, gps::PositionData, gps::PositionTracker};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};
use tokio::time::sleep;

pub struct TerminalDisplay;

impl TerminalDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Refresh the readout once a second until Ctrl+C.
    pub async fn run(&self, tracker: Arc<PositionTracker>) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap)?;

        let ctrl_c_tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c_tracker.stop();
            }
        });

        while tracker.is_running() {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

            let data = tracker.snapshot();
            self.render(&mut stdout, &data, tracker.last_error())?;

            stdout.flush()?;
            sleep(Duration::from_secs(1)).await;
        }

        execute!(stdout, Show, EnableLineWrap)?;
        println!("\nShutting down...");
        Ok(())
    }

    fn render(
        &self,
        stdout: &mut impl Write,
        data: &PositionData,
        last_error: Option<String>,
    ) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("geoflash - live position readout"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )?;

        let timestamp_str = match data.timestamp {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "No data received".to_string(),
        };
        let source_str = data.source.as_deref().unwrap_or("Unknown");
        execute!(
            stdout,
            Print(format!("Last Update: {} ({})\n\n", timestamp_str, source_str))
        )?;

        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("POSITION:\n"),
            ResetColor,
            Print(format!(
                "  Latitude:           {}\n",
                PositionData::format_coordinate(data.latitude)
            )),
            Print(format!(
                "  Longitude:          {}\n",
                PositionData::format_coordinate(data.longitude)
            )),
            Print(format!(
                "  Accuracy:           {}\n",
                PositionData::format_value(data.accuracy, "m")
            )),
            Print(format!(
                "  Altitude:           {}\n",
                PositionData::format_value(data.altitude, "m")
            )),
            Print(format!(
                "  Altitude accuracy:  {}\n\n",
                PositionData::format_value(data.altitude_accuracy, "m")
            ))
        )?;

        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("MOVEMENT:\n"),
            ResetColor,
            Print(format!(
                "  Heading:            {}\n",
                PositionData::format_value(data.heading, "\u{b0}")
            )),
            Print(format!(
                "  Speed:              {}\n\n",
                PositionData::format_value(data.speed, "km/h")
            ))
        )?;

        execute!(
            stdout,
            SetForegroundColor(Color::Blue),
            Print("RAW DATA:\n"),
            ResetColor
        )?;
        let raw_display = if data.raw_data.is_empty() {
            "No data"
        } else {
            &data.raw_data
        };
        execute!(stdout, Print(format!("  {}\n\n", raw_display)))?;

        if let Some(message) = last_error {
            execute!(
                stdout,
                SetForegroundColor(Color::Red),
                Print(format!("{}\n\n", message)),
                ResetColor
            )?;
        }

        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to exit"),
            Print("\n"),
            ResetColor
        )?;

        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}
