// src/display/gui/app.rs
//! Main window: status bar, data panel, sentence entry, map

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::Result;
use crate::geom::Point;
use crate::gps::{nmea, nmea::SentenceSummary, PositionData, PositionTracker};
use crate::map::TileCache;
use eframe::egui;
use std::{sync::Arc, time::Duration};

use super::map_view::MapView;

pub struct GeoflashApp {
    tracker: Arc<PositionTracker>,
    context: AppContext,
    map_view: MapView,
    tracking: bool,
    nmea_input: String,
    summary: Option<SentenceSummary>,
    summary_json: String,
    parse_error: Option<String>,
}

impl GeoflashApp {
    pub fn new(config: &AppConfig, tracker: Arc<PositionTracker>) -> Result<Self> {
        let tile_cache = TileCache::new(config.map.cache_dir()?)?;
        let center = Point::from_lon_lat(config.map.center_lon, config.map.center_lat);

        Ok(Self {
            tracker,
            context: AppContext::new(config.pulse),
            map_view: MapView::new(tile_cache, center, config.map.zoom),
            tracking: false,
            nmea_input: String::new(),
            summary: None,
            summary_json: String::new(),
            parse_error: None,
        })
    }

    /// Parse the pasted sentence and plot it. One marker per press;
    /// the marker-added notification starts its pulse.
    fn plot_sentence(&mut self) {
        match nmea::parse_sentence(&self.nmea_input) {
            Ok(summary) => {
                let point = Point::from_lon_lat(summary.longitude, summary.latitude);
                self.context.add_marker(point);
                self.map_view.center_on(point);
                self.summary_json = serde_json::to_string_pretty(&summary).unwrap_or_default();
                self.summary = Some(summary);
                self.parse_error = None;
            }
            Err(e) => {
                self.parse_error = Some(e.to_string());
            }
        }
    }

    fn data_panel(&mut self, ui: &mut egui::Ui, data: &PositionData) {
        ui.strong("\u{1f4cd} Position");
        ui.separator();

        if ui.checkbox(&mut self.tracking, "Track position").changed() {
            self.tracker.set_tracking(self.tracking);
        }
        ui.add_space(6.0);

        egui::Grid::new("position_grid")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Latitude:");
                ui.monospace(PositionData::format_coordinate(data.latitude));
                ui.end_row();

                ui.label("Longitude:");
                ui.monospace(PositionData::format_coordinate(data.longitude));
                ui.end_row();

                ui.label("Accuracy:");
                ui.monospace(PositionData::format_value(data.accuracy, "m"));
                ui.end_row();

                ui.label("Altitude:");
                ui.monospace(PositionData::format_value(data.altitude, "m"));
                ui.end_row();

                ui.label("Altitude accuracy:");
                ui.monospace(PositionData::format_value(data.altitude_accuracy, "m"));
                ui.end_row();

                ui.label("Heading:");
                ui.monospace(PositionData::format_value(data.heading, "\u{b0}"));
                ui.end_row();

                ui.label("Speed:");
                ui.monospace(PositionData::format_value(data.speed, "km/h"));
                ui.end_row();
            });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let can_drop = data.has_fix();
            if ui
                .add_enabled(can_drop, egui::Button::new("Drop marker"))
                .clicked()
            {
                if let (Some(lat), Some(lon)) = (data.latitude, data.longitude) {
                    self.context.add_marker(Point::from_lon_lat(lon, lat));
                }
            }
            if ui.button("Clear markers").clicked() {
                self.context.clear_markers();
            }
            ui.label(format!("{} plotted", self.context.marker_count()));
        });

        ui.add_space(10.0);
        ui.strong("\u{1f4dd} NMEA sentence");
        ui.separator();

        ui.add(
            egui::TextEdit::multiline(&mut self.nmea_input)
                .hint_text("$GPRMC,...")
                .desired_rows(2)
                .desired_width(f32::INFINITY)
                .font(egui::TextStyle::Monospace),
        );
        if ui.button("Plot sentence").clicked() {
            self.plot_sentence();
        }

        if let Some(summary) = &self.summary {
            ui.add_space(6.0);
            egui::Grid::new("summary_grid")
                .num_columns(2)
                .spacing([10.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Sentence:");
                    ui.monospace(format!("{}{}", summary.talker, summary.sentence));
                    ui.end_row();

                    if let Some(speed) = summary.speed_kmh {
                        ui.label("Speed:");
                        ui.monospace(format!("{:.1} km/h", speed));
                        ui.end_row();
                    }
                    if let Some(course) = summary.course {
                        ui.label("Course:");
                        ui.monospace(format!("{:.1}\u{b0}", course));
                        ui.end_row();
                    }
                    if let Some(alt) = summary.altitude {
                        ui.label("Altitude:");
                        ui.monospace(format!("{:.1} m", alt));
                        ui.end_row();
                    }
                });

            egui::CollapsingHeader::new("Parsed JSON")
                .default_open(false)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                        ui.monospace(&self.summary_json);
                    });
                });
        }

        let info = self.parse_error.clone().or_else(|| self.tracker.last_error());
        if let Some(message) = info {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::RED, message);
        }
    }
}

impl eframe::App for GeoflashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Refresh the readouts even while nothing animates
        ctx.request_repaint_after(Duration::from_secs(1));

        let frame_time_ms = ctx.input(|i| i.time) * 1000.0;
        self.context.begin_frame(frame_time_ms);

        let data = self.tracker.snapshot();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("\u{1f5fa} geoflash");
                ui.separator();

                let status_color = if data.timestamp.is_some() && data.is_recent() {
                    egui::Color32::GREEN
                } else {
                    egui::Color32::RED
                };
                ui.colored_label(status_color, "\u{25cf}");

                let timestamp_str = match data.timestamp {
                    Some(ts) => ts.format("%H:%M:%S UTC").to_string(),
                    None => "No data".to_string(),
                };
                ui.label(format!("Last Update: {}", timestamp_str));

                if let Some(ref source) = data.source {
                    ui.separator();
                    ui.label(format!("Source: {}", source));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("\u{274c} Exit").clicked() {
                        self.tracker.stop();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel")
            .resizable(true)
            .default_height(80.0)
            .show(ctx, |ui| {
                ui.label("\u{1f4dd} Latest NMEA Sentences");
                ui.separator();
                egui::ScrollArea::vertical().max_height(60.0).show(ui, |ui| {
                    if !data.raw_history.is_empty() {
                        for sentence in data.raw_history.iter().rev() {
                            ui.monospace(sentence);
                        }
                    } else {
                        ui.weak("No data received");
                    }
                });
            });

        egui::SidePanel::left("data_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.data_panel(ui, &data);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.map_view.ui(ui, &data, &self.context);
        });
    }
}
