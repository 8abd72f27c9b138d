// src/display/gui/map_view.rs
//! Slippy-map panel: tiles, position overlay, markers, pulse pass

use crate::context::AppContext;
use crate::geom::Point;
use crate::gps::PositionData;
use crate::map::tiles::{self, TileCache, TileId, TILE_SIZE};
use crate::render::{DrawSurface, OverlayStroke};
use eframe::egui;
use std::collections::HashMap;

const MIN_ZOOM: u8 = 1;
const MAX_ZOOM: u8 = 18;

pub struct MapView {
    tile_cache: TileCache,
    zoom: u8,
    center: Point,
    follow_position: bool,
    loaded_tiles: HashMap<TileId, egui::TextureHandle>,
}

impl MapView {
    pub fn new(tile_cache: TileCache, center: Point, zoom: u8) -> Self {
        Self {
            tile_cache,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            center,
            follow_position: true,
            loaded_tiles: HashMap::new(),
        }
    }

    /// Re-center on a plotted coordinate.
    pub fn center_on(&mut self, point: Point) {
        self.center = point;
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, position: &PositionData, app: &AppContext) {
        if self.follow_position {
            if let (Some(lat), Some(lon)) = (position.latitude, position.longitude) {
                self.center = Point::from_lon_lat(lon, lat);
            }
        }

        self.controls(ui);
        ui.separator();

        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, egui::Sense::drag());
        let rect = response.rect;
        let painter = painter.with_clip_rect(rect);

        if response.dragged() && !self.follow_position {
            self.pan(response.drag_delta());
        }

        self.render_tiles(ui.ctx(), &painter, rect);
        self.render_markers(&painter, rect, app);
        self.render_position(&painter, rect, position);

        // Transient pulse overlays draw on top of everything else
        let mut surface = PainterSurface {
            painter: &painter,
            rect,
            center_px: tiles::world_pixel(self.center, self.zoom),
            zoom: self.zoom,
        };
        if app.run_overlay_pass(&mut surface) {
            ui.ctx().request_repaint();
        }

        ui.separator();
        ui.horizontal(|ui| {
            let (lon, lat) = self.center.to_lon_lat();
            ui.label(format!("Center: {:.6}, {:.6}", lat, lon));
            if let (Some(lat), Some(lon)) = (position.latitude, position.longitude) {
                ui.separator();
                ui.label(format!("GPS: {:.6}, {:.6}", lat, lon));
            }
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Zoom:");
            if ui.button("\u{2796}").clicked() && self.zoom > MIN_ZOOM {
                self.zoom -= 1;
            }
            ui.label(format!("{}", self.zoom));
            if ui.button("\u{2795}").clicked() && self.zoom < MAX_ZOOM {
                self.zoom += 1;
            }

            ui.separator();
            ui.checkbox(&mut self.follow_position, "\u{1f4cd} Follow GPS");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let stats = self.tile_cache.stats();
                ui.label(format!(
                    "Cache: {} tiles ({:.1} MB)",
                    stats.disk_tiles, stats.disk_mb
                ));
                if ui.button("\u{1f5d1} Clear Cache").clicked() {
                    let _ = self.tile_cache.clear_disk();
                    self.tile_cache.clear_memory();
                    self.loaded_tiles.clear();
                }
            });
        });
    }

    fn render_tiles(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect) {
        let (cx, cy) = tiles::world_pixel(self.center, self.zoom);
        let max_index = 2_i64.pow(self.zoom as u32) - 1;

        let half_w = rect.width() as f64 / 2.0;
        let half_h = rect.height() as f64 / 2.0;
        let first_x = ((cx - half_w) / TILE_SIZE).floor() as i64;
        let last_x = ((cx + half_w) / TILE_SIZE).floor() as i64;
        let first_y = ((cy - half_h) / TILE_SIZE).floor() as i64;
        let last_y = ((cy + half_h) / TILE_SIZE).floor() as i64;

        for ty in first_y.max(0)..=last_y.min(max_index) {
            for tx in first_x.max(0)..=last_x.min(max_index) {
                let id = TileId {
                    zoom: self.zoom,
                    x: tx as u32,
                    y: ty as u32,
                };
                let screen_x = rect.center().x + (tx as f64 * TILE_SIZE - cx) as f32;
                let screen_y = rect.center().y + (ty as f64 * TILE_SIZE - cy) as f32;
                self.render_tile(ctx, painter, id, screen_x, screen_y);
            }
        }
    }

    fn render_tile(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        id: TileId,
        screen_x: f32,
        screen_y: f32,
    ) {
        let tile_rect = egui::Rect::from_min_size(
            egui::pos2(screen_x, screen_y),
            egui::vec2(TILE_SIZE as f32, TILE_SIZE as f32),
        );
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        if let Some(texture) = self.loaded_tiles.get(&id) {
            painter.image(texture.id(), tile_rect, uv, egui::Color32::WHITE);
            return;
        }

        match self.tile_cache.get(id) {
            Some(bytes) => {
                if let Ok(decoded) = image::load_from_memory(&bytes) {
                    let size = [decoded.width() as usize, decoded.height() as usize];
                    let rgba = decoded.to_rgba8();
                    let pixels = rgba.as_flat_samples();
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());

                    let texture = ctx.load_texture(
                        format!("tile_{}_{}_{}", id.zoom, id.x, id.y),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    painter.image(texture.id(), tile_rect, uv, egui::Color32::WHITE);
                    self.loaded_tiles.insert(id, texture);
                }
            }
            None => {
                self.tile_cache.fetch_async(id);
                painter.rect_filled(tile_rect, 0.0, egui::Color32::from_gray(240));
                painter.text(
                    tile_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Loading...",
                    egui::FontId::proportional(12.0),
                    egui::Color32::GRAY,
                );
            }
        }
    }

    fn render_markers(&self, painter: &egui::Painter, rect: egui::Rect, app: &AppContext) {
        for feature in app.markers() {
            let pos = self.to_screen(feature.geometry(), rect);
            painter.circle_filled(pos, 6.0, egui::Color32::RED);
            painter.circle_stroke(pos, 6.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
        }
    }

    fn render_position(&self, painter: &egui::Painter, rect: egui::Rect, position: &PositionData) {
        let (Some(lat), Some(lon)) = (position.latitude, position.longitude) else {
            return;
        };
        let point = Point::from_lon_lat(lon, lat);
        let pos = self.to_screen(point, rect);

        // Accuracy ring scaled to the current ground resolution
        if let Some(accuracy) = position.accuracy {
            let radius = (accuracy / tiles::meters_per_pixel(self.zoom)) as f32;
            if radius > 1.0 {
                painter.circle_stroke(
                    pos,
                    radius,
                    egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(51, 153, 204, 120)),
                );
            }
        }

        painter.circle_filled(pos, 6.0, egui::Color32::from_rgb(51, 153, 204));
        painter.circle_stroke(pos, 6.0, egui::Stroke::new(2.0, egui::Color32::WHITE));

        if let Some(heading) = position.heading {
            let angle = heading.to_radians();
            let end = pos + egui::vec2(angle.sin() as f32 * 15.0, -angle.cos() as f32 * 15.0);
            painter.line_segment([pos, end], egui::Stroke::new(3.0, egui::Color32::WHITE));
        }
    }

    fn to_screen(&self, p: Point, rect: egui::Rect) -> egui::Pos2 {
        let (cx, cy) = tiles::world_pixel(self.center, self.zoom);
        let (px, py) = tiles::world_pixel(p, self.zoom);
        egui::pos2(
            rect.center().x + (px - cx) as f32,
            rect.center().y + (py - cy) as f32,
        )
    }

    fn pan(&mut self, delta: egui::Vec2) {
        let mpp = tiles::meters_per_pixel(self.zoom);
        // Screen y grows downward, mercator y grows northward
        self.center = Point::new(
            self.center.x() - delta.x as f64 * mpp,
            self.center.y() + delta.y as f64 * mpp,
        );
    }
}

/// egui painter adapter for the overlay render pass.
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    rect: egui::Rect,
    center_px: (f64, f64),
    zoom: u8,
}

impl DrawSurface for PainterSurface<'_> {
    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: OverlayStroke) {
        let (px, py) = tiles::world_pixel(center, self.zoom);
        let pos = egui::pos2(
            self.rect.center().x + (px - self.center_px.0) as f32,
            self.rect.center().y + (py - self.center_px.1) as f32,
        );
        let alpha = (stroke.opacity.clamp(0.0, 1.0) * 255.0) as u8;
        let color = egui::Color32::from_rgba_unmultiplied(
            stroke.color[0],
            stroke.color[1],
            stroke.color[2],
            alpha,
        );
        self.painter
            .circle_stroke(pos, radius as f32, egui::Stroke::new(stroke.width as f32, color));
    }
}
