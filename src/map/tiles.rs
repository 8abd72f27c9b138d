// src/map/tiles.rs
//! Slippy-map tile math plus OpenStreetMap tile fetching and caching

use crate::error::{AppError, Result};
use crate::geom::Point;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Square tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Full extent of the web-mercator plane in meters.
const CIRCUMFERENCE: f64 = 40_075_016.685_578_49;

/// Ground resolution of one pixel at a zoom level, in meters.
pub fn meters_per_pixel(zoom: u8) -> f64 {
    CIRCUMFERENCE / (TILE_SIZE * 2_f64.powi(zoom as i32))
}

/// Project a mercator point into world pixel coordinates at a zoom
/// level. Pixel y grows southward, matching the tile grid.
pub fn world_pixel(p: Point, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * 2_f64.powi(zoom as i32) / CIRCUMFERENCE;
    let px = (p.x() + CIRCUMFERENCE / 2.0) * scale;
    let py = (CIRCUMFERENCE / 2.0 - p.y()) * scale;
    (px, py)
}

/// The tile containing a mercator point at a zoom level.
pub fn tile_at(p: Point, zoom: u8) -> (u32, u32) {
    let max = 2_u32.pow(zoom as u32) - 1;
    let (px, py) = world_pixel(p, zoom);
    let x = (px / TILE_SIZE).floor().clamp(0.0, max as f64) as u32;
    let y = (py / TILE_SIZE).floor().clamp(0.0, max as f64) as u32;
    (x, y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

/// Downloaded-tile store: bounded memory map over a disk directory,
/// with background fetches capped to stay inside the OSM usage policy.
#[derive(Clone)]
pub struct TileCache {
    cache_dir: PathBuf,
    in_memory: Arc<Mutex<HashMap<TileId, Arc<Vec<u8>>>>>,
    in_flight: Arc<Mutex<HashSet<TileId>>>,
    max_memory_tiles: usize,
    max_parallel_fetches: usize,
}

impl TileCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| AppError::Other(format!("Failed to create tile cache dir: {}", e)))?;

        Ok(Self {
            cache_dir,
            in_memory: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            max_memory_tiles: 128,
            max_parallel_fetches: 4,
        })
    }

    /// Look a tile up in memory, then on disk. Absent tiles return
    /// `None`; callers kick off `fetch_async` and draw a placeholder.
    pub fn get(&self, id: TileId) -> Option<Arc<Vec<u8>>> {
        if let Some(tile) = self.in_memory.lock().unwrap().get(&id) {
            return Some(Arc::clone(tile));
        }

        let path = self.tile_path(id);
        if path.exists() {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let tile = Arc::new(bytes);
                    self.remember(id, Arc::clone(&tile));
                    return Some(tile);
                }
                Err(e) => warn!("Failed to read cached tile {:?}: {}", id, e),
            }
        }
        None
    }

    /// Start a background download unless one is already running or too
    /// many fetches are in flight.
    pub fn fetch_async(&self, id: TileId) {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if in_flight.len() >= self.max_parallel_fetches || in_flight.contains(&id) {
                return;
            }
            in_flight.insert(id);
        }

        let cache = self.clone();
        std::thread::spawn(move || {
            match Self::fetch(id) {
                Ok(bytes) => {
                    let path = cache.tile_path(id);
                    if let Some(parent) = path.parent() {
                        let _ = std::fs::create_dir_all(parent);
                    }
                    if let Err(e) = std::fs::write(&path, &bytes) {
                        warn!("Failed to store tile {:?}: {}", id, e);
                    }
                    cache.remember(id, Arc::new(bytes));
                    debug!("Fetched tile {:?}", id);
                }
                Err(e) => warn!("Tile fetch {:?} failed: {}", id, e),
            }
            cache.in_flight.lock().unwrap().remove(&id);
        });
    }

    fn fetch(id: TileId) -> Result<Vec<u8>> {
        let url = format!(
            "https://tile.openstreetmap.org/{}/{}/{}.png",
            id.zoom, id.x, id.y
        );

        let client = reqwest::blocking::Client::builder()
            .user_agent("geoflash/0.1 (map position viewer)")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Other(format!("HTTP client error: {}", e)))?;

        let response = client
            .get(&url)
            .send()
            .map_err(|e| AppError::Other(format!("Tile download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Other(format!("HTTP error: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| AppError::Other(format!("Failed to read tile body: {}", e)))?
            .to_vec();

        // Stay polite to the public tile servers
        std::thread::sleep(std::time::Duration::from_millis(100));

        Ok(bytes)
    }

    fn remember(&self, id: TileId, tile: Arc<Vec<u8>>) {
        let mut cache = self.in_memory.lock().unwrap();
        if cache.len() >= self.max_memory_tiles {
            if let Some(evict) = cache.keys().next().copied() {
                cache.remove(&evict);
            }
        }
        cache.insert(id, tile);
    }

    fn tile_path(&self, id: TileId) -> PathBuf {
        self.cache_dir
            .join(format!("{}/{}/{}.png", id.zoom, id.x, id.y))
    }

    pub fn stats(&self) -> TileCacheStats {
        let memory_tiles = self.in_memory.lock().unwrap().len();

        let mut disk_tiles = 0;
        let mut disk_bytes = 0u64;
        let mut stack = vec![self.cache_dir.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(meta) = entry.metadata() else { continue };
                if meta.is_dir() {
                    stack.push(entry.path());
                } else {
                    disk_tiles += 1;
                    disk_bytes += meta.len();
                }
            }
        }

        TileCacheStats {
            memory_tiles,
            disk_tiles,
            disk_mb: disk_bytes as f64 / 1_048_576.0,
        }
    }

    pub fn clear_memory(&self) {
        self.in_memory.lock().unwrap().clear();
    }

    pub fn clear_disk(&self) -> Result<()> {
        std::fs::remove_dir_all(&self.cache_dir)
            .map_err(|e| AppError::Other(format!("Failed to clear tile cache: {}", e)))?;
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| AppError::Other(format!("Failed to recreate tile cache dir: {}", e)))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TileCacheStats {
    pub memory_tiles: usize,
    pub disk_tiles: usize,
    pub disk_mb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_pixel_center() {
        // Mercator origin sits in the middle of the world pixel plane
        let (px, py) = world_pixel(Point::new(0.0, 0.0), 1);
        assert!((px - 256.0).abs() < 1e-6);
        assert!((py - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_tile_at_known_location() {
        let p = Point::from_lon_lat(-71.119277, 42.438878);
        let (x, y) = tile_at(p, 12);
        assert!(x > 0 && y > 0);
        // Western hemisphere lands left of the meridian column
        assert!(x < 2048);
    }

    #[test]
    fn test_tile_at_clamps_to_grid() {
        let (x, y) = tile_at(Point::from_lon_lat(180.0, -85.05), 3);
        assert!(x <= 7 && y <= 7);
    }

    #[test]
    fn test_meters_per_pixel_halves_per_zoom() {
        let z4 = meters_per_pixel(4);
        let z5 = meters_per_pixel(5);
        assert!((z4 / z5 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tile_path_layout() {
        let cache = TileCache::new(std::env::temp_dir().join("geoflash-test-tiles")).unwrap();
        let path = cache.tile_path(TileId {
            zoom: 12,
            x: 1234,
            y: 5678,
        });
        assert!(path.ends_with("12/1234/5678.png"));
    }
}
