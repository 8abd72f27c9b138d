// src/context.rs
//! Application context shared by the display layer

use crate::animate::{flash, PulseStyle};
use crate::geom::Point;
use crate::map::{Feature, FeatureId, FeatureSource};
use crate::render::{DrawSurface, RenderHooks};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Single-threaded hub wiring markers to their pulse animations.
///
/// Built once at startup and handed to the map view. Adding a marker
/// notifies the feature source's listeners; the pulse listener installed
/// here starts an animation at the current frame time. One render pass
/// per repaint drives every live animation.
pub struct AppContext {
    hooks: Rc<RefCell<RenderHooks>>,
    features: Rc<RefCell<FeatureSource>>,
    frame_time_ms: Rc<Cell<f64>>,
    pulse: PulseStyle,
}

impl AppContext {
    pub fn new(pulse: PulseStyle) -> Self {
        let hooks = Rc::new(RefCell::new(RenderHooks::new()));
        let features = Rc::new(RefCell::new(FeatureSource::new()));
        let frame_time_ms = Rc::new(Cell::new(0.0));

        {
            let hooks = Rc::clone(&hooks);
            let clock = Rc::clone(&frame_time_ms);
            features.borrow_mut().on_feature_added(move |feature| {
                flash(&mut hooks.borrow_mut(), feature.geometry(), clock.get(), pulse);
            });
        }

        Self {
            hooks,
            features,
            frame_time_ms,
            pulse,
        }
    }

    /// Publish the repaint timestamp. Animations started during this
    /// frame use it as their start time.
    pub fn begin_frame(&self, time_ms: f64) {
        self.frame_time_ms.set(time_ms);
    }

    /// Plot a marker; its pulse starts immediately.
    pub fn add_marker(&self, geometry: Point) -> FeatureId {
        self.features.borrow_mut().add_feature(geometry)
    }

    pub fn clear_markers(&self) {
        self.features.borrow_mut().clear();
    }

    pub fn markers(&self) -> Vec<Feature> {
        self.features.borrow().features().to_vec()
    }

    pub fn marker_count(&self) -> usize {
        self.features.borrow().len()
    }

    /// Number of animations still registered on the repaint hooks.
    pub fn active_animations(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub fn pulse_style(&self) -> PulseStyle {
        self.pulse
    }

    /// Run all live overlay animations for the current frame. Returns
    /// whether another repaint should be scheduled.
    pub fn run_overlay_pass(&self, surface: &mut dyn DrawSurface) -> bool {
        self.hooks
            .borrow_mut()
            .run_frame(surface, self.frame_time_ms.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::RecordingSurface;

    #[test]
    fn test_marker_add_starts_a_pulse() {
        let ctx = AppContext::new(PulseStyle::default());
        ctx.begin_frame(100.0);
        ctx.add_marker(Point::new(10.0, 20.0));
        assert_eq!(ctx.active_animations(), 1);

        let mut surface = RecordingSurface::default();
        assert!(ctx.run_overlay_pass(&mut surface));
        assert_eq!(surface.circles.len(), 1);
        // Start radius at the frame the marker appeared
        assert!((surface.circles[0].1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pulse_ends_after_duration() {
        let ctx = AppContext::new(PulseStyle::default());
        ctx.begin_frame(0.0);
        ctx.add_marker(Point::new(0.0, 0.0));

        let mut surface = RecordingSurface::default();
        for time in [0.0, 500.0, 1500.0, 3000.0] {
            ctx.begin_frame(time);
            assert!(ctx.run_overlay_pass(&mut surface));
        }
        assert_eq!(surface.circles.len(), 4);

        ctx.begin_frame(3100.0);
        assert!(!ctx.run_overlay_pass(&mut surface));
        assert_eq!(surface.circles.len(), 4, "no draw past the duration");
        assert_eq!(ctx.active_animations(), 0);
        // The marker itself stays on the map
        assert_eq!(ctx.marker_count(), 1);
    }

    #[test]
    fn test_two_markers_animate_independently() {
        let ctx = AppContext::new(PulseStyle::default());
        ctx.begin_frame(0.0);
        ctx.add_marker(Point::new(0.0, 0.0));
        ctx.begin_frame(2000.0);
        ctx.add_marker(Point::new(50.0, 50.0));
        assert_eq!(ctx.active_animations(), 2);

        let mut surface = RecordingSurface::default();
        // First pulse expires between these passes, second keeps going
        ctx.begin_frame(3500.0);
        ctx.run_overlay_pass(&mut surface);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(surface.circles[0].0, Point::new(50.0, 50.0));
        assert_eq!(ctx.active_animations(), 1);
    }

    #[test]
    fn test_clearing_markers_leaves_animations_running() {
        let ctx = AppContext::new(PulseStyle::default());
        ctx.begin_frame(0.0);
        ctx.add_marker(Point::new(0.0, 0.0));
        ctx.clear_markers();
        assert_eq!(ctx.marker_count(), 0);

        // The pulse holds its own geometry snapshot
        let mut surface = RecordingSurface::default();
        ctx.begin_frame(100.0);
        ctx.run_overlay_pass(&mut surface);
        assert_eq!(surface.circles.len(), 1);
    }
}
