// src/animate/pulse.rs
//! Pulsing marker animation

use super::ease::Easing;
use crate::geom::Point;
use crate::render::{HookHandle, OverlayStroke, RenderHooks};
use serde::{Deserialize, Serialize};

/// Circle radius at the start of a pulse, in pixels.
pub const MIN_RADIUS: f64 = 5.0;

/// Radius gained over a full pulse; the circle ends at 30 pixels.
pub const RADIUS_GROWTH: f64 = 25.0;

/// Pulse appearance and timing, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseStyle {
    pub duration_ms: f64,
    pub easing: Easing,
    pub color: [u8; 3],
}

impl Default for PulseStyle {
    fn default() -> Self {
        Self {
            duration_ms: 3000.0,
            easing: Easing::QuadOut,
            color: [255, 0, 0],
        }
    }
}

/// One growing, fading circle evaluated per frame.
///
/// A draw only happens while `elapsed <= duration`; the first frame past
/// the duration terminates the run without drawing.
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    geometry: Point,
    start_ms: f64,
    style: PulseStyle,
}

/// Derived drawing parameters for one frame of a pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseFrame {
    pub center: Point,
    pub radius: f64,
    pub opacity: f64,
    pub stroke_width: f64,
}

impl Pulse {
    pub fn new(geometry: Point, start_ms: f64, style: PulseStyle) -> Self {
        Self {
            geometry,
            start_ms,
            style,
        }
    }

    /// Evaluate the pulse at a frame timestamp. Returns `None` once the
    /// duration has elapsed, which ends the run.
    pub fn frame(&self, frame_time_ms: f64) -> Option<PulseFrame> {
        let elapsed = frame_time_ms - self.start_ms;
        if elapsed > self.style.duration_ms {
            return None;
        }

        let ratio = (elapsed / self.style.duration_ms).clamp(0.0, 1.0);
        let opacity = self.style.easing.apply(1.0 - ratio);
        Some(PulseFrame {
            center: self.geometry,
            radius: self.style.easing.apply(ratio) * RADIUS_GROWTH + MIN_RADIUS,
            opacity,
            stroke_width: 0.25 + opacity,
        })
    }
}

/// Start a pulse at `geometry` and keep it running on the repaint hooks
/// until its duration elapses.
///
/// Each frame the callback draws the stroked circle and requests a
/// follow-up repaint; on the first frame past the duration it detaches
/// its own registration and never fires again.
pub fn flash(
    hooks: &mut RenderHooks,
    geometry: Point,
    start_ms: f64,
    style: PulseStyle,
) -> HookHandle {
    let pulse = Pulse::new(geometry, start_ms, style);
    hooks.register(move |handle, ctx| match pulse.frame(ctx.time_ms()) {
        Some(frame) => {
            let stroke = OverlayStroke {
                color: style.color,
                opacity: frame.opacity,
                width: frame.stroke_width,
            };
            ctx.surface().stroke_circle(frame.center, frame.radius, stroke);
            ctx.request_redraw();
        }
        None => ctx.detach(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::RecordingSurface;

    fn pulse_at_origin() -> Pulse {
        Pulse::new(Point::new(0.0, 0.0), 0.0, PulseStyle::default())
    }

    #[test]
    fn test_start_frame_values() {
        let frame = pulse_at_origin().frame(0.0).unwrap();
        assert!((frame.radius - 5.0).abs() < 1e-9);
        assert!((frame.opacity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_frame_values() {
        let frame = pulse_at_origin().frame(3000.0).unwrap();
        assert!((frame.radius - 30.0).abs() < 1e-9);
        assert!(frame.opacity.abs() < 1e-9);
    }

    #[test]
    fn test_radius_grows_and_opacity_fades_monotonically() {
        let pulse = pulse_at_origin();
        let mut prev = pulse.frame(0.0).unwrap();
        for t in (30..=3000).step_by(30) {
            let frame = pulse.frame(t as f64).unwrap();
            assert!(frame.radius >= prev.radius);
            assert!(frame.opacity <= prev.opacity);
            assert!((5.0..=30.0).contains(&frame.radius));
            assert!((0.0..=1.0).contains(&frame.opacity));
            prev = frame;
        }
    }

    #[test]
    fn test_terminates_past_duration() {
        assert!(pulse_at_origin().frame(3000.1).is_none());
        assert!(pulse_at_origin().frame(10_000.0).is_none());
    }

    #[test]
    fn test_frame_before_start_is_clamped() {
        let pulse = Pulse::new(Point::new(0.0, 0.0), 1000.0, PulseStyle::default());
        let frame = pulse.frame(500.0).unwrap();
        assert!((frame.radius - 5.0).abs() < 1e-9);
        assert!((frame.opacity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flash_draws_then_detaches() {
        let mut hooks = RenderHooks::new();
        flash(&mut hooks, Point::new(3.0, 4.0), 0.0, PulseStyle::default());

        let mut surface = RecordingSurface::default();
        // Frame schedule from a 3000 ms run
        for (time, expect_draw) in [
            (0.0, true),
            (500.0, true),
            (1500.0, true),
            (3000.0, true),
            (3100.0, false),
        ] {
            let before = surface.circles.len();
            let redraw = hooks.run_frame(&mut surface, time);
            let drew = surface.circles.len() > before;
            assert_eq!(drew, expect_draw, "at t={}", time);
            assert_eq!(redraw, expect_draw, "redraw at t={}", time);
        }
        assert!(hooks.is_empty());

        // A later pass is a no-op
        let before = surface.circles.len();
        hooks.run_frame(&mut surface, 3200.0);
        assert_eq!(surface.circles.len(), before);
    }

    #[test]
    fn test_scenario_ratios() {
        let pulse = pulse_at_origin();
        for (time, ratio) in [(0.0, 0.0), (500.0, 500.0 / 3000.0), (1500.0, 0.5), (3000.0, 1.0)] {
            let frame = pulse.frame(time).unwrap();
            let expected_radius = Easing::QuadOut.apply(ratio) * 25.0 + 5.0;
            assert!((frame.radius - expected_radius).abs() < 1e-9, "at t={}", time);
        }
    }

    #[test]
    fn test_concurrent_pulses_are_independent() {
        let mut hooks = RenderHooks::new();
        let style = PulseStyle::default();
        // Second pulse starts 2 s into the first one's run
        let first = flash(&mut hooks, Point::new(0.0, 0.0), 0.0, style);
        flash(&mut hooks, Point::new(100.0, 0.0), 2000.0, style);

        let mut surface = RecordingSurface::default();
        hooks.run_frame(&mut surface, 2500.0);
        assert_eq!(surface.circles.len(), 2);
        // Each run derives its own radius from its own start time
        let r_first = surface.circles[0].1;
        let r_second = surface.circles[1].1;
        assert!(r_first > r_second);

        // Removing the first leaves the second scheduled
        hooks.unregister(first);
        surface.circles.clear();
        hooks.run_frame(&mut surface, 2600.0);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(surface.circles[0].0, Point::new(100.0, 0.0));

        // First expires at 3000, second at 5000
        surface.circles.clear();
        hooks.run_frame(&mut surface, 4900.0);
        assert_eq!(surface.circles.len(), 1);
        hooks.run_frame(&mut surface, 5100.0);
        assert!(hooks.is_empty());
    }
}
