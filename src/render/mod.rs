// src/render/mod.rs
//! Per-frame callback registry for transient map overlays
//!
//! The map view runs one render pass per repaint. Overlay animations
//! register callbacks here and draw through the [`DrawSurface`] handed
//! to them each frame; a callback detaches itself when it is done.
//! Removal is deferred until the pass completes, so a callback
//! unregistering itself never disturbs the iteration over the others.

use crate::geom::Point;

/// Opaque registration handle returned by [`RenderHooks::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

/// Stroke parameters for a transient overlay circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStroke {
    pub color: [u8; 3],
    pub opacity: f64,
    pub width: f64,
}

/// The one drawing capability exposed to overlay callbacks.
///
/// Coordinates are projected web-mercator meters; the implementor owns
/// the transform to screen space. The GUI backs this with an egui
/// painter, tests with a recording stub.
pub trait DrawSurface {
    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: OverlayStroke);
}

/// State passed to every overlay callback during a render pass.
pub struct FrameContext<'a> {
    time_ms: f64,
    surface: &'a mut dyn DrawSurface,
    detached: Vec<HookHandle>,
    redraw_requested: bool,
}

impl<'a> FrameContext<'a> {
    /// Timestamp of the frame being rendered, in milliseconds.
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn surface(&mut self) -> &mut dyn DrawSurface {
        &mut *self.surface
    }

    /// Remove a registration once the pass completes. Safe to call for
    /// the running callback's own handle, and safe to call repeatedly.
    pub fn detach(&mut self, handle: HookHandle) {
        self.detached.push(handle);
    }

    /// Ask the host to schedule another repaint after this one.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }
}

type HookFn = Box<dyn FnMut(HookHandle, &mut FrameContext<'_>)>;

/// Observer list driving the per-frame overlay callbacks.
#[derive(Default)]
pub struct RenderHooks {
    next_id: u64,
    hooks: Vec<(HookHandle, HookFn)>,
}

impl RenderHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a per-frame callback. The callback receives its own
    /// handle so it can detach itself.
    pub fn register<F>(&mut self, callback: F) -> HookHandle
    where
        F: FnMut(HookHandle, &mut FrameContext<'_>) + 'static,
    {
        let handle = HookHandle(self.next_id);
        self.next_id += 1;
        self.hooks.push((handle, Box::new(callback)));
        handle
    }

    /// Remove a registration. Unknown or already-removed handles are
    /// ignored.
    pub fn unregister(&mut self, handle: HookHandle) {
        self.hooks.retain(|(h, _)| *h != handle);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every registered callback for one frame. Returns whether any
    /// callback requested a follow-up repaint.
    pub fn run_frame(&mut self, surface: &mut dyn DrawSurface, time_ms: f64) -> bool {
        let mut ctx = FrameContext {
            time_ms,
            surface,
            detached: Vec::new(),
            redraw_requested: false,
        };

        for (handle, hook) in self.hooks.iter_mut() {
            hook(*handle, &mut ctx);
        }

        let FrameContext {
            detached,
            redraw_requested,
            ..
        } = ctx;
        for handle in detached {
            self.unregister(handle);
        }
        redraw_requested
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Records every stroke call for assertions.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub circles: Vec<(Point, f64, OverlayStroke)>,
    }

    impl DrawSurface for RecordingSurface {
        fn stroke_circle(&mut self, center: Point, radius: f64, stroke: OverlayStroke) {
            self.circles.push((center, radius, stroke));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingSurface;
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_callback_receives_frame_time() {
        let mut hooks = RenderHooks::new();
        let seen = Rc::new(Cell::new(0.0));
        let seen_clone = Rc::clone(&seen);
        hooks.register(move |_, ctx| seen_clone.set(ctx.time_ms()));

        let mut surface = RecordingSurface::default();
        hooks.run_frame(&mut surface, 1234.5);
        assert_eq!(seen.get(), 1234.5);
    }

    #[test]
    fn test_self_detach_removes_only_own_entry() {
        let mut hooks = RenderHooks::new();
        let a_runs = Rc::new(Cell::new(0u32));
        let b_runs = Rc::new(Cell::new(0u32));

        let a = Rc::clone(&a_runs);
        hooks.register(move |handle, ctx| {
            a.set(a.get() + 1);
            ctx.detach(handle);
        });
        let b = Rc::clone(&b_runs);
        hooks.register(move |_, _| b.set(b.get() + 1));

        let mut surface = RecordingSurface::default();
        hooks.run_frame(&mut surface, 0.0);
        // The self-detaching callback still let the other one run
        assert_eq!(a_runs.get(), 1);
        assert_eq!(b_runs.get(), 1);
        assert_eq!(hooks.len(), 1);

        hooks.run_frame(&mut surface, 16.0);
        // Detached callback never fires again
        assert_eq!(a_runs.get(), 1);
        assert_eq!(b_runs.get(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut hooks = RenderHooks::new();
        let handle = hooks.register(|_, _| {});
        hooks.unregister(handle);
        hooks.unregister(handle);
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_redraw_request_propagates() {
        let mut hooks = RenderHooks::new();
        let mut surface = RecordingSurface::default();
        assert!(!hooks.run_frame(&mut surface, 0.0));

        hooks.register(|_, ctx| ctx.request_redraw());
        assert!(hooks.run_frame(&mut surface, 0.0));
    }

    #[test]
    fn test_callbacks_draw_through_surface() {
        let mut hooks = RenderHooks::new();
        hooks.register(|_, ctx| {
            let stroke = OverlayStroke {
                color: [255, 0, 0],
                opacity: 0.5,
                width: 1.0,
            };
            ctx.surface().stroke_circle(Point::new(1.0, 2.0), 10.0, stroke);
        });

        let mut surface = RecordingSurface::default();
        hooks.run_frame(&mut surface, 0.0);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(surface.circles[0].0, Point::new(1.0, 2.0));
    }
}
