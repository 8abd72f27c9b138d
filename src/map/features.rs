// src/map/features.rs
//! Marker feature layer with add notifications

use crate::geom::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId(u64);

/// A point marker on the map. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    id: FeatureId,
    geometry: Point,
}

impl Feature {
    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometry(&self) -> Point {
        self.geometry
    }
}

type AddedFn = Box<dyn FnMut(&Feature)>;

/// Owns the plotted markers and notifies listeners when one is added.
///
/// The pulse animation is installed as a listener at startup, so every
/// new marker flashes exactly once.
#[derive(Default)]
pub struct FeatureSource {
    next_id: u64,
    features: Vec<Feature>,
    listeners: Vec<AddedFn>,
}

impl FeatureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to marker additions.
    pub fn on_feature_added<F>(&mut self, listener: F)
    where
        F: FnMut(&Feature) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Add a marker and notify every listener.
    pub fn add_feature(&mut self, geometry: Point) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;
        let feature = Feature { id, geometry };
        self.features.push(feature);
        for listener in self.listeners.iter_mut() {
            listener(&feature);
        }
        id
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Remove all markers. Listeners stay subscribed.
    pub fn clear(&mut self) {
        self.features.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_add_feature_notifies_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut source = FeatureSource::new();
        let seen_clone = Rc::clone(&seen);
        source.on_feature_added(move |f| seen_clone.borrow_mut().push(f.geometry()));

        source.add_feature(Point::new(1.0, 2.0));
        source.add_feature(Point::new(3.0, 4.0));

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1], Point::new(3.0, 4.0));
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_feature_ids_are_distinct() {
        let mut source = FeatureSource::new();
        let a = source.add_feature(Point::new(0.0, 0.0));
        let b = source.add_feature(Point::new(0.0, 0.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_clear_keeps_listeners() {
        let count = Rc::new(RefCell::new(0u32));
        let mut source = FeatureSource::new();
        let count_clone = Rc::clone(&count);
        source.on_feature_added(move |_| *count_clone.borrow_mut() += 1);

        source.add_feature(Point::new(0.0, 0.0));
        source.clear();
        assert!(source.is_empty());

        source.add_feature(Point::new(0.0, 0.0));
        assert_eq!(*count.borrow(), 2);
    }
}
