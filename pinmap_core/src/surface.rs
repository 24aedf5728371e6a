//! The map view the pins are drawn on, and keeping its markers in step with
//! the database.
//!
//! The view itself (panning, zooming, drawing the image) lives outside this
//! crate. It draws and removes markers when asked and projects image
//! coordinates to the screen; its pointer events are fed to the
//! [`Controller`](crate::controller::Controller).

use std::collections::{HashMap, HashSet};

use crate::controller::Mode;
use crate::data::database::Database;
use crate::data::pin::{Pin, PinId};
use crate::visibility::{self, VisiblePin};

/// A point in image coordinates, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&Pin> for MapPoint {
    fn from(pin: &Pin) -> Self {
        MapPoint::new(pin.x, pin.y)
    }
}

/// A point on the screen, in CSS pixels relative to the map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub trait MapSurface {
    /// Whatever the view uses to refer to a drawn marker.
    type Marker;

    /// Draws a marker for `pin` in `color`. The pin's comment, if any, is the
    /// marker's hover text.
    fn place_marker(&mut self, pin: &Pin, color: &str) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);

    /// Where `point` currently appears on screen.
    fn project(&self, point: MapPoint) -> ScreenPoint;

    /// On-screen distance between two image points at the current zoom.
    fn screen_distance(&self, a: MapPoint, b: MapPoint) -> f64 {
        self.project(a).distance_to(&self.project(b))
    }

    /// Shows the cursor for the current interaction mode.
    fn set_cursor(&mut self, _mode: Mode) {}
}

struct DrawnMarker<M> {
    marker: M,
    /// The pin as it was when the marker was drawn.
    pin: Pin,
    color: String,
}

/// The markers currently drawn on a surface, one per visible pin.
pub struct MarkerLayer<M> {
    drawn: HashMap<PinId, DrawnMarker<M>>,
}

impl<M> Default for MarkerLayer<M> {
    fn default() -> Self {
        MarkerLayer { drawn: HashMap::new() }
    }
}

/// How many markers a sync drew and removed.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct SyncStats {
    pub placed: usize,
    pub removed: usize,
}

impl<M> MarkerLayer<M> {
    pub fn new() -> Self {
        MarkerLayer::default()
    }

    /// Brings the surface in line with `db`: removes markers of pins that are
    /// gone, hidden, or changed since they were drawn, then draws every
    /// visible pin that has no marker, in store order.
    pub fn sync<S>(&mut self, db: &Database, surface: &mut S) -> SyncStats
    where
        S: MapSurface<Marker = M>,
    {
        let wanted: Vec<VisiblePin> = visibility::visible_pins(db).collect();
        let by_id: HashMap<PinId, &VisiblePin> = wanted.iter().map(|v| (v.id, v)).collect();
        let mut stats = SyncStats::default();

        let stale: Vec<PinId> = self
            .drawn
            .iter()
            .filter(|(id, drawn)| match by_id.get(*id) {
                Some(visible) => drawn.pin != *visible.pin || drawn.color != visible.color,
                None => true,
            })
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(drawn) = self.drawn.remove(&id) {
                surface.remove_marker(drawn.marker);
                stats.removed += 1;
            }
        }

        for visible in &wanted {
            if self.drawn.contains_key(&visible.id) {
                continue;
            }
            let marker = surface.place_marker(visible.pin, visible.color);
            self.drawn.insert(
                visible.id,
                DrawnMarker { marker, pin: visible.pin.clone(), color: visible.color.to_owned() },
            );
            stats.placed += 1;
        }

        if stats != SyncStats::default() {
            tracing::debug!(placed = stats.placed, removed = stats.removed, "synced markers");
        }
        stats
    }

    pub fn is_drawn(&self, id: PinId) -> bool {
        self.drawn.contains_key(&id)
    }

    /// The ids of all pins that currently have a marker.
    pub fn drawn_ids(&self) -> HashSet<PinId> {
        self.drawn.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// A surface that records what is drawn and projects at a fixed scale.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSurface {
        pub next_marker: u32,
        /// Live markers: handle, pin, color.
        pub markers: Vec<(u32, Pin, String)>,
        pub scale: f64,
        pub cursor: Option<Mode>,
    }

    impl FakeSurface {
        pub fn new(scale: f64) -> Self {
            FakeSurface { scale, ..Default::default() }
        }

        pub fn colors(&self) -> Vec<&str> {
            self.markers.iter().map(|(_, _, color)| color.as_str()).collect()
        }
    }

    impl MapSurface for FakeSurface {
        type Marker = u32;

        fn place_marker(&mut self, pin: &Pin, color: &str) -> u32 {
            self.next_marker += 1;
            self.markers.push((self.next_marker, pin.clone(), color.to_owned()));
            self.next_marker
        }

        fn remove_marker(&mut self, marker: u32) {
            self.markers.retain(|(handle, _, _)| *handle != marker);
        }

        fn project(&self, point: MapPoint) -> ScreenPoint {
            ScreenPoint::new(point.x * self.scale, point.y * self.scale)
        }

        fn set_cursor(&mut self, mode: Mode) {
            self.cursor = Some(mode);
        }
    }

    fn weapons() -> Database {
        let mut db = Database::new();
        db.create_category("Weapons").unwrap();
        db.create_pin_type("AK47", "Weapons", Some("#e74c3c")).unwrap();
        db.create_pin_type("Pistol", "Weapons", Some("#2ecc71")).unwrap();
        db.place_pin(Pin::new(1.0, 1.0, "AK47")).unwrap();
        db.place_pin(Pin::new(2.0, 2.0, "Pistol")).unwrap();
        db
    }

    #[test]
    fn sync_draws_visible_pins_once() {
        let db = weapons();
        let mut surface = FakeSurface::new(1.0);
        let mut layer = MarkerLayer::new();

        assert_eq!(layer.sync(&db, &mut surface), SyncStats { placed: 2, removed: 0 });
        assert_eq!(layer.sync(&db, &mut surface), SyncStats::default());
        assert_eq!(surface.colors(), vec!["#e74c3c", "#2ecc71"]);
    }

    #[test]
    fn sync_follows_visibility_changes() {
        let mut db = weapons();
        let mut surface = FakeSurface::new(1.0);
        let mut layer = MarkerLayer::new();
        layer.sync(&db, &mut surface);

        db.set_pin_type_visible("AK47", false).unwrap();
        assert_eq!(layer.sync(&db, &mut surface), SyncStats { placed: 0, removed: 1 });
        assert_eq!(surface.colors(), vec!["#2ecc71"]);

        db.set_category_visible("Weapons", false).unwrap();
        layer.sync(&db, &mut surface);
        assert!(surface.markers.is_empty());
        assert!(layer.is_empty());

        db.set_category_visible("Weapons", true).unwrap();
        layer.sync(&db, &mut surface);
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn sync_redraws_changed_pins() {
        let mut db = weapons();
        let mut surface = FakeSurface::new(1.0);
        let mut layer = MarkerLayer::new();
        layer.sync(&db, &mut surface);

        db.set_pin_type_color("AK47", "#000000").unwrap();
        assert_eq!(layer.sync(&db, &mut surface), SyncStats { placed: 1, removed: 1 });
        assert!(surface.colors().contains(&"#000000"));

        let (id, _) = db.pins().iter().next().unwrap();
        db.move_pin(id, 5.0, 5.0);
        assert_eq!(layer.sync(&db, &mut surface), SyncStats { placed: 1, removed: 1 });
        assert!(surface.markers.iter().any(|(_, pin, _)| pin.x == 5.0));
    }

    #[test]
    fn screen_distance_uses_projection() {
        let surface = FakeSurface::new(2.0);
        let distance = surface.screen_distance(MapPoint::new(0.0, 0.0), MapPoint::new(3.0, 4.0));
        assert_eq!(distance, 10.0);
    }
}
