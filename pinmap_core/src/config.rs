//! # Configuration
//!
//! Settings for one annotated map. The defaults describe the 8192×8192 game
//! map the tool was built for.

use crate::data::pin_type::Palette;
use crate::surface::MapPoint;

/// Settings for one annotated map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Width of the map image in image pixels.
    pub image_width: f64,

    /// Height of the map image in image pixels.
    pub image_height: f64,

    /// Key the database is saved under in the key-value store.
    pub storage_key: String,

    /// How close, in screen pixels, a delete click must be to a marker.
    pub hit_radius_px: f64,

    /// Colors handed out to new pin types.
    pub palette: Palette,

    /// Whether placing clicks outside the image are ignored.
    pub restrict_to_image: bool,
}

impl MapConfig {
    /// Default settings for an image of the given size.
    pub fn new(image_width: f64, image_height: f64) -> Self {
        Self {
            image_width,
            image_height,
            storage_key: "gta_map_cache_v2".to_owned(),
            hit_radius_px: 12.0,
            palette: Palette::default(),
            restrict_to_image: false,
        }
    }

    /// Set the storage key
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the delete hit radius
    pub fn with_hit_radius(mut self, radius_px: f64) -> Self {
        self.hit_radius_px = radius_px;
        self
    }

    /// Set the pin type palette
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set whether placement is limited to the image
    pub fn with_restrict_to_image(mut self, restrict: bool) -> Self {
        self.restrict_to_image = restrict;
        self
    }

    /// Whether `point` lies on the map image.
    pub fn contains(&self, point: MapPoint) -> bool {
        (0.0..=self.image_width).contains(&point.x) && (0.0..=self.image_height).contains(&point.y)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new(8192.0, 8192.0)
    }
}
