//! Deciding which pins are drawn.
//!
//! Nothing here is cached. Every call looks at the current taxonomy, so the
//! answer can never drift from the flags it is derived from.

use crate::data::{
    database::Database,
    pin::{Pin, PinId},
    taxonomy::Taxonomy,
};

/// Whether a pin should be on the map: its pin type and that type's category
/// must both exist and both be visible.
pub fn effective_visible(taxonomy: &Taxonomy, pin: &Pin) -> bool {
    marker_color(taxonomy, pin).is_some()
}

/// The color to draw a pin with, or `None` if the pin is not drawn.
pub fn marker_color<'t>(taxonomy: &'t Taxonomy, pin: &Pin) -> Option<&'t str> {
    let pin_type = taxonomy.pin_types().get(pin.pin_type())?;
    let category = taxonomy.categories().get(pin_type.category())?;
    (category.visible && pin_type.visible).then_some(pin_type.color.as_str())
}

/// A pin that should currently be drawn.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct VisiblePin<'a> {
    pub id: PinId,
    pub pin: &'a Pin,
    pub color: &'a str,
}

/// Every pin that should be drawn, in store order.
pub fn visible_pins(db: &Database) -> impl Iterator<Item = VisiblePin<'_>> {
    let taxonomy = db.taxonomy();
    db.pins().iter().filter_map(move |(id, pin)| {
        marker_color(taxonomy, pin).map(|color| VisiblePin { id, pin, color })
    })
}
