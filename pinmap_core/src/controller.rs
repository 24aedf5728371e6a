//! Turning pointer and keyboard input on the map into database edits.
//!
//! Every edit made through the [`Controller`] is followed by a marker sync and
//! a save, in that order. Which action a click performs is decided from the
//! modifier flags carried by that click, never from remembered key state, so a
//! key release the page never saw cannot leave a mode stuck on.

use thiserror::Error;

use crate::config::MapConfig;
use crate::data::database::Database;
use crate::data::pin::{Pin, PinEdit, PinEditError, PinId};
use crate::data::taxonomy::TaxonomyError;
use crate::document::{self, DocumentError, ImportMode, ImportSummary};
use crate::persistence::{self, KeyValueStore, PersistenceError};
use crate::surface::{MapPoint, MapSurface, MarkerLayer};

/// Modifier keys held during an input event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false };
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false };
    pub const ALT: Modifiers = Modifiers { shift: false, ctrl: false, alt: true };
}

/// What a click on the map or on a marker does.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Idle,
    /// A map click places a pin of the active pin type.
    Placing,
    /// A click removes the pin under the cursor, after confirmation.
    Deleting,
    /// A marker click opens the pin editor.
    Editing,
}

/// The mode for a set of held modifiers. Ctrl wins over Shift, which wins over
/// Alt.
pub fn resolve_mode(modifiers: Modifiers) -> Mode {
    if modifiers.ctrl {
        Mode::Deleting
    } else if modifiers.shift {
        Mode::Placing
    } else if modifiers.alt {
        Mode::Editing
    } else {
        Mode::Idle
    }
}

/// The modal dialogs the controller needs. Each call blocks until the user
/// answers; dismissing a dialog counts as declining.
pub trait Dialogs {
    fn confirm(&mut self, message: &str) -> bool;

    /// Asks for the comment of a pin about to be placed.
    fn prompt_comment(&mut self) -> Option<String>;

    /// Opens the editor for `pin`, returning what the user saved.
    fn edit_pin(&mut self, pin: &Pin) -> Option<PinEdit>;

    /// Shows a pin's image full-screen.
    fn show_preview(&mut self, url: &str);

    fn alert(&mut self, message: &str);
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Select a pin type first")]
    NoActiveType,
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Edit(#[from] PinEditError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What a click ended up doing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ClickOutcome {
    Ignored,
    Placed(PinId),
    Deleted(PinId),
    DeleteDeclined,
    Edited(PinId),
    EditCancelled,
    Previewed(String),
}

/// The first pin, in store order, whose marker position is less than
/// `radius_px` screen pixels from `point`. This is the first hit, not the
/// closest one, and pins that are currently hidden are hit as well.
pub fn first_hit<S: MapSurface>(
    db: &Database,
    surface: &S,
    point: MapPoint,
    radius_px: f64,
) -> Option<PinId> {
    db.pins()
        .iter()
        .find(|(_, pin)| surface.screen_distance(point, MapPoint::from(*pin)) < radius_px)
        .map(|(id, _)| id)
}

pub struct Controller<S: MapSurface, K: KeyValueStore, D: Dialogs> {
    config: MapConfig,
    db: Database,
    layer: MarkerLayer<S::Marker>,
    surface: S,
    store: K,
    dialogs: D,
    mode: Mode,
    /// Whether markers may be dragged to new positions.
    moving: bool,
}

impl<S, K, D> Controller<S, K, D>
where
    S: MapSurface,
    K: KeyValueStore,
    D: Dialogs,
{
    /// Loads the saved database from `store` and draws it on `surface`.
    pub fn open(config: MapConfig, surface: S, store: K, dialogs: D) -> Result<Self, ControllerError> {
        let db = persistence::load(&store, &config.storage_key, config.palette.clone())?;
        let mut controller = Controller {
            config,
            db,
            layer: MarkerLayer::new(),
            surface,
            store,
            dialogs,
            mode: Mode::Idle,
            moving: false,
        };
        controller.layer.sync(&controller.db, &mut controller.surface);
        Ok(controller)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn dialogs_mut(&mut self) -> &mut D {
        &mut self.dialogs
    }

    pub fn markers(&self) -> &MarkerLayer<S::Marker> {
        &self.layer
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.mode = mode;
            self.surface.set_cursor(mode);
        }
    }

    /// Updates the mode from the modifiers of a key or pointer event.
    pub fn on_modifiers(&mut self, modifiers: Modifiers) {
        self.set_mode(resolve_mode(modifiers));
    }

    /// Drops back to `Idle`, e.g. when the window loses focus or the tab is
    /// hidden and key releases can no longer be seen.
    pub fn reset_mode(&mut self) {
        self.set_mode(Mode::Idle);
    }

    pub fn moving(&self) -> bool {
        self.moving
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    /// Handles a click on the map background.
    pub fn on_map_click(
        &mut self,
        point: MapPoint,
        modifiers: Modifiers,
    ) -> Result<ClickOutcome, ControllerError> {
        self.on_modifiers(modifiers);
        match self.mode {
            Mode::Deleting => {
                match first_hit(&self.db, &self.surface, point, self.config.hit_radius_px) {
                    Some(id) => self.confirm_delete(id),
                    None => Ok(ClickOutcome::Ignored),
                }
            }
            Mode::Placing => self.place_at(point),
            Mode::Editing | Mode::Idle => Ok(ClickOutcome::Ignored),
        }
    }

    /// Handles a click directly on a pin's marker.
    pub fn on_marker_click(
        &mut self,
        id: PinId,
        modifiers: Modifiers,
    ) -> Result<ClickOutcome, ControllerError> {
        self.on_modifiers(modifiers);
        let Some(pin) = self.db.get_pin(id) else {
            return Ok(ClickOutcome::Ignored);
        };
        let image_url = pin.image_url().map(str::to_owned);
        match (self.mode, image_url) {
            (Mode::Deleting, _) => self.confirm_delete(id),
            (Mode::Editing, _) => self.edit(id),
            (_, Some(url)) => {
                self.dialogs.show_preview(&url);
                Ok(ClickOutcome::Previewed(url))
            }
            (_, None) => Ok(ClickOutcome::Ignored),
        }
    }

    /// Commits a marker drag. Returns false, changing nothing, while moving is
    /// switched off.
    pub fn on_marker_drag_end(&mut self, id: PinId, point: MapPoint) -> Result<bool, ControllerError> {
        if !self.moving {
            return Ok(false);
        }
        self.modify(|db| Ok::<_, ControllerError>(db.move_pin(id, point.x, point.y)))
    }

    fn place_at(&mut self, point: MapPoint) -> Result<ClickOutcome, ControllerError> {
        let Some(pin_type) = self.db.taxonomy().active_pin_type().map(str::to_owned) else {
            let err = ControllerError::NoActiveType;
            self.dialogs.alert(&err.to_string());
            return Err(err);
        };
        if self.config.restrict_to_image && !self.config.contains(point) {
            tracing::debug!(x = point.x, y = point.y, "ignoring click outside the map image");
            return Ok(ClickOutcome::Ignored);
        }
        let comment = self.dialogs.prompt_comment().unwrap_or_default();
        let pin = Pin::new(point.x, point.y, pin_type).with_comment(&comment);
        match self.modify(|db| Ok::<_, ControllerError>(db.place_pin(pin)))? {
            Some(id) => Ok(ClickOutcome::Placed(id)),
            None => Ok(ClickOutcome::Ignored),
        }
    }

    fn confirm_delete(&mut self, id: PinId) -> Result<ClickOutcome, ControllerError> {
        if !self.dialogs.confirm("Delete this pin?") {
            return Ok(ClickOutcome::DeleteDeclined);
        }
        self.modify(|db| Ok::<_, ControllerError>(db.remove_pin(id)))?;
        Ok(ClickOutcome::Deleted(id))
    }

    fn edit(&mut self, id: PinId) -> Result<ClickOutcome, ControllerError> {
        let Some(pin) = self.db.get_pin(id) else {
            return Ok(ClickOutcome::Ignored);
        };
        let Some(edit) = self.dialogs.edit_pin(pin) else {
            return Ok(ClickOutcome::EditCancelled);
        };
        if let Err(err) = self.modify(|db| db.edit_pin(id, &edit)) {
            self.dialogs.alert(&err.to_string());
            return Err(err);
        }
        Ok(ClickOutcome::Edited(id))
    }

    pub fn create_category(&mut self, name: &str) -> Result<(), ControllerError> {
        self.modify(|db| db.create_category(name))
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<(), ControllerError> {
        self.modify(|db| db.rename_category(old, new))
    }

    /// Deletes a category with its pin types and pins once the user confirms.
    /// Returns whether it was deleted.
    pub fn delete_category(&mut self, name: &str) -> Result<bool, ControllerError> {
        if !self.dialogs.confirm(&format!("Delete category \"{name}\" and all its pin types?")) {
            return Ok(false);
        }
        self.modify(|db| db.delete_category(name))?;
        Ok(true)
    }

    pub fn set_category_visible(&mut self, name: &str, visible: bool) -> Result<(), ControllerError> {
        self.modify(|db| db.set_category_visible(name, visible))
    }

    pub fn toggle_category_collapsed(&mut self, name: &str) -> Result<bool, ControllerError> {
        self.modify(|db| db.toggle_category_collapsed(name))
    }

    pub fn create_pin_type(
        &mut self,
        name: &str,
        category: &str,
        color: Option<&str>,
    ) -> Result<(), ControllerError> {
        self.modify(|db| db.create_pin_type(name, category, color))
    }

    pub fn rename_pin_type(&mut self, old: &str, new: &str) -> Result<(), ControllerError> {
        self.modify(|db| db.rename_pin_type(old, new))
    }

    /// Deletes a pin type and its pins once the user confirms. Returns whether
    /// it was deleted.
    pub fn delete_pin_type(&mut self, name: &str) -> Result<bool, ControllerError> {
        if !self.dialogs.confirm(&format!("Delete \"{name}\" and all its pins?")) {
            return Ok(false);
        }
        self.modify(|db| db.delete_pin_type(name))?;
        Ok(true)
    }

    pub fn set_pin_type_visible(&mut self, name: &str, visible: bool) -> Result<(), ControllerError> {
        self.modify(|db| db.set_pin_type_visible(name, visible))
    }

    pub fn set_pin_type_color(&mut self, name: &str, color: &str) -> Result<(), ControllerError> {
        self.modify(|db| db.set_pin_type_color(name, color))
    }

    /// Selects the pin type new pins get. The selection is not saved.
    pub fn set_active_pin_type(&mut self, name: &str) -> Result<(), ControllerError> {
        Ok(self.db.set_active_pin_type(name)?)
    }

    /// Removes every pin once the user confirms. Returns whether they were
    /// removed.
    pub fn clear_pins(&mut self) -> Result<bool, ControllerError> {
        if !self.dialogs.confirm("Delete ALL pins?") {
            return Ok(false);
        }
        self.modify(|db| {
            db.clear_pins();
            Ok::<_, ControllerError>(())
        })?;
        Ok(true)
    }

    /// Imports a document. A malformed document changes nothing.
    pub fn import(&mut self, text: &str, mode: ImportMode) -> Result<ImportSummary, ControllerError> {
        self.modify(|db| document::import(db, text, mode))
    }

    /// The export file for the current database.
    pub fn export(&self) -> Result<String, ControllerError> {
        Ok(document::export(&self.db)?)
    }

    /// Runs an edit, then redraws and saves if it succeeded. A
    /// `ControllerError::Persistence` means the edit was applied and drawn
    /// but not saved.
    fn modify<R, E>(&mut self, edit: impl FnOnce(&mut Database) -> Result<R, E>) -> Result<R, ControllerError>
    where
        ControllerError: From<E>,
    {
        let result = edit(&mut self.db)?;
        self.layer.sync(&self.db, &mut self.surface);
        if let Err(err) = persistence::save(&self.db, &mut self.store, &self.config.storage_key) {
            tracing::error!(error = %err, "failed to save map cache");
            return Err(err.into());
        }
        Ok(result)
    }
}
