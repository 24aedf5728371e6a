//! Annotating a large map image with categorized, colored pins.
//!
//! [`data`] holds the taxonomy and the pins, [`document`] reads and writes
//! the JSON exchange format, and [`controller::Controller`] ties a database to
//! a map view, a key-value store and the user's dialogs.

pub mod config;
pub mod controller;
pub mod data;
pub mod document;
pub mod persistence;
pub mod surface;
pub mod visibility;

pub use config::MapConfig;
pub use controller::{Controller, ControllerError, Dialogs, Mode, Modifiers};
pub use data::database::Database;
pub use data::pin::{Pin, PinEdit, PinId};
pub use document::{ImportMode, ImportSummary};
