//! The portable document format for a map annotation set, used both for
//! export/import files and for the local cache.
//!
//! ```text
//! { "categories": { "<name>": { "visible": bool, "collapsed": bool } },
//!   "pinTypes":   { "<name>": { "color": "#rrggbb", "visible": bool, "category": "<name>" } },
//!   "pins": [ { "x": number, "y": number, "type": "<name>",
//!               "comment"?: string, "imageUrl"?: string } ] }
//! ```
//!
//! Object keys keep their order, and pins keep theirs, so that a re-import
//! stacks markers the same way.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::data::{
    category::Category,
    database::Database,
    normalize_name,
    pin::{Pin, PinStore},
    pin_type::{PinType, FALLBACK_COLOR},
    taxonomy::Taxonomy,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed map document: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: IndexMap<String, CategoryRecord>,
    #[serde(rename = "pinTypes", default, deserialize_with = "null_as_default")]
    pub pin_types: IndexMap<String, PinTypeRecord>,
    pub pins: Vec<PinRecord>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub collapsed: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PinTypeRecord {
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PinRecord {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub pin_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Image links from older documents. Only read, never written.
    #[serde(default, skip_serializing)]
    pub image: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_color() -> String {
    FALLBACK_COLOR.to_owned()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PinRecord {
    /// Converts the record into a pin of type `pin_type`. A legacy `image`
    /// link is carried over when there is no `imageUrl` and it is an http(s)
    /// URL; anything else is dropped.
    fn to_pin(&self, pin_type: &str) -> Pin {
        let url = self
            .image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or(self.image.as_deref())
            .unwrap_or("");
        Pin::new(self.x, self.y, pin_type)
            .with_comment(self.comment.as_deref().unwrap_or(""))
            .with_image_url(url)
    }
}

impl From<&Pin> for PinRecord {
    fn from(pin: &Pin) -> Self {
        PinRecord {
            x: pin.x,
            y: pin.y,
            pin_type: pin.pin_type().to_owned(),
            comment: Some(pin.comment()).filter(|comment| !comment.is_empty()).map(str::to_owned),
            image_url: pin.image_url().map(str::to_owned),
            image: None,
        }
    }
}

/// How an imported document is combined with the current database.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ImportMode {
    /// Throw away the current database and load the document in its place.
    Replace,
    /// Add the categories, pin types and pins of the document that the
    /// database does not have yet.
    Merge,
}

/// What an import changed.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct ImportSummary {
    pub categories_added: usize,
    pub pin_types_added: usize,
    pub pins_added: usize,
    /// Pins left out because an identical pin already existed.
    pub duplicate_pins: usize,
    /// Pins left out because their pin type does not exist.
    pub orphaned_pins: usize,
}

impl Document {
    pub fn from_database(db: &Database) -> Self {
        let taxonomy = db.taxonomy();
        Document {
            categories: taxonomy
                .categories()
                .iter()
                .map(|category| {
                    let record = CategoryRecord {
                        visible: category.visible,
                        collapsed: category.collapsed,
                    };
                    (category.name().to_owned(), record)
                })
                .collect(),
            pin_types: taxonomy
                .pin_types()
                .iter()
                .map(|pin_type| {
                    let record = PinTypeRecord {
                        color: pin_type.color.clone(),
                        visible: pin_type.visible,
                        category: pin_type.category().to_owned(),
                    };
                    (pin_type.name().to_owned(), record)
                })
                .collect(),
            pins: db.pins().iter().map(|(_, pin)| PinRecord::from(pin)).collect(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Compact form, used for the local cache.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented form, used for exported files.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Combines this document with `db`. Applying a parsed document cannot
    /// fail, so an import either completes or never starts.
    pub fn apply(self, db: &mut Database, mode: ImportMode) -> ImportSummary {
        let summary = match mode {
            ImportMode::Replace => self.replace(db),
            ImportMode::Merge => self.merge(db),
        };
        tracing::info!(?mode, ?summary, "imported map document");
        summary
    }

    fn replace(self, db: &mut Database) -> ImportSummary {
        let mut summary = ImportSummary::default();
        // build on a copy so that pin handles keep counting up
        let mut fresh = db.clone();
        fresh.clear();
        let (taxonomy, pins) = fresh.parts_mut();

        for (name, record) in self.categories {
            if taxonomy.insert_category(Category::with_flags(name, record.visible, record.collapsed)) {
                summary.categories_added += 1;
            }
        }
        for (name, record) in self.pin_types {
            let mut pin_type = PinType::new(name, record.category, record.color);
            pin_type.visible = record.visible;
            if taxonomy.insert_pin_type(pin_type) {
                summary.pin_types_added += 1;
            }
        }
        for record in &self.pins {
            match pins.place(taxonomy, record.to_pin(&record.pin_type)) {
                Some(_) => summary.pins_added += 1,
                None => summary.orphaned_pins += 1,
            }
        }

        *db = fresh;
        summary
    }

    fn merge(self, db: &mut Database) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let (taxonomy, pins) = db.parts_mut();

        for (name, record) in self.categories {
            if taxonomy.categories().find_normalized(&name).is_none()
                && taxonomy.insert_category(Category::with_flags(name, record.visible, record.collapsed))
            {
                summary.categories_added += 1;
            }
        }

        let type_names = merge_pin_types(taxonomy, self.pin_types, &mut summary);

        let mut seen = signatures(pins);
        for record in &self.pins {
            let pin_type = type_names.get(&record.pin_type).unwrap_or(&record.pin_type);
            let pin = record.to_pin(pin_type);
            let signature = pin_signature(&pin);
            if seen.contains(&signature) {
                summary.duplicate_pins += 1;
                continue;
            }
            match pins.place(taxonomy, pin) {
                Some(_) => {
                    seen.insert(signature);
                    summary.pins_added += 1;
                }
                None => summary.orphaned_pins += 1,
            }
        }

        summary
    }
}

/// Adds the incoming pin types that have no match by normalized name and
/// category. Returns, for each incoming pin type name, the name pins of that
/// type should be placed under.
fn merge_pin_types(
    taxonomy: &mut Taxonomy,
    incoming: IndexMap<String, PinTypeRecord>,
    summary: &mut ImportSummary,
) -> HashMap<String, String> {
    let mut type_names = HashMap::new();
    for (name, record) in incoming {
        let wanted_name = normalize_name(&name);
        let wanted_category = normalize_name(&record.category);
        let existing = taxonomy.pin_types().iter().find(|pin_type| {
            normalize_name(pin_type.name()) == wanted_name
                && normalize_name(pin_type.category()) == wanted_category
        });
        if let Some(existing) = existing {
            type_names.insert(name, existing.name().to_owned());
            continue;
        }

        let category = match taxonomy.categories().find_normalized(&record.category) {
            Some(category) => category.name().to_owned(),
            None => record.category,
        };
        let mut pin_type = PinType::new(name.clone(), category, record.color);
        pin_type.visible = record.visible;
        if taxonomy.insert_pin_type(pin_type) {
            summary.pin_types_added += 1;
        } else {
            tracing::warn!(pin_type = %name, "pin type name already used by another category, keeping existing");
        }
    }
    type_names
}

/// The identity used to recognise a pin that is already present when
/// merging: coordinates to two decimals, and the normalized type, comment and
/// image link.
pub fn pin_signature(pin: &Pin) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        round_to_hundredths(pin.x),
        round_to_hundredths(pin.y),
        normalize_name(pin.pin_type()),
        normalize_name(pin.comment()),
        normalize_name(pin.image_url().unwrap_or("")),
    )
}

fn round_to_hundredths(value: f64) -> String {
    // adding zero turns -0.0 into 0.0
    format!("{:.2}", (value * 100.0).round() / 100.0 + 0.0)
}

/// Parses `text` and combines it with `db`. On a format error the database is
/// left exactly as it was.
pub fn import(db: &mut Database, text: &str, mode: ImportMode) -> Result<ImportSummary, DocumentError> {
    let document = Document::from_json(text)?;
    Ok(document.apply(db, mode))
}

/// The indented export file for `db`.
pub fn export(db: &Database) -> Result<String, DocumentError> {
    let document = Document::from_database(db);
    tracing::info!(pins = document.pins.len(), "exported map document");
    document.to_json_pretty()
}

/// Every pin signature in `pins`, for callers that want to check a merge
/// ahead of time.
pub fn signatures(pins: &PinStore) -> HashSet<String> {
    pins.iter().map(|(_, pin)| pin_signature(pin)).collect()
}
