use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label used for items that carry neither a type nor a format.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// A cataloged media unit (one disc release or digital copy).
///
/// `id` is `None` until the store assigns a key on first insert; after that it
/// never changes. String attributes use `""` for "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: Option<i64>,
    pub title: String,
    pub year: Option<i32>,
    pub genre: String,
    /// Free-text classification, e.g. "Blu-ray", "DVD", "Digital".
    #[serde(rename = "type")]
    pub media_type: String,
    pub format: String,
    pub region: String,
    pub runtime: String,
    pub audio: String,
    pub hdr: String,
    pub languages: String,
    pub subtitles: String,
    pub edition: String,
    pub discs: Option<i32>,
    pub barcode: String,
    pub packaging: String,
    /// Poster image URL, may be empty.
    pub poster: String,
    pub notes: String,
    /// User-defined fields outside the fixed schema.
    pub custom: BTreeMap<String, String>,
}

impl Item {
    /// True when both `type` and `format` are blank or whitespace-only.
    pub fn is_unknown(&self) -> bool {
        self.media_type.trim().is_empty() && self.format.trim().is_empty()
    }

    /// Grouping label for stats: type, else format, else "Unknown".
    pub fn type_label(&self) -> &str {
        let t = self.media_type.trim();
        if !t.is_empty() {
            return t;
        }
        let f = self.format.trim();
        if !f.is_empty() {
            return f;
        }
        UNKNOWN_TYPE
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { "Untitled" } else { &self.title }
    }

    /// The example record written into an empty catalog on first load.
    pub fn seed_example() -> Self {
        Self {
            title: "The Dark Knight".into(),
            year: Some(2008),
            genre: "Action".into(),
            media_type: "Blu-ray".into(),
            format: "Blu-ray".into(),
            region: "A".into(),
            runtime: "152 min".into(),
            audio: "DTS-HD MA".into(),
            hdr: "HDR10, Dolby Vision, HDR10+".into(),
            languages: "English".into(),
            subtitles: "English".into(),
            edition: "Standard".into(),
            discs: Some(1),
            packaging: "Slipcover".into(),
            poster: "https://image.tmdb.org/t/p/w342/1hRoyzDtpgMU7Dz4JF22RANzQO7.jpg".into(),
            ..Self::default()
        }
    }
}

/// A named, insertion-ordered collection of item keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: Option<i64>,
    pub name: String,
    /// Member keys in the order they were added; no duplicates.
    pub item_ids: Vec<i64>,
}

impl List {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            item_ids: Vec::new(),
        }
    }

    pub fn contains(&self, item_id: i64) -> bool {
        self.item_ids.contains(&item_id)
    }
}
