use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::db::models::Item;

/// Headers that map onto fixed item fields.
const TITLE: &str = "Title";
const RELEASE_DATE: &str = "Release date";
const FORMAT: &str = "Format";
const TYPE: &str = "Type";
const COUNTRY: &str = "Country code";
const UPC: &str = "UPC";
const EAN: &str = "EAN";
const COMMENT: &str = "Comment";
const BLURAY_DISCS: &str = "Blu-ray discs";
const DVD_DISCS: &str = "DVD discs";

/// Headers kept in `custom`, with the key they are stored under.
const CUSTOM_KEYS: &[(&str, &str)] = &[
    ("Studio", "Studio"),
    ("ASIN", "ASIN"),
    (RELEASE_DATE, "ReleaseDate"),
    ("Slipcover", "Slipcover"),
    ("Casing", "Casing"),
    ("Memorabilia", "Memorabilia"),
    (BLURAY_DISCS, "BluRayDiscs"),
    (DVD_DISCS, "DvdDiscs"),
    ("Digital copy", "DigitalCopy"),
    ("Date added", "DateAdded"),
    ("Watched", "Watched"),
    ("Retailer", "Retailer"),
    ("Price", "Price"),
    ("Price comment", "PriceComment"),
];

/// Headers consumed by fixed fields and never copied into `custom`.
const FIXED_HEADERS: &[&str] = &[TITLE, FORMAT, TYPE, COUNTRY, UPC, EAN, COMMENT];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("line {0}: every field is blank")]
    Empty(usize),
}

/// One data line, positionally matched against the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the source text.
    pub line: usize,
    /// `(header, value)` in header order. Missing trailing values are "".
    pub fields: Vec<(String, String)>,
    /// Values past the last header, which have nowhere to go.
    pub overflow: usize,
}

impl Row {
    /// Value under `header`, "" if absent. A repeated header yields its last column.
    pub fn get(&self, header: &str) -> &str {
        self.fields
            .iter()
            .rev()
            .find(|(h, _)| h == header)
            .map_or("", |(_, v)| v.as_str())
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

/// Split text into rows. The first non-blank line is the header; blank lines are skipped.
///
/// No quoting or escaping: a comma inside a value shifts every later column.
pub fn parse_table(text: &str) -> Vec<Row> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line.split(',').map(|h| h.trim().to_string()).collect();
    log::debug!("Table headers: {headers:?}");

    lines
        .map(|(idx, line)| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), values.get(i).copied().unwrap_or("").to_string()))
                .collect();
            Row {
                line: idx + 1,
                fields,
                overflow: values.len().saturating_sub(headers.len()),
            }
        })
        .collect()
}

/// Canonical spelling for a type or format value.
///
/// Known spellings map to "DVD", "Blu-ray", "UHD" or "Digital"; anything else
/// is lowercased with only its first letter capitalised.
pub fn normalize_type(raw: &str) -> String {
    let t = raw.trim().to_lowercase();
    match t.as_str() {
        "" => String::new(),
        "dvd" => "DVD".into(),
        "blu-ray" | "bluray" | "blu ray" => "Blu-ray".into(),
        "uhd" | "4k" => "UHD".into(),
        "digital" => "Digital".into(),
        _ => {
            let mut chars = t.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Year of a release date, or `None` when the value isn't a recognisable date.
pub fn parse_release_year(raw: &str) -> Option<i32> {
    use chrono::Datelike;

    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.year());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| d.year())
}

fn disc_count(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|&n| n >= 0)
}

/// Map one row onto an item draft (no key, no poster).
pub fn map_row(row: &Row) -> Result<Item, RowError> {
    if row.is_blank() {
        return Err(RowError::Empty(row.line));
    }
    if row.overflow > 0 {
        log::warn!(
            "Line {}: {} value(s) past the last column ignored",
            row.line,
            row.overflow
        );
    }

    let barcode = match row.get(UPC) {
        "" => row.get(EAN),
        upc => upc,
    };
    let discs = match (disc_count(row.get(BLURAY_DISCS)), disc_count(row.get(DVD_DISCS))) {
        (None, None) => None,
        (a, b) => {
            let sum = a.unwrap_or(0).checked_add(b.unwrap_or(0));
            if sum.is_none() {
                log::warn!("Line {}: disc counts out of range, leaving discs blank", row.line);
            }
            sum
        }
    };

    let mut custom = BTreeMap::new();
    for &(header, key) in CUSTOM_KEYS {
        let value = row.get(header);
        if !value.is_empty() {
            custom.insert(key.to_string(), value.to_string());
        }
    }
    // Columns we have no mapping for are kept under their own header
    for (header, value) in &row.fields {
        let known = FIXED_HEADERS.contains(&header.as_str())
            || CUSTOM_KEYS.iter().any(|(h, _)| h == header);
        if !known && !header.is_empty() && !value.is_empty() {
            custom.insert(header.clone(), value.clone());
        }
    }

    Ok(Item {
        title: row.get(TITLE).to_string(),
        year: parse_release_year(row.get(RELEASE_DATE)),
        format: normalize_type(row.get(FORMAT)),
        media_type: normalize_type(row.get(TYPE)),
        region: row.get(COUNTRY).to_string(),
        barcode: barcode.to_string(),
        notes: row.get(COMMENT).to_string(),
        discs,
        custom,
        ..Item::default()
    })
}
