use std::fmt;

use crate::catalog::Catalog;
use crate::filter::{Filter, FilterContext};

/// A hierarchical location token, e.g. `item/4` or `stats/Blu-ray`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Home,
    /// Editor with an empty draft.
    New,
    Item(i64),
    Edit(i64),
    Lists,
    List(i64),
    Stats,
    /// Catalog drilled down to one stats group.
    StatsType(String),
}

impl Location {
    /// Parse a token. Leading `#` and `/` are ignored; anything unrecognised,
    /// including a malformed key, is `Home`.
    pub fn parse(token: &str) -> Self {
        let token = token.trim().trim_start_matches('#').trim_start_matches('/');
        let (head, rest) = match token.split_once('/') {
            Some((h, r)) => (h, Some(r)),
            None => (token, None),
        };
        let key = |r: Option<&str>| r.and_then(|r| r.trim_end_matches('/').parse::<i64>().ok());

        match (head, rest) {
            ("new" | "add", _) => Self::New,
            ("item", r) => key(r).map_or(Self::Home, Self::Item),
            ("edit", r) => key(r).map_or(Self::Home, Self::Edit),
            ("lists", None) | ("lists", Some("")) => Self::Lists,
            ("lists", r) => key(r).map_or(Self::Lists, Self::List),
            ("stats", None) | ("stats", Some("")) => Self::Stats,
            ("stats", Some(t)) => Self::StatsType(percent_decode(t)),
            _ => Self::Home,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::New => f.write_str("new"),
            Self::Item(id) => write!(f, "item/{id}"),
            Self::Edit(id) => write!(f, "edit/{id}"),
            Self::Lists => f.write_str("lists"),
            Self::List(id) => write!(f, "lists/{id}"),
            Self::Stats => f.write_str("stats"),
            Self::StatsType(t) => write!(f, "stats/{}", percent_encode(t)),
        }
    }
}

/// Percent-encode everything outside the URI unreserved set.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Decode `%XX` escapes; malformed escapes are kept literally.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(v) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Filter slots, provenance flags and the current location.
#[derive(Debug, Default)]
pub struct Navigator {
    location: Location,
    catalog: Filter,
    stats: Filter,
    picker: Filter,
    /// The catalog view was reached from a stats group.
    pub from_stats: bool,
    /// The item view was reached from a list's detail view.
    pub from_list: bool,
    pub current_item: Option<i64>,
    pub current_list: Option<i64>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn filter(&self, context: FilterContext) -> &Filter {
        match context {
            FilterContext::Catalog => &self.catalog,
            FilterContext::StatsDrill => &self.stats,
            FilterContext::ListPicker => &self.picker,
        }
    }

    pub fn filter_mut(&mut self, context: FilterContext) -> &mut Filter {
        match context {
            FilterContext::Catalog => &mut self.catalog,
            FilterContext::StatsDrill => &mut self.stats,
            FilterContext::ListPicker => &mut self.picker,
        }
    }

    /// The slot driving the catalog grid right now.
    pub fn browse_context(&self) -> FilterContext {
        if self.from_stats {
            FilterContext::StatsDrill
        } else {
            FilterContext::Catalog
        }
    }

    /// Redirect locations whose record no longer exists to a safe default.
    pub fn resolve(location: Location, catalog: &Catalog) -> Location {
        match location {
            Location::Item(id) | Location::Edit(id) if catalog.item(id).is_none() => {
                log::debug!("Item {id} not found, redirecting home");
                Location::Home
            }
            Location::List(id) if catalog.list(id).is_none() => {
                log::debug!("List {id} not found, redirecting to lists");
                Location::Lists
            }
            other => other,
        }
    }

    /// Make `location` current and apply its effect on flags and filters.
    pub fn enter(&mut self, location: Location) {
        match &location {
            Location::Home | Location::Lists => {
                self.from_stats = false;
                self.from_list = false;
            }
            Location::New => {
                self.from_stats = false;
                self.from_list = false;
                self.current_item = None;
            }
            Location::Item(id) => self.current_item = Some(*id),
            Location::Edit(id) => {
                self.from_stats = false;
                self.from_list = false;
                self.current_item = Some(*id);
            }
            Location::List(id) => {
                self.current_list = Some(*id);
                self.from_list = true;
                self.from_stats = false;
            }
            Location::Stats => self.from_stats = false,
            Location::StatsType(t) => {
                self.stats.media_type = t.clone();
                self.stats.query.clear();
                self.from_stats = true;
            }
        }
        self.location = location;
    }

    /// Where "back" leads from the current location. Leaving a view resets the
    /// filter slot it owned.
    pub fn back_target(&mut self) -> Location {
        match self.location.clone() {
            Location::Edit(id) => Location::Item(id),
            Location::Item(_) => {
                if self.from_stats {
                    Location::StatsType(self.stats.media_type.clone())
                } else if self.from_list {
                    self.current_list.map_or(Location::Lists, Location::List)
                } else {
                    Location::Home
                }
            }
            Location::List(_) => {
                self.picker.clear();
                Location::Lists
            }
            Location::Lists => {
                self.catalog.clear();
                Location::Home
            }
            Location::New => {
                self.catalog.clear();
                self.stats.clear();
                Location::Home
            }
            Location::StatsType(_) => Location::Stats,
            Location::Stats => {
                self.stats.clear();
                Location::Home
            }
            Location::Home => Location::Home,
        }
    }

    /// The home button: clears the catalog filter.
    pub fn home(&mut self) {
        self.catalog.clear();
        self.enter(Location::Home);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Location::parse(""), Location::Home);
        assert_eq!(Location::parse("#/"), Location::Home);
        assert_eq!(Location::parse("#/home"), Location::Home);
        assert_eq!(Location::parse("item/4"), Location::Item(4));
        assert_eq!(Location::parse("#/edit/12"), Location::Edit(12));
        assert_eq!(Location::parse("new"), Location::New);
        assert_eq!(Location::parse("lists"), Location::Lists);
        assert_eq!(Location::parse("lists/3"), Location::List(3));
        assert_eq!(Location::parse("stats"), Location::Stats);
        assert_eq!(Location::parse("stats/Blu-ray"), Location::StatsType("Blu-ray".into()));
        assert_eq!(Location::parse("nowhere"), Location::Home);
    }

    #[test]
    fn test_parse_malformed_keys() {
        assert_eq!(Location::parse("item/abc"), Location::Home);
        assert_eq!(Location::parse("lists/x"), Location::Lists);
    }

    #[test]
    fn test_stats_type_encoding() {
        let loc = Location::StatsType("4K Ultra HD".into());
        assert_eq!(loc.to_string(), "stats/4K%20Ultra%20HD");
        assert_eq!(Location::parse(&loc.to_string()), loc);
        assert_eq!(Location::parse("stats/100%"), Location::StatsType("100%".into()));
    }

    #[test]
    fn test_display_round_trips() {
        for loc in [
            Location::Home,
            Location::New,
            Location::Item(7),
            Location::Edit(7),
            Location::Lists,
            Location::List(2),
            Location::Stats,
            Location::StatsType("Unknown".into()),
        ] {
            assert_eq!(Location::parse(&loc.to_string()), loc);
        }
    }

    #[test]
    fn test_stats_drill_sets_context() {
        let mut nav = Navigator::new();
        nav.filter_mut(FilterContext::StatsDrill).query = "stale".into();
        nav.enter(Location::StatsType("DVD".into()));
        assert!(nav.from_stats);
        assert_eq!(nav.browse_context(), FilterContext::StatsDrill);
        assert_eq!(nav.filter(FilterContext::StatsDrill), &Filter::by_type("DVD"));
    }

    #[test]
    fn test_back_from_item_follows_provenance() {
        let mut nav = Navigator::new();
        nav.enter(Location::StatsType("Unknown".into()));
        nav.enter(Location::Item(4));
        assert_eq!(nav.back_target(), Location::StatsType("Unknown".into()));

        let mut nav = Navigator::new();
        nav.enter(Location::List(9));
        nav.enter(Location::Item(4));
        assert_eq!(nav.back_target(), Location::List(9));

        let mut nav = Navigator::new();
        nav.enter(Location::Item(4));
        assert_eq!(nav.back_target(), Location::Home);
    }

    #[test]
    fn test_back_resets_owned_filters() {
        let mut nav = Navigator::new();
        nav.filter_mut(FilterContext::Catalog).query = "heat".into();
        nav.enter(Location::Lists);
        assert_eq!(nav.back_target(), Location::Home);
        assert!(nav.filter(FilterContext::Catalog).is_empty());

        nav.enter(Location::List(2));
        nav.filter_mut(FilterContext::ListPicker).media_type = "DVD".into();
        assert_eq!(nav.back_target(), Location::Lists);
        assert!(nav.filter(FilterContext::ListPicker).is_empty());

        nav.enter(Location::Stats);
        nav.filter_mut(FilterContext::StatsDrill).media_type = "DVD".into();
        assert_eq!(nav.back_target(), Location::Home);
        assert!(nav.filter(FilterContext::StatsDrill).is_empty());
    }

    #[test]
    fn test_back_chain_edit_item_stats() {
        let mut nav = Navigator::new();
        nav.enter(Location::Edit(3));
        assert_eq!(nav.back_target(), Location::Item(3));
        nav.enter(Location::StatsType("DVD".into()));
        assert_eq!(nav.back_target(), Location::Stats);
    }

    #[test]
    fn test_new_and_home_clear_provenance() {
        let mut nav = Navigator::new();
        nav.enter(Location::StatsType("DVD".into()));
        nav.enter(Location::New);
        assert!(!nav.from_stats);
        assert_eq!(nav.current_item, None);
        assert_eq!(nav.back_target(), Location::Home);
        assert!(nav.filter(FilterContext::StatsDrill).is_empty());

        nav.enter(Location::List(1));
        nav.filter_mut(FilterContext::Catalog).query = "x".into();
        nav.home();
        assert!(!nav.from_list);
        assert!(nav.filter(FilterContext::Catalog).is_empty());
    }
}
