use crate::db::models::{Item, List, UNKNOWN_TYPE};

/// Free-text query plus type constraint. Blank means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub query: String,
    pub media_type: String,
}

impl Filter {
    pub fn new(query: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            media_type: media_type.into(),
        }
    }

    pub fn by_type(media_type: impl Into<String>) -> Self {
        Self::new("", media_type)
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.media_type.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.media_type.trim().is_empty()
    }
}

/// The three independent filter slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterContext {
    /// Catalog browsing (home).
    Catalog,
    /// Catalog reached by drilling into a stats group.
    StatsDrill,
    /// The "add item" picker on a list's detail view.
    ListPicker,
}

/// Where a filter is applied.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Catalog,
    StatsDrill,
    /// Candidates for adding to `list`: its members are excluded.
    ListPicker { list: &'a List },
}

impl Scope<'_> {
    pub fn context(&self) -> FilterContext {
        match self {
            Self::Catalog => FilterContext::Catalog,
            Self::StatsDrill => FilterContext::StatsDrill,
            Self::ListPicker { .. } => FilterContext::ListPicker,
        }
    }
}

/// Items passing `filter` within `scope`, in catalog order.
pub fn visible_items<'a>(items: &'a [Item], filter: &Filter, scope: Scope<'_>) -> Vec<&'a Item> {
    let query = filter.query.trim().to_lowercase();
    let wanted_type = filter.media_type.trim();
    let context = scope.context();

    items
        .iter()
        .filter(|item| match scope {
            Scope::ListPicker { list } => !item.id.is_some_and(|id| list.contains(id)),
            _ => true,
        })
        .filter(|item| matches_type(item, wanted_type))
        .filter(|item| query.is_empty() || searchable_text(item, context).contains(&query))
        .collect()
}

/// Type rule: blank passes everything, "Unknown" passes only items with blank
/// type and format, anything else is a case-insensitive match on `type`.
pub fn matches_type(item: &Item, wanted: &str) -> bool {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        return true;
    }
    if wanted == UNKNOWN_TYPE {
        return item.is_unknown();
    }
    item.media_type.trim().to_lowercase() == wanted.to_lowercase()
}

/// Lowercased, space-joined text the query is matched against.
///
/// The picker searches title, year, format and genre only; type is left out
/// so the query box does not overlap the type control.
pub fn searchable_text(item: &Item, context: FilterContext) -> String {
    let year = item.year.map(|y| y.to_string()).unwrap_or_default();
    let discs = item.discs.map(|d| d.to_string()).unwrap_or_default();

    let mut parts: Vec<&str> = match context {
        FilterContext::ListPicker => vec![
            item.title.as_str(),
            year.as_str(),
            item.format.as_str(),
            item.genre.as_str(),
        ],
        FilterContext::Catalog | FilterContext::StatsDrill => vec![
            item.title.as_str(),
            year.as_str(),
            item.format.as_str(),
            item.region.as_str(),
            item.audio.as_str(),
            item.hdr.as_str(),
            item.edition.as_str(),
            discs.as_str(),
            item.runtime.as_str(),
            item.genre.as_str(),
            item.languages.as_str(),
            item.subtitles.as_str(),
            item.notes.as_str(),
            item.barcode.as_str(),
            item.packaging.as_str(),
        ],
    };
    if context != FilterContext::ListPicker {
        parts.extend(item.custom.values().map(String::as_str));
    }

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Distinct non-blank item types, sorted, for type-filter suggestions.
pub fn type_suggestions(items: &[Item]) -> Vec<String> {
    let mut types: Vec<String> = items
        .iter()
        .map(|i| i.media_type.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    types.sort();
    types.dedup();
    types
}
