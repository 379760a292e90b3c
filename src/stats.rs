use crate::catalog::Catalog;
use crate::db::models::Item;

/// One stats group: items sharing a type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub label: String,
    pub count: usize,
}

/// Catalog overview.
#[derive(Debug)]
pub struct CatalogStats {
    pub total_items: usize,
    pub total_lists: usize,
    pub unknown_items: usize,
    pub types: Vec<TypeCount>,
}

/// Count items per type label (type, else format, else "Unknown"),
/// groups in the order their label first appears.
pub fn type_breakdown(items: &[Item]) -> Vec<TypeCount> {
    let mut groups: Vec<TypeCount> = Vec::new();
    for item in items {
        let label = item.type_label();
        match groups.iter_mut().find(|g| g.label == label) {
            Some(g) => g.count += 1,
            None => groups.push(TypeCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    groups
}

pub fn summarize(catalog: &Catalog) -> CatalogStats {
    let items = catalog.items();
    CatalogStats {
        total_items: items.len(),
        total_lists: catalog.lists().len(),
        unknown_items: items.iter().filter(|i| i.is_unknown()).count(),
        types: type_breakdown(items),
    }
}
