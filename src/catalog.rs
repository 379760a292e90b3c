use thiserror::Error;

use crate::db::models::{Item, List};
use crate::db::{Collection, Database, DbError};

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A required field was blank. Nothing was written.
    #[error("{0}")]
    Validation(String),
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: i64 },
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Which cached collection(s) a refresh re-reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Items,
    Lists,
    All,
}

pub struct Catalog {
    db: Database,
    items: Vec<Item>,
    lists: Vec<List>,
    refreshes: usize,
    last_refresh: Option<Refresh>,
}

impl Catalog {
    /// Load both collections, seeding one example item if the catalog is empty.
    pub fn open(db: Database, seed_example: bool) -> Result<Self> {
        let mut catalog = Self {
            db,
            items: Vec::new(),
            lists: Vec::new(),
            refreshes: 0,
            last_refresh: None,
        };
        catalog.items = catalog.db.all_items()?;
        catalog.lists = catalog.db.all_lists()?;

        if catalog.items.is_empty() && seed_example {
            log::info!("Empty catalog, adding an example item");
            catalog.db.upsert_item(&Item::seed_example())?;
            catalog.items = catalog.db.all_items()?;
        }
        log::debug!(
            "Loaded {} items, {} lists",
            catalog.items.len(),
            catalog.lists.len()
        );
        Ok(catalog)
    }

    /// Invalidate and refetch. Called exactly once at the end of every mutation.
    pub fn refresh(&mut self, which: Refresh) -> Result<()> {
        if matches!(which, Refresh::Items | Refresh::All) {
            self.items = self.db.all_items()?;
        }
        if matches!(which, Refresh::Lists | Refresh::All) {
            self.lists = self.db.all_lists()?;
        }
        self.refreshes += 1;
        self.last_refresh = Some(which);
        Ok(())
    }

    /// Number of refreshes since the catalog was opened.
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn last_refresh(&self) -> Option<Refresh> {
        self.last_refresh
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn item(&self, id: i64) -> Option<&Item> {
        self.items.iter().find(|i| i.id == Some(id))
    }

    pub fn list(&self, id: i64) -> Option<&List> {
        self.lists.iter().find(|l| l.id == Some(id))
    }

    pub fn require_item(&self, id: i64) -> Result<&Item> {
        self.item(id).ok_or(CatalogError::NotFound {
            collection: Collection::Items,
            id,
        })
    }

    pub fn require_list(&self, id: i64) -> Result<&List> {
        self.list(id).ok_or(CatalogError::NotFound {
            collection: Collection::Lists,
            id,
        })
    }

    /// Item keys in display order (the full sequence, not a filtered view).
    pub fn item_order(&self) -> Vec<i64> {
        self.items.iter().filter_map(|i| i.id).collect()
    }

    /// Resolve a list's members to items, skipping keys that no longer exist.
    pub fn members(&self, list: &List) -> Vec<&Item> {
        list.item_ids.iter().filter_map(|&id| self.item(id)).collect()
    }

    /// Save an editor draft: insert when it has no key, overwrite in place otherwise.
    /// Returns the item's key.
    pub fn save_item(&mut self, draft: Item) -> Result<i64> {
        let item = normalize_draft(draft);
        let id = self.db.upsert_item(&item)?;
        log::info!("Saved item {id} \"{}\"", item.display_title());
        self.refresh(Refresh::Items)?;
        Ok(id)
    }
}

/// Trim every text field and drop custom entries with a blank key.
fn normalize_draft(mut item: Item) -> Item {
    for field in [
        &mut item.title,
        &mut item.genre,
        &mut item.media_type,
        &mut item.format,
        &mut item.region,
        &mut item.runtime,
        &mut item.audio,
        &mut item.hdr,
        &mut item.languages,
        &mut item.subtitles,
        &mut item.edition,
        &mut item.barcode,
        &mut item.packaging,
        &mut item.poster,
        &mut item.notes,
    ] {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }
    // 0 is "not set" in the editor
    item.year = item.year.filter(|&y| y != 0);
    item.discs = item.discs.filter(|&d| d != 0);
    item.custom = std::mem::take(&mut item.custom)
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect();
    item
}
