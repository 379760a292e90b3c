use crate::catalog::{Catalog, CatalogError, Refresh, Result};
use crate::db::Collection;
use crate::db::models::List;
use crate::prompt::Prompt;

/// Result of adding an item to a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The list already had the item; nothing was written.
    AlreadyPresent,
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation("Please enter a name".into()));
    }
    Ok(name)
}

impl Catalog {
    /// Create an empty list. Returns its key.
    pub fn create_list(&mut self, name: &str) -> Result<i64> {
        let name = validate_name(name)?;
        let id = self.db().upsert_list(&List::new(name))?;
        log::info!("Created list {id} \"{name}\"");
        self.refresh(Refresh::Lists)?;
        Ok(id)
    }

    /// Create a list whose only member is `item_id`. Returns the new list's key.
    pub fn create_list_with_item(&mut self, name: &str, item_id: i64) -> Result<i64> {
        let name = validate_name(name)?;
        self.require_item(item_id)?;
        let list = List {
            id: None,
            name: name.to_string(),
            item_ids: vec![item_id],
        };
        let id = self.db().upsert_list(&list)?;
        log::info!("Created list {id} \"{name}\" with item {item_id}");
        self.refresh(Refresh::Lists)?;
        Ok(id)
    }

    /// Overwrite a list's name, leaving its membership untouched.
    pub fn rename_list(&mut self, list_id: i64, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let mut list = self.require_list(list_id)?.clone();
        list.name = name.to_string();
        self.db().upsert_list(&list)?;
        self.refresh(Refresh::Lists)?;
        Ok(())
    }

    /// Delete a list after confirmation. Items are not affected.
    /// Returns `false` if the user declined.
    pub fn delete_list(&mut self, list_id: i64, prompt: &mut dyn Prompt) -> Result<bool> {
        let name = self.require_list(list_id)?.name.clone();
        if !prompt.confirm(&format!("Delete list \"{name}\"?")) {
            return Ok(false);
        }
        self.db().remove(Collection::Lists, list_id)?;
        log::info!("Deleted list {list_id} \"{name}\"");
        self.refresh(Refresh::Lists)?;
        Ok(true)
    }

    /// Append an item to a list unless it is already a member.
    pub fn add_item_to_list(&mut self, list_id: i64, item_id: i64) -> Result<AddOutcome> {
        self.require_item(item_id)?;
        let mut list = self.require_list(list_id)?.clone();
        if list.contains(item_id) {
            log::debug!("\"{}\" already contains item {item_id}", list.name);
            return Ok(AddOutcome::AlreadyPresent);
        }
        list.item_ids.push(item_id);
        self.db().upsert_list(&list)?;
        self.refresh(Refresh::Lists)?;
        Ok(AddOutcome::Added)
    }

    /// Drop an item from a list. Returns whether it was a member.
    pub fn remove_item_from_list(&mut self, list_id: i64, item_id: i64) -> Result<bool> {
        let mut list = self.require_list(list_id)?.clone();
        let before = list.item_ids.len();
        list.item_ids.retain(|&x| x != item_id);
        let was_member = list.item_ids.len() != before;
        self.db().upsert_list(&list)?;
        self.refresh(Refresh::Lists)?;
        Ok(was_member)
    }

    /// Delete an item after confirmation, pruning it from every list.
    /// Returns `false` if the user declined.
    pub fn delete_item(&mut self, item_id: i64, prompt: &mut dyn Prompt) -> Result<bool> {
        self.require_item(item_id)?;
        if !prompt.confirm("Are you sure you want to delete this item?") {
            return Ok(false);
        }
        let result = self.db().delete_item_cascade(item_id)?;
        log::info!(
            "Deleted item {item_id}, pruned from {} lists",
            result.lists_pruned
        );
        self.refresh(Refresh::All)?;
        Ok(true)
    }

    /// Delete several items with cascade. Each item is its own transaction; a
    /// storage failure part-way leaves the earlier deletions in place.
    /// Returns how many items were actually removed.
    pub fn delete_items(&mut self, ids: &[i64]) -> Result<usize> {
        let mut removed = 0;
        for &id in ids {
            if self.db().delete_item_cascade(id)?.item_removed {
                removed += 1;
            }
        }
        log::info!("Deleted {removed} of {} selected items", ids.len());
        self.refresh(Refresh::All)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::models::Item;
    use crate::prompt::Scripted;

    fn catalog_with(titles: &[&str]) -> (Catalog, Vec<i64>) {
        let mut catalog = Catalog::open(Database::open_in_memory().unwrap(), false).unwrap();
        let ids = titles
            .iter()
            .map(|t| {
                catalog
                    .save_item(Item { title: t.to_string(), ..Item::default() })
                    .unwrap()
            })
            .collect();
        (catalog, ids)
    }

    #[test]
    fn test_create_list_rejects_blank_name() {
        let (mut catalog, _) = catalog_with(&[]);
        let before = catalog.refresh_count();
        assert!(matches!(catalog.create_list("   "), Err(CatalogError::Validation(_))));
        assert!(catalog.lists().is_empty());
        assert_eq!(catalog.refresh_count(), before);
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let list = catalog.create_list("Action").unwrap();
        assert_eq!(catalog.add_item_to_list(list, ids[0]).unwrap(), AddOutcome::Added);
        let refreshes = catalog.refresh_count();
        assert_eq!(
            catalog.add_item_to_list(list, ids[0]).unwrap(),
            AddOutcome::AlreadyPresent
        );
        assert_eq!(catalog.list(list).unwrap().item_ids, vec![ids[0]]);
        assert_eq!(catalog.refresh_count(), refreshes);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let (mut catalog, ids) = catalog_with(&["A", "B", "C"]);
        let list = catalog.create_list("Mixed").unwrap();
        for &id in [ids[2], ids[0], ids[1]].iter() {
            catalog.add_item_to_list(list, id).unwrap();
        }
        assert_eq!(catalog.list(list).unwrap().item_ids, vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn test_add_unknown_item_or_list() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let list = catalog.create_list("Action").unwrap();
        assert!(matches!(
            catalog.add_item_to_list(list, 999),
            Err(CatalogError::NotFound { collection: Collection::Items, .. })
        ));
        assert!(matches!(
            catalog.add_item_to_list(999, ids[0]),
            Err(CatalogError::NotFound { collection: Collection::Lists, .. })
        ));
    }

    #[test]
    fn test_each_mutation_refreshes_once() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let start = catalog.refresh_count();
        let list = catalog.create_list("Action").unwrap();
        assert_eq!(catalog.refresh_count(), start + 1);
        catalog.add_item_to_list(list, ids[0]).unwrap();
        assert_eq!(catalog.refresh_count(), start + 2);
        catalog.rename_list(list, "Thrillers").unwrap();
        assert_eq!(catalog.refresh_count(), start + 3);
        catalog.remove_item_from_list(list, ids[0]).unwrap();
        assert_eq!(catalog.refresh_count(), start + 4);
        assert_eq!(catalog.last_refresh(), Some(Refresh::Lists));
    }

    #[test]
    fn test_create_list_with_item() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let list = catalog.create_list_with_item(" Favourites ", ids[0]).unwrap();
        let stored = catalog.list(list).unwrap();
        assert_eq!(stored.name, "Favourites");
        assert_eq!(stored.item_ids, vec![ids[0]]);
        assert!(catalog.create_list_with_item("", ids[0]).is_err());
    }

    #[test]
    fn test_rename_only_changes_name() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let list = catalog.create_list_with_item("Action", ids[0]).unwrap();
        catalog.rename_list(list, "Crime").unwrap();
        let stored = catalog.list(list).unwrap();
        assert_eq!(stored.name, "Crime");
        assert_eq!(stored.item_ids, vec![ids[0]]);
        assert!(matches!(catalog.rename_list(list, " "), Err(CatalogError::Validation(_))));
        assert_eq!(catalog.list(list).unwrap().name, "Crime");
    }

    #[test]
    fn test_remove_item_from_list() {
        let (mut catalog, ids) = catalog_with(&["A", "B"]);
        let list = catalog.create_list("L").unwrap();
        catalog.add_item_to_list(list, ids[0]).unwrap();
        catalog.add_item_to_list(list, ids[1]).unwrap();
        assert!(catalog.remove_item_from_list(list, ids[0]).unwrap());
        assert!(!catalog.remove_item_from_list(list, ids[0]).unwrap());
        assert_eq!(catalog.list(list).unwrap().item_ids, vec![ids[1]]);
        // items are untouched
        assert_eq!(catalog.items().len(), 2);
    }

    #[test]
    fn test_delete_list_requires_confirmation() {
        let (mut catalog, ids) = catalog_with(&["Heat"]);
        let list = catalog.create_list_with_item("Action", ids[0]).unwrap();

        let mut no = Scripted::confirming(&[false]);
        assert!(!catalog.delete_list(list, &mut no).unwrap());
        assert_eq!(no.asked, vec!["Delete list \"Action\"?".to_string()]);
        assert!(catalog.list(list).is_some());

        let mut yes = Scripted::confirming(&[true]);
        assert!(catalog.delete_list(list, &mut yes).unwrap());
        assert!(catalog.list(list).is_none());
        assert_eq!(catalog.items().len(), 1);
    }

    #[test]
    fn test_delete_item_cascades_to_all_lists() {
        let (mut catalog, ids) = catalog_with(&["A", "B", "C", "D", "E"]);
        let five = ids[4];
        let a = catalog.create_list("A").unwrap();
        let b = catalog.create_list("B").unwrap();
        for list in [a, b] {
            catalog.add_item_to_list(list, ids[0]).unwrap();
            catalog.add_item_to_list(list, five).unwrap();
        }

        let before = catalog.refresh_count();
        assert!(catalog.delete_item(five, &mut Scripted::confirming(&[true])).unwrap());
        assert_eq!(catalog.refresh_count(), before + 1);
        assert_eq!(catalog.last_refresh(), Some(Refresh::All));

        assert!(catalog.item(five).is_none());
        assert!(catalog.db().get_item(five).unwrap().is_none());
        for list in catalog.lists() {
            assert!(!list.contains(five));
            assert!(list.contains(ids[0]));
        }
    }

    #[test]
    fn test_delete_item_declined_keeps_everything() {
        let (mut catalog, ids) = catalog_with(&["A"]);
        let list = catalog.create_list_with_item("L", ids[0]).unwrap();
        assert!(!catalog.delete_item(ids[0], &mut Scripted::confirming(&[false])).unwrap());
        assert!(catalog.item(ids[0]).is_some());
        assert!(catalog.list(list).unwrap().contains(ids[0]));
    }

    #[test]
    fn test_delete_items_bulk() {
        let (mut catalog, ids) = catalog_with(&["A", "B", "C"]);
        let list = catalog.create_list("L").unwrap();
        for &id in &ids {
            catalog.add_item_to_list(list, id).unwrap();
        }
        let before = catalog.refresh_count();
        assert_eq!(catalog.delete_items(&[ids[0], ids[2], 12345]).unwrap(), 2);
        assert_eq!(catalog.refresh_count(), before + 1);
        assert_eq!(catalog.item_order(), vec![ids[1]]);
        assert_eq!(catalog.list(list).unwrap().item_ids, vec![ids[1]]);
    }
}
