use crate::catalog::{Catalog, Result};
use crate::db::models::Item;
use crate::filter::{self, FilterContext, Scope};
use crate::nav::{Location, Navigator};
use crate::prompt::Prompt;
use crate::selection::{Gesture, Outcome, Selection};

pub struct Session {
    pub catalog: Catalog,
    pub nav: Navigator,
    pub selection: Selection,
}

impl Session {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            nav: Navigator::new(),
            selection: Selection::new(),
        }
    }

    pub fn location(&self) -> &Location {
        self.nav.location()
    }

    /// Go to `location`, redirecting if its record is gone. Selecting only
    /// survives on the catalog grid.
    pub fn navigate(&mut self, location: Location) -> &Location {
        let location = Navigator::resolve(location, &self.catalog);
        if !matches!(location, Location::Home | Location::StatsType(_)) {
            self.selection.exit();
        }
        log::debug!("Navigating to {location}");
        self.nav.enter(location);
        self.nav.location()
    }

    pub fn back(&mut self) -> &Location {
        let target = self.nav.back_target();
        self.navigate(target)
    }

    /// Catalog grid contents under the live filter slot.
    pub fn visible_catalog(&self) -> Vec<&Item> {
        let context = self.nav.browse_context();
        let scope = match context {
            FilterContext::StatsDrill => Scope::StatsDrill,
            _ => Scope::Catalog,
        };
        filter::visible_items(self.catalog.items(), self.nav.filter(context), scope)
    }

    /// Candidates for the current list's "add item" picker. Empty when no list
    /// is open.
    pub fn add_picker(&self) -> Vec<&Item> {
        let Some(list) = self.nav.current_list.and_then(|id| self.catalog.list(id)) else {
            return Vec::new();
        };
        filter::visible_items(
            self.catalog.items(),
            self.nav.filter(FilterContext::ListPicker),
            Scope::ListPicker { list },
        )
    }

    /// Save an editor draft and open the saved item.
    pub fn save_item(&mut self, draft: Item) -> Result<i64> {
        let id = self.catalog.save_item(draft)?;
        self.nav.from_list = false;
        self.navigate(Location::Item(id));
        Ok(id)
    }

    /// Delete the item being viewed, then go back.
    pub fn delete_current_item(&mut self, prompt: &mut dyn Prompt) -> Result<bool> {
        let Some(id) = self.nav.current_item else {
            return Ok(false);
        };
        if !self.catalog.delete_item(id, prompt)? {
            return Ok(false);
        }
        self.nav.current_item = None;
        self.back();
        Ok(true)
    }

    /// Delete the open list and return to the lists view.
    pub fn delete_current_list(&mut self, prompt: &mut dyn Prompt) -> Result<bool> {
        let Some(id) = self.nav.current_list else {
            return Ok(false);
        };
        if !self.catalog.delete_list(id, prompt)? {
            return Ok(false);
        }
        self.nav.current_list = None;
        self.navigate(Location::Lists);
        Ok(true)
    }

    /// Feed a gesture to the selection. A plain click opens the item.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> Outcome {
        let order = self.catalog.item_order();
        let outcome = self.selection.handle(gesture, &order);
        if let Outcome::Open(id) = outcome {
            self.navigate(Location::Item(id));
        }
        outcome
    }

    /// Start selecting `ids`, the first one as the anchor. Fails without
    /// touching the selection if any key is not in the catalog.
    pub fn select_items(&mut self, ids: &[i64]) -> Result<()> {
        for &id in ids {
            self.catalog.require_item(id)?;
        }
        let Some((&first, rest)) = ids.split_first() else {
            return Ok(());
        };
        self.selection.exit();
        self.handle_gesture(Gesture::LongPress(first));
        for &id in rest {
            if !self.selection.contains(id) {
                self.handle_gesture(Gesture::Click(id));
            }
        }
        Ok(())
    }

    /// Start selecting every item between `from` and `to` in catalog order.
    pub fn select_range(&mut self, from: i64, to: i64) -> Result<()> {
        self.catalog.require_item(from)?;
        self.catalog.require_item(to)?;
        self.selection.exit();
        self.handle_gesture(Gesture::LongPress(from));
        self.handle_gesture(Gesture::ShiftClick(to));
        Ok(())
    }

    /// Start selecting with every item selected. No-op on an empty catalog.
    pub fn select_all(&mut self) {
        let Some(first) = self.catalog.item_order().first().copied() else {
            return;
        };
        self.selection.exit();
        self.handle_gesture(Gesture::LongPress(first));
        self.handle_gesture(Gesture::SelectAll);
    }

    /// Confirm and delete every selected item. Selecting ends either way.
    /// Returns how many items were removed.
    pub fn delete_selected(&mut self, prompt: &mut dyn Prompt) -> Result<usize> {
        let ids = self.selection.selected_in(&self.catalog.item_order());
        if ids.is_empty() {
            return Ok(0);
        }
        let noun = if ids.len() == 1 { "item" } else { "items" };
        if !prompt.confirm(&format!("Delete {} selected {noun}?", ids.len())) {
            self.selection.exit();
            return Ok(0);
        }
        let removed = self.catalog.delete_items(&ids)?;
        self.selection.exit();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::db::Database;
    use crate::prompt::Scripted;

    fn session_with(items: &[(&str, &str)]) -> (Session, Vec<i64>) {
        let mut catalog = Catalog::open(Database::open_in_memory().unwrap(), false).unwrap();
        let ids = items
            .iter()
            .map(|(title, media_type)| {
                catalog
                    .save_item(Item {
                        title: title.to_string(),
                        media_type: media_type.to_string(),
                        ..Item::default()
                    })
                    .unwrap()
            })
            .collect();
        (Session::new(catalog), ids)
    }

    #[test]
    fn test_missing_records_redirect() {
        let (mut s, _) = session_with(&[("Heat", "")]);
        assert_eq!(s.navigate(Location::Item(404)), &Location::Home);
        assert_eq!(s.navigate(Location::Edit(404)), &Location::Home);
        assert_eq!(s.navigate(Location::List(404)), &Location::Lists);
    }

    #[test]
    fn test_stats_drill_then_back_restores_group() {
        let (mut s, ids) = session_with(&[("Alpha", "DVD"), ("Beta", ""), ("Gamma", "DVD")]);
        s.navigate(Location::StatsType("DVD".into()));
        let titles: Vec<_> = s.visible_catalog().iter().map(|i| i.title.clone()).collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);

        s.navigate(Location::Item(ids[2]));
        assert_eq!(s.back(), &Location::StatsType("DVD".into()));
        assert_eq!(s.back(), &Location::Stats);
        assert_eq!(s.back(), &Location::Home);
        assert_eq!(s.visible_catalog().len(), 3);
    }

    #[test]
    fn test_delete_from_list_detail_returns_to_list() {
        let (mut s, ids) = session_with(&[("Heat", ""), ("Ran", "")]);
        let list = s.catalog.create_list("Crime").unwrap();
        s.catalog.add_item_to_list(list, ids[0]).unwrap();
        s.navigate(Location::List(list));
        s.navigate(Location::Item(ids[0]));

        let mut prompt = Scripted::confirming(&[true]);
        assert!(s.delete_current_item(&mut prompt).unwrap());
        assert_eq!(s.location(), &Location::List(list));
        assert!(s.catalog.list(list).unwrap().item_ids.is_empty());
    }

    #[test]
    fn test_declined_delete_stays_put() {
        let (mut s, ids) = session_with(&[("Heat", "")]);
        s.navigate(Location::Item(ids[0]));
        let mut prompt = Scripted::confirming(&[false]);
        assert!(!s.delete_current_item(&mut prompt).unwrap());
        assert_eq!(s.location(), &Location::Item(ids[0]));
        assert!(s.catalog.item(ids[0]).is_some());
    }

    #[test]
    fn test_delete_current_list_goes_to_lists() {
        let (mut s, _) = session_with(&[]);
        let list = s.catalog.create_list("Westerns").unwrap();
        s.navigate(Location::List(list));
        let mut prompt = Scripted::confirming(&[true]);
        assert!(s.delete_current_list(&mut prompt).unwrap());
        assert_eq!(s.location(), &Location::Lists);
        assert!(s.catalog.lists().is_empty());
    }

    #[test]
    fn test_save_opens_item_and_drops_list_provenance() {
        let (mut s, _) = session_with(&[]);
        let list = s.catalog.create_list("Crime").unwrap();
        s.navigate(Location::List(list));
        s.navigate(Location::New);
        let id = s.save_item(Item { title: "Thief".into(), ..Item::default() }).unwrap();
        assert_eq!(s.location(), &Location::Item(id));
        assert!(!s.nav.from_list);
        assert_eq!(s.back(), &Location::Home);
    }

    #[test]
    fn test_picker_hides_members() {
        let (mut s, ids) = session_with(&[("Heat", "Blu-ray"), ("Ran", "DVD"), ("Thief", "DVD")]);
        assert!(s.add_picker().is_empty());
        let list = s.catalog.create_list("Crime").unwrap();
        s.catalog.add_item_to_list(list, ids[1]).unwrap();
        s.navigate(Location::List(list));
        s.nav.filter_mut(FilterContext::ListPicker).media_type = "dvd".into();
        let titles: Vec<_> = s.add_picker().iter().map(|i| i.title.clone()).collect();
        assert_eq!(titles, vec!["Thief"]);
    }

    #[test]
    fn test_click_opens_item_and_long_press_selects() {
        let (mut s, ids) = session_with(&[("Heat", ""), ("Ran", "")]);
        assert_eq!(s.handle_gesture(Gesture::Click(ids[1])), Outcome::Open(ids[1]));
        assert_eq!(s.location(), &Location::Item(ids[1]));

        s.navigate(Location::Home);
        s.handle_gesture(Gesture::LongPress(ids[0]));
        assert!(s.selection.is_selecting());
        s.navigate(Location::Lists);
        assert!(!s.selection.is_selecting());
    }

    #[test]
    fn test_bulk_delete_confirmed() {
        let (mut s, ids) = session_with(&[("A", ""), ("B", ""), ("C", ""), ("D", "")]);
        let list = s.catalog.create_list("Mix").unwrap();
        s.catalog.add_item_to_list(list, ids[1]).unwrap();
        s.catalog.add_item_to_list(list, ids[3]).unwrap();

        s.handle_gesture(Gesture::ShiftClick(ids[0]));
        s.handle_gesture(Gesture::ShiftClick(ids[1]));
        assert_eq!(s.handle_gesture(Gesture::DeleteKey), Outcome::DeleteRequested);

        let mut prompt = Scripted::confirming(&[true]);
        assert_eq!(s.delete_selected(&mut prompt).unwrap(), 2);
        assert_eq!(prompt.asked, vec!["Delete 2 selected items?"]);
        assert!(!s.selection.is_selecting());
        assert_eq!(s.catalog.item_order(), vec![ids[2], ids[3]]);
        assert_eq!(s.catalog.list(list).unwrap().item_ids, vec![ids[3]]);
    }

    #[test]
    fn test_bulk_delete_declined_exits_selecting() {
        let (mut s, ids) = session_with(&[("A", ""), ("B", "")]);
        s.handle_gesture(Gesture::ContextMenu(ids[0]));
        let mut prompt = Scripted::confirming(&[false]);
        assert_eq!(s.delete_selected(&mut prompt).unwrap(), 0);
        assert_eq!(prompt.asked, vec!["Delete 1 selected item?"]);
        assert!(!s.selection.is_selecting());
        assert_eq!(s.catalog.items().len(), 2);
    }

    #[test]
    fn test_select_items_rejects_unknown_key() {
        let (mut s, ids) = session_with(&[("A", ""), ("B", ""), ("C", "")]);
        assert!(matches!(
            s.select_items(&[999, ids[0], ids[1]]),
            Err(CatalogError::NotFound { id: 999, .. })
        ));
        assert!(!s.selection.is_selecting());
        assert_eq!(s.location(), &Location::Home);

        s.select_items(&[ids[2], ids[0], ids[0]]).unwrap();
        assert_eq!(s.selection.selected_in(&s.catalog.item_order()), vec![ids[0], ids[2]]);
        assert_eq!(s.location(), &Location::Home);
    }

    #[test]
    fn test_select_range_rejects_unknown_endpoint() {
        let (mut s, ids) = session_with(&[("A", ""), ("B", ""), ("C", "")]);
        assert!(s.select_range(999, ids[1]).is_err());
        assert!(!s.selection.is_selecting());
        assert_eq!(s.handle_gesture(Gesture::DeleteKey), Outcome::Ignored);

        s.select_range(ids[2], ids[0]).unwrap();
        assert_eq!(s.selection.len(), 3);
    }

    #[test]
    fn test_select_all() {
        let (mut s, ids) = session_with(&[("A", ""), ("B", "")]);
        s.select_all();
        assert_eq!(s.selection.selected_in(&s.catalog.item_order()), ids);

        let (mut empty, _) = session_with(&[]);
        empty.select_all();
        assert!(!empty.selection.is_selecting());
    }

    #[test]
    fn test_bulk_delete_with_nothing_selected_asks_nothing() {
        let (mut s, _) = session_with(&[("A", "")]);
        let mut prompt = Scripted::confirming(&[true]);
        assert_eq!(s.delete_selected(&mut prompt).unwrap(), 0);
        assert!(prompt.asked.is_empty());
    }
}
