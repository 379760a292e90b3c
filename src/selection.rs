//! Multi-select over catalog items.
//!
//! Two states: browsing (initial) and selecting. Long-press, shift-click and
//! right-click on an item all map to the same "enter selecting" transition;
//! pointer timing lives in [`LongPress`], and only the resulting [`Gesture`]
//! reaches the state machine.
//!
//! Every gesture takes the full item order (not the filtered view). Keys not in
//! that order are ignored, so the selected set only ever holds existing keys.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// How long an item must be held before selecting starts.
pub const LONG_PRESS: Duration = Duration::from_millis(1600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Held press completed (see [`LongPress`]).
    LongPress(i64),
    Click(i64),
    ShiftClick(i64),
    /// Right-click / context menu.
    ContextMenu(i64),
    SelectAll,
    /// Explicit cancel action.
    Cancel,
    EscapeKey,
    DeleteKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A plain click while browsing: open the item.
    Open(i64),
    /// Selection state or membership changed.
    Changed,
    /// Bulk delete was asked for; the caller must confirm it.
    DeleteRequested,
    Ignored,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Browsing,
    Selecting {
        selected: BTreeSet<i64>,
        /// Last touched item, the range-select anchor.
        anchor: Option<i64>,
    },
}

#[derive(Debug, Default)]
pub struct Selection {
    state: State,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, State::Selecting { .. })
    }

    pub fn contains(&self, id: i64) -> bool {
        match &self.state {
            State::Selecting { selected, .. } => selected.contains(&id),
            State::Browsing => false,
        }
    }

    pub fn len(&self) -> usize {
        match &self.state {
            State::Selecting { selected, .. } => selected.len(),
            State::Browsing => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn anchor(&self) -> Option<i64> {
        match &self.state {
            State::Selecting { anchor, .. } => *anchor,
            State::Browsing => None,
        }
    }

    /// Selected keys in the given display order.
    pub fn selected_in(&self, order: &[i64]) -> Vec<i64> {
        order.iter().copied().filter(|&id| self.contains(id)).collect()
    }

    /// Start selecting with `{id}` as the set and anchor.
    pub fn enter(&mut self, id: i64) {
        self.state = State::Selecting {
            selected: BTreeSet::from([id]),
            anchor: Some(id),
        };
    }

    /// Leave selecting and clear the set.
    pub fn exit(&mut self) {
        self.state = State::Browsing;
    }

    pub fn toggle(&mut self, id: i64) {
        if let State::Selecting { selected, .. } = &mut self.state {
            if !selected.remove(&id) {
                selected.insert(id);
            }
        }
    }

    /// Add every key positioned between `from` and `to` (inclusive) in `order`.
    /// Does nothing if either key is absent.
    pub fn select_range(&mut self, from: i64, to: i64, order: &[i64]) {
        let State::Selecting { selected, .. } = &mut self.state else {
            return;
        };
        let (Some(a), Some(b)) = (
            order.iter().position(|&x| x == from),
            order.iter().position(|&x| x == to),
        ) else {
            return;
        };
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        selected.extend(&order[start..=end]);
    }

    pub fn select_all(&mut self, order: &[i64]) {
        if let State::Selecting { selected, .. } = &mut self.state {
            *selected = order.iter().copied().collect();
        }
    }

    fn set_anchor(&mut self, id: i64) {
        if let State::Selecting { anchor, .. } = &mut self.state {
            *anchor = Some(id);
        }
    }

    /// Apply one input gesture.
    pub fn handle(&mut self, gesture: Gesture, order: &[i64]) -> Outcome {
        let known = |id: i64| order.contains(&id);

        match (self.is_selecting(), gesture) {
            (false, Gesture::Click(id)) if known(id) => Outcome::Open(id),
            (false, Gesture::LongPress(id) | Gesture::ShiftClick(id) | Gesture::ContextMenu(id))
                if known(id) =>
            {
                self.enter(id);
                Outcome::Changed
            }
            (true, Gesture::Click(id)) if known(id) => {
                self.toggle(id);
                self.set_anchor(id);
                Outcome::Changed
            }
            (true, Gesture::ShiftClick(id)) if known(id) => {
                match self.anchor() {
                    Some(anchor) => self.select_range(anchor, id, order),
                    None => self.toggle(id),
                }
                self.set_anchor(id);
                Outcome::Changed
            }
            (true, Gesture::ContextMenu(id)) if known(id) => {
                self.toggle(id);
                Outcome::Changed
            }
            (true, Gesture::SelectAll) => {
                self.select_all(order);
                Outcome::Changed
            }
            (true, Gesture::Cancel | Gesture::EscapeKey) => {
                self.exit();
                Outcome::Changed
            }
            (true, Gesture::DeleteKey) if !self.is_empty() => Outcome::DeleteRequested,
            _ => Outcome::Ignored,
        }
    }
}

/// Press-and-hold detector. Movement, release or leaving the item cancels it.
#[derive(Debug, Default)]
pub struct LongPress {
    pending: Option<(i64, Instant)>,
}

impl LongPress {
    pub fn press(&mut self, id: i64, at: Instant) {
        self.pending = Some((id, at));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// The held item once [`LONG_PRESS`] has elapsed. Fires at most once per press.
    pub fn poll(&mut self, now: Instant) -> Option<i64> {
        let (id, since) = self.pending?;
        if now.saturating_duration_since(since) >= LONG_PRESS {
            self.pending = None;
            Some(id)
        } else {
            None
        }
    }
}
