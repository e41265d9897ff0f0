//! On-screen working copy of a collection.
//!
//! Moves are applied here synchronously, before the backend hears about
//! them. While a move is unconfirmed the array index, not `position`, is the
//! display order.

use shared::{
    domain::{ItemId, OrderedItem, Searchable},
    protocol::ReorderEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A search filter is active; indexes refer to a subset.
    Filtered,
    OutOfBounds,
    /// Arrow move past the first or last row.
    Boundary,
    NoDragInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: usize, to: usize },
    Unchanged,
    Ignored(IgnoreReason),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Order of the mirror at some instant. Only restorable while the mirror
/// still holds the same load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCheckpoint {
    generation: u64,
    order: Vec<ItemId>,
}

impl MirrorCheckpoint {
    pub fn order(&self) -> &[ItemId] {
        &self.order
    }
}

/// A finished gesture ready to be sent to the reorder endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderCommit {
    pub entries: Vec<ReorderEntry>,
    pub checkpoint: MirrorCheckpoint,
}

#[derive(Debug, Clone)]
struct DragState {
    origin: MirrorCheckpoint,
    /// Tracked by id; a rollback may shift the row while the drag is held.
    dragged: ItemId,
}

#[derive(Debug, Clone)]
pub struct LocalMirrorStore<P> {
    items: Vec<OrderedItem<P>>,
    position_base: i64,
    search: String,
    generation: u64,
    revision: u64,
    drag: Option<DragState>,
}

impl<P> Default for LocalMirrorStore<P> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<P> LocalMirrorStore<P> {
    pub fn new(position_base: i64) -> Self {
        Self {
            items: Vec::new(),
            position_base,
            search: String::new(),
            generation: 0,
            revision: 0,
            drag: None,
        }
    }

    pub fn with_items(position_base: i64, items: Vec<OrderedItem<P>>) -> Self {
        let mut store = Self::new(position_base);
        store.replace_all(items);
        store
    }

    pub fn items(&self) -> &[OrderedItem<P>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position_base(&self) -> i64 {
        self.position_base
    }

    /// Bumped on every `replace_all`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped on every local change of order.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &ItemId) -> Option<&OrderedItem<P>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    pub fn find_by_text(&self, raw: &str) -> Option<&OrderedItem<P>> {
        self.items.iter().find(|item| item.id.matches_text(raw))
    }

    /// Swaps in a freshly loaded collection. Unsaved moves and any drag in
    /// progress are dropped, and positions are re-derived from the order the
    /// backend returned.
    pub fn replace_all(&mut self, mut items: Vec<OrderedItem<P>>) {
        items.sort_by_key(|item| item.position);
        for (index, item) in items.iter_mut().enumerate() {
            item.position = self.position_base + index as i64;
        }
        self.items = items;
        self.drag = None;
        self.generation += 1;
        self.revision += 1;
    }

    pub fn snapshot(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn reorder_entries(&self) -> Vec<ReorderEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| ReorderEntry {
                id: item.id.clone(),
                position: self.position_base + index as i64,
            })
            .collect()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_reorderable(&self) -> bool {
        self.search.trim().is_empty()
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> MoveOutcome {
        if !self.is_reorderable() {
            return MoveOutcome::Ignored(IgnoreReason::Filtered);
        }
        if from >= self.items.len() || to >= self.items.len() {
            return MoveOutcome::Ignored(IgnoreReason::OutOfBounds);
        }
        if from == to {
            return MoveOutcome::Unchanged;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.revision += 1;
        MoveOutcome::Moved { from, to }
    }

    pub fn move_by_arrow(&mut self, index: usize, direction: Direction) -> MoveOutcome {
        if !self.is_reorderable() {
            return MoveOutcome::Ignored(IgnoreReason::Filtered);
        }
        if index >= self.items.len() {
            return MoveOutcome::Ignored(IgnoreReason::OutOfBounds);
        }
        let target = match direction {
            Direction::Up if index == 0 => {
                return MoveOutcome::Ignored(IgnoreReason::Boundary);
            }
            Direction::Up => index - 1,
            Direction::Down if index + 1 == self.items.len() => {
                return MoveOutcome::Ignored(IgnoreReason::Boundary);
            }
            Direction::Down => index + 1,
        };
        self.move_item(index, target)
    }

    pub fn checkpoint(&self) -> MirrorCheckpoint {
        MirrorCheckpoint {
            generation: self.generation,
            order: self.snapshot(),
        }
    }

    /// Puts items back in checkpoint order. Returns `false` without touching
    /// anything if a reload happened since the checkpoint was taken. A drag
    /// in progress keeps its row and restarts from the restored order.
    pub fn restore(&mut self, checkpoint: &MirrorCheckpoint) -> bool {
        if checkpoint.generation != self.generation {
            return false;
        }
        let mut remaining = std::mem::take(&mut self.items);
        let mut restored = Vec::with_capacity(remaining.len());
        for id in &checkpoint.order {
            if let Some(index) = remaining.iter().position(|item| &item.id == id) {
                restored.push(remaining.remove(index));
            }
        }
        restored.append(&mut remaining);
        self.items = restored;
        self.revision += 1;
        if self.drag.is_some() {
            let origin = self.checkpoint();
            if let Some(drag) = self.drag.as_mut() {
                drag.origin = origin;
            }
        }
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a drag gesture on the row at `index`.
    pub fn begin_drag(&mut self, index: usize) -> bool {
        if !self.is_reorderable() || index >= self.items.len() {
            return false;
        }
        self.drag = Some(DragState {
            origin: self.checkpoint(),
            dragged: self.items[index].id.clone(),
        });
        true
    }

    /// Hovering over `index` live-reorders the mirror. Nothing is sent.
    pub fn drag_over(&mut self, index: usize) -> MoveOutcome {
        let Some(dragged) = self.drag.as_ref().map(|drag| drag.dragged.clone()) else {
            return MoveOutcome::Ignored(IgnoreReason::NoDragInProgress);
        };
        let Some(current) = self.index_of(&dragged) else {
            self.drag = None;
            return MoveOutcome::Ignored(IgnoreReason::NoDragInProgress);
        };
        self.move_item(current, index)
    }

    /// Ends the gesture. Yields a commit only when the order differs from the
    /// one the gesture started from.
    pub fn drop_commit(&mut self) -> Option<ReorderCommit> {
        let drag = self.drag.take()?;
        if drag.origin.order == self.snapshot() {
            return None;
        }
        Some(ReorderCommit {
            entries: self.reorder_entries(),
            checkpoint: drag.origin,
        })
    }

    pub fn cancel_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(drag) => self.restore(&drag.origin),
            None => false,
        }
    }
}

impl<P: Searchable> LocalMirrorStore<P> {
    /// Rows matching the current search, in display order.
    pub fn visible(&self) -> Vec<&OrderedItem<P>> {
        self.items
            .iter()
            .filter(|item| item.payload.matches(&self.search))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/mirror_tests.rs"]
mod tests;
