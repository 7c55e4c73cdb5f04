//! The todo/notes board: owned collection, persistence and actions.
use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use log::{debug, info};
use uuid::Uuid;

use crate::{
    render_board, resolve_id, Board, NoteItem, PendingRemoval, RemovalQueue, Result, SlotBackend,
    Store, TODOS_SLOT,
};

/// State of the board. Every mutation is persisted before it returns.
pub struct TodoWidget {
    store: Store<NoteItem>,
    items: Vec<NoteItem>,
    removals: RemovalQueue,
}

impl TodoWidget {
    /// Loads the board from its slot.
    pub fn open(backend: Arc<dyn SlotBackend>) -> Result<Self> {
        let store = Store::new(backend, TODOS_SLOT);
        let items = store.load()?;
        info!("Opened todo board with {} items", items.len());
        Ok(Self {
            store,
            items,
            removals: RemovalQueue::new(),
        })
    }

    pub fn items(&self) -> &[NoteItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves a full id or a unique id prefix.
    pub fn find(&self, id_or_prefix: &str) -> Result<&NoteItem> {
        let id = resolve_id(self.items.iter().map(|item| item.id), id_or_prefix)?;
        Ok(&self.items[self.position_of(id)?])
    }

    /// Current stored index of `id`.
    pub fn position_of(&self, id: Uuid) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| crate::DeckError::RecordNotFound { id: id.to_string() })
    }

    /// Persists `items` and adopts them only once the write succeeded.
    fn commit(&mut self, items: Vec<NoteItem>) -> Result<()> {
        self.store.save(&items)?;
        self.items = items;
        Ok(())
    }

    pub fn add(&mut self, item: NoteItem) -> Result<()> {
        debug!("Adding {} note {}", item.note_type(), item.id);
        let mut items = self.items.clone();
        items.push(item);
        self.commit(items)
    }

    /// Flips `completed`; returns the new value.
    pub fn toggle_complete(&mut self, id: Uuid) -> Result<bool> {
        let position = self.position_of(id)?;
        let mut items = self.items.clone();
        let completed = !items[position].completed;
        items[position].completed = completed;
        self.commit(items)?;
        info!("Note {} marked {}", id, if completed { "done" } else { "open" });
        Ok(completed)
    }

    /// First phase of a delete: the record stays stored but renders as leaving.
    ///
    /// Dropping the returned handle without settling it un-marks the record.
    pub fn mark_for_removal(&mut self, id: Uuid, fallback: Duration) -> Result<PendingRemoval> {
        self.position_of(id)?;
        Ok(self.removals.mark(id, fallback))
    }

    /// Second phase: removes the record and persists.
    ///
    /// A failed write keeps the record, no longer marked as leaving.
    pub fn commit_removal(&mut self, id: Uuid) -> Result<NoteItem> {
        self.removals.finish(&id);
        let position = self.position_of(id)?;
        let mut items = self.items.clone();
        let removed = items.remove(position);
        self.commit(items)?;
        info!("Note {} deleted", id);
        Ok(removed)
    }

    /// Marks, waits for the transition (or its fallback) and commits.
    pub async fn delete(&mut self, id: Uuid, fallback: Duration) -> Result<NoteItem> {
        let mut pending = self.mark_for_removal(id, fallback)?;
        pending.transition_end();
        let (id, settled) = pending.settle().await;
        debug!("Removal of {} settled: {:?}", id, settled);
        self.commit_removal(id)
    }

    pub fn render(&self, today: NaiveDate) -> Board {
        render_board(&self.items, today, &self.removals.leaving())
    }
}
