//! Linear undo history of whole-document snapshots.

/// Snapshots with a cursor at the live state. Committing after an undo
/// discards the redo tail.
#[derive(Debug, Clone)]
pub struct HistoryStack<T: Clone> {
    entries: Vec<T>,
    cursor: usize,
}

impl<T: Clone> HistoryStack<T> {
    pub fn new(initial: T) -> Self {
        HistoryStack { entries: vec![initial], cursor: 0 }
    }

    /// Drop every entry and start again from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }

    /// Record a new live state.
    pub fn commit(&mut self, snapshot: &T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot.clone());
        self.cursor = self.entries.len() - 1;
        log::trace!("history commit, {} entries", self.entries.len());
    }

    /// Step back one entry and return a copy of it.
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward one entry and return a copy of it.
    pub fn redo(&mut self) -> Option<T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}
