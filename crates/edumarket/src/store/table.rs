use std::collections::{BTreeMap, HashMap, HashSet};

use super::journal::Write;
use super::RepositoryError;

/// A record kept by the document store.
pub(crate) trait Document: Clone + Send + 'static {
    const COLLECTION: &'static str;

    fn key(&self) -> &str;

    fn encode(&self) -> Result<String, RepositoryError>;

    fn decode(body: &str) -> Result<Self, RepositoryError>;
}

/// Id-keyed rows in insertion order. The sequence number a row gets on insert is kept for its
/// lifetime, so edits never move a record in the "newest first" listings.
#[derive(Debug)]
pub(super) struct Table<T> {
    next: i64,
    rows: BTreeMap<i64, T>,
    slots: HashMap<String, i64>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next: 1,
            rows: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }
}

impl<T: Document> Table<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.slots.get(id).and_then(|seq| self.rows.get(seq))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn find(&self, matches: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| matches(row))
    }

    pub fn any(&self, matches: impl Fn(&T) -> bool) -> bool {
        self.rows.values().any(matches)
    }

    /// Whether any of `rows` repeats an id, either one already stored or one earlier in the batch.
    pub fn clashes(&self, rows: &[T]) -> bool {
        let mut batch = HashSet::with_capacity(rows.len());
        rows.iter()
            .any(|row| self.contains(row.key()) || !batch.insert(row.key()))
    }

    pub fn oldest_first(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.rows.values()
    }

    pub fn newest_first(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().rev().filter(|row| keep(row)).cloned().collect()
    }

    /// Journal writes appending `rows` after everything already stored.
    pub fn stage_inserts(&self, rows: &[T]) -> Result<Vec<Write>, RepositoryError> {
        rows.iter()
            .zip(self.next..)
            .map(|(row, seq)| Write::put(row, seq))
            .collect()
    }

    /// Journal write replacing a stored row in place.
    pub fn stage_replace(&self, row: &T) -> Result<Write, RepositoryError> {
        let seq = self
            .slots
            .get(row.key())
            .copied()
            .ok_or(RepositoryError::NotFound)?;
        Write::put(row, seq)
    }

    pub fn append(&mut self, row: T) {
        let seq = self.next;
        self.next += 1;
        self.slots.insert(row.key().to_string(), seq);
        self.rows.insert(seq, row);
    }

    /// Re-inserts a row read back from the journal under its original sequence number.
    pub fn restore(&mut self, seq: i64, row: T) {
        self.next = self.next.max(seq + 1);
        self.slots.insert(row.key().to_string(), seq);
        self.rows.insert(seq, row);
    }

    pub fn replace(&mut self, row: T) {
        if let Some(seq) = self.slots.get(row.key()) {
            self.rows.insert(*seq, row);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let seq = self.slots.remove(id)?;
        self.rows.remove(&seq)
    }

    /// Ids of every row matching the predicate, oldest first.
    pub fn keys_where(&self, matches: impl Fn(&T) -> bool) -> Vec<String> {
        self.rows
            .values()
            .filter(|row| matches(row))
            .map(|row| row.key().to_string())
            .collect()
    }
}
