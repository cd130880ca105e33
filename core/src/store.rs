//! In-memory entity store.
//!
//! # Design
//! Items live in a `Vec` ordered by insertion (and so by identifier). Every
//! operation takes the lock exactly once, which makes identifier assignment
//! and each read or mutation atomic. The store enforces no uniqueness of its
//! own; validators check names before commands reach it.

use parking_lot::RwLock;

use crate::types::{ToDoId, ToDoItem};

const SAMPLE_ITEMS: [&str; 5] = [
    "Buy groceries",
    "Walk the dog",
    "Write the quarterly report",
    "Call the plumber",
    "Book flights",
];

#[derive(Debug, Default)]
pub struct ToDoStore {
    items: RwLock<Vec<ToDoItem>>,
}

impl ToDoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding five incomplete sample items with ids 1 through 5.
    pub fn with_sample_items() -> Self {
        let store = Self::new();
        for name in SAMPLE_ITEMS {
            store.add(name.to_string());
        }
        store
    }

    pub fn list(&self) -> Vec<ToDoItem> {
        self.items.read().clone()
    }

    pub fn find(&self, id: ToDoId) -> Option<ToDoItem> {
        self.items.read().iter().find(|item| item.id == id).cloned()
    }

    pub fn name_exists(&self, name: &str) -> bool {
        self.items.read().iter().any(|item| item.name == name)
    }

    /// Insert a new incomplete item and return its identifier: one past the
    /// current maximum, or 1 when the store is empty.
    pub fn add(&self, name: String) -> ToDoId {
        let mut items = self.items.write();
        let id = items.iter().map(|item| item.id).max().unwrap_or(0) + 1;
        items.push(ToDoItem {
            id,
            name,
            completed: false,
        });
        id
    }

    /// Apply `mutate` to the item in place. Returns the updated item, or
    /// `None` if no item has that identifier.
    pub fn update<F>(&self, id: ToDoId, mutate: F) -> Option<ToDoItem>
    where
        F: FnOnce(&mut ToDoItem),
    {
        let mut items = self.items.write();
        let item = items.iter_mut().find(|item| item.id == id)?;
        mutate(item);
        Some(item.clone())
    }

    pub fn remove(&self, id: ToDoId) -> Option<ToDoItem> {
        let mut items = self.items.write();
        let index = items.iter().position(|item| item.id == id)?;
        Some(items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}
