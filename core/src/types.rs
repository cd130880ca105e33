//! Domain entity and its read projection.

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a to-do item. Always positive.
pub type ToDoId = u64;

/// A single to-do record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoItem {
    pub id: ToDoId,
    pub name: String,
    pub completed: bool,
}

/// Read projection returned by queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToDoItemDto {
    pub id: ToDoId,
    pub name: String,
    pub completed: bool,
}

impl From<&ToDoItem> for ToDoItemDto {
    fn from(item: &ToDoItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            completed: item.completed,
        }
    }
}

/// Acknowledgment returned by the create command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: ToDoId,
}
