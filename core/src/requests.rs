//! Commands and queries understood by the mediator.
//!
//! # Design
//! Each operation is one plain value type implementing [`Request`], which
//! fixes its response type and a stable name used in logs and cache keys.
//! Queries opt into caching by returning a key from `cache_key`; commands
//! list the cached keys their success makes stale in `invalidates`.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::types::{Created, ToDoId, ToDoItemDto};

const GET_ITEM_KEY: &str = "get-todo-item";
const GET_ITEMS_KEY: &str = "get-todo-items";

/// A request dispatched through the mediator.
pub trait Request: Debug + Send + Sync + 'static {
    type Response: Debug + Clone + Send + Sync + 'static;

    /// Stable name for logs, spans and error reports.
    const NAME: &'static str;

    /// Cache key for cacheable requests. `None` disables caching.
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// Cache keys made stale by a successful completion of this request.
    fn invalidates(&self, _response: &Self::Response) -> Vec<String> {
        Vec::new()
    }
}

pub fn item_cache_key(id: ToDoId) -> String {
    format!("{GET_ITEM_KEY}:{id}")
}

pub fn items_cache_key() -> String {
    GET_ITEMS_KEY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateToDoItem {
    #[serde(default)]
    pub name: String,
}

impl Request for CreateToDoItem {
    type Response = Created;
    const NAME: &'static str = "CreateToDoItem";

    fn invalidates(&self, response: &Created) -> Vec<String> {
        vec![items_cache_key(), item_cache_key(response.id)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateToDoItem {
    pub id: ToDoId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl Request for UpdateToDoItem {
    type Response = ();
    const NAME: &'static str = "UpdateToDoItem";

    fn invalidates(&self, _response: &()) -> Vec<String> {
        vec![items_cache_key(), item_cache_key(self.id)]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteToDoItem {
    pub id: ToDoId,
}

impl Request for DeleteToDoItem {
    type Response = ();
    const NAME: &'static str = "DeleteToDoItem";

    fn invalidates(&self, _response: &()) -> Vec<String> {
        vec![items_cache_key(), item_cache_key(self.id)]
    }
}

/// Fetch one item. A missing id yields `None`, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetToDoItem {
    pub id: ToDoId,
}

impl Request for GetToDoItem {
    type Response = Option<ToDoItemDto>;
    const NAME: &'static str = "GetToDoItem";

    fn cache_key(&self) -> Option<String> {
        Some(item_cache_key(self.id))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetToDoItems;

impl Request for GetToDoItems {
    type Response = Vec<ToDoItemDto>;
    const NAME: &'static str = "GetToDoItems";

    fn cache_key(&self) -> Option<String> {
        Some(items_cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_are_cacheable_and_commands_are_not() {
        assert_eq!(GetToDoItem { id: 4 }.cache_key().as_deref(), Some("get-todo-item:4"));
        assert_eq!(GetToDoItems.cache_key().as_deref(), Some("get-todo-items"));
        assert!(CreateToDoItem { name: "x".to_string() }.cache_key().is_none());
        assert!(DeleteToDoItem { id: 1 }.cache_key().is_none());
    }

    #[test]
    fn create_invalidates_the_new_item_and_the_list() {
        let keys = CreateToDoItem { name: "x".to_string() }.invalidates(&Created { id: 6 });
        assert_eq!(keys, vec!["get-todo-items".to_string(), "get-todo-item:6".to_string()]);
    }

    #[test]
    fn update_invalidates_its_target() {
        let request = UpdateToDoItem {
            id: 2,
            name: "x".to_string(),
            completed: true,
        };
        assert!(request.invalidates(&()).contains(&"get-todo-item:2".to_string()));
    }

    #[test]
    fn create_treats_missing_name_as_empty() {
        let request: CreateToDoItem = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_empty());
    }

    #[test]
    fn update_defaults_completed_to_false() {
        let request: UpdateToDoItem = serde_json::from_str(r#"{"id":1,"name":"A"}"#).unwrap();
        assert!(!request.completed);
    }

    #[test]
    fn update_rejects_missing_id() {
        let result: Result<UpdateToDoItem, _> = serde_json::from_str(r#"{"name":"A"}"#);
        assert!(result.is_err());
    }
}
