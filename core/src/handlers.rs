//! Terminal pipeline stage: one handler per request type.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{Result, ToDoError};
use crate::requests::{
    CreateToDoItem, DeleteToDoItem, GetToDoItem, GetToDoItems, Request, UpdateToDoItem,
};
use crate::store::ToDoStore;
use crate::types::{Created, ToDoItemDto};

const ENTITY: &str = "ToDoItem";

/// Executes a request against the store and produces its response.
pub trait Handler<R: Request>: Send + Sync {
    fn handle<'a>(&'a self, request: &'a R) -> BoxFuture<'a, Result<R::Response>>;
}

#[derive(Debug, Clone)]
pub struct CreateToDoItemHandler {
    store: Arc<ToDoStore>,
}

impl CreateToDoItemHandler {
    pub fn new(store: Arc<ToDoStore>) -> Self {
        Self { store }
    }
}

impl Handler<CreateToDoItem> for CreateToDoItemHandler {
    fn handle<'a>(&'a self, request: &'a CreateToDoItem) -> BoxFuture<'a, Result<Created>> {
        let id = self.store.add(request.name.clone());
        futures::future::ready(Ok(Created { id })).boxed()
    }
}

#[derive(Debug, Clone)]
pub struct UpdateToDoItemHandler {
    store: Arc<ToDoStore>,
}

impl UpdateToDoItemHandler {
    pub fn new(store: Arc<ToDoStore>) -> Self {
        Self { store }
    }
}

impl Handler<UpdateToDoItem> for UpdateToDoItemHandler {
    fn handle<'a>(&'a self, request: &'a UpdateToDoItem) -> BoxFuture<'a, Result<()>> {
        let result = self
            .store
            .update(request.id, |item| {
                item.name = request.name.clone();
                item.completed = request.completed;
            })
            .map(|_| ())
            .ok_or(ToDoError::NotFound {
                entity: ENTITY,
                key: request.id,
            });
        futures::future::ready(result).boxed()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteToDoItemHandler {
    store: Arc<ToDoStore>,
}

impl DeleteToDoItemHandler {
    pub fn new(store: Arc<ToDoStore>) -> Self {
        Self { store }
    }
}

impl Handler<DeleteToDoItem> for DeleteToDoItemHandler {
    fn handle<'a>(&'a self, request: &'a DeleteToDoItem) -> BoxFuture<'a, Result<()>> {
        let result = self
            .store
            .remove(request.id)
            .map(|_| ())
            .ok_or(ToDoError::NotFound {
                entity: ENTITY,
                key: request.id,
            });
        futures::future::ready(result).boxed()
    }
}

#[derive(Debug, Clone)]
pub struct GetToDoItemHandler {
    store: Arc<ToDoStore>,
}

impl GetToDoItemHandler {
    pub fn new(store: Arc<ToDoStore>) -> Self {
        Self { store }
    }
}

impl Handler<GetToDoItem> for GetToDoItemHandler {
    fn handle<'a>(
        &'a self,
        request: &'a GetToDoItem,
    ) -> BoxFuture<'a, Result<Option<ToDoItemDto>>> {
        let item = self.store.find(request.id).as_ref().map(ToDoItemDto::from);
        futures::future::ready(Ok(item)).boxed()
    }
}

#[derive(Debug, Clone)]
pub struct GetToDoItemsHandler {
    store: Arc<ToDoStore>,
}

impl GetToDoItemsHandler {
    pub fn new(store: Arc<ToDoStore>) -> Self {
        Self { store }
    }
}

impl Handler<GetToDoItems> for GetToDoItemsHandler {
    fn handle<'a>(
        &'a self,
        _request: &'a GetToDoItems,
    ) -> BoxFuture<'a, Result<Vec<ToDoItemDto>>> {
        let items: Vec<ToDoItemDto> = self.store.list().iter().map(ToDoItemDto::from).collect();
        futures::future::ready(Ok(items)).boxed()
    }
}
