//! Mediator-dispatched commands and queries over an in-memory to-do list.
//!
//! # Overview
//! Every operation is a request value sent through a [`Mediator`]. The
//! mediator finds the request's [`Pipeline`] and runs it: a fixed chain of
//! cross-cutting stages (error translation, timing, logging, validation,
//! caching) around the handler that touches the [`ToDoStore`].
//!
//! # Design
//! - Requests are plain data; handlers own the store access.
//! - Stages are composed once per request type when the mediator is built.
//! - The store and the response cache are each behind a read/write lock, so
//!   a single mediator can be shared across concurrent callers.
//! - Nothing here knows about HTTP; the server crate maps [`ToDoError`] to
//!   status codes.

pub mod cache;
pub mod error;
pub mod handlers;
pub mod mediator;
pub mod pipeline;
pub mod requests;
pub mod store;
pub mod types;
pub mod validation;

pub use cache::ResponseCache;
pub use error::{Result, ToDoError};
pub use handlers::Handler;
pub use mediator::{Mediator, MediatorBuilder};
pub use pipeline::{Behavior, Next, Pipeline, PipelineConfig};
pub use requests::{
    CreateToDoItem, DeleteToDoItem, GetToDoItem, GetToDoItems, Request, UpdateToDoItem,
};
pub use store::ToDoStore;
pub use types::{Created, ToDoId, ToDoItem, ToDoItemDto};
pub use validation::{RuleKind, RuleSet, ValidationFailure, ValidationFailures};
