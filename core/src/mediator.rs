//! Dispatch boundary: routes a request value to its pipeline.
//!
//! # Design
//! Pipelines are composed once, at build time, and stored keyed by the
//! request's `TypeId`. `send` looks the pipeline up, downcasts it back to
//! `Pipeline<R>` and runs it. A request type without a registered pipeline
//! fails with `NoHandlerFound`; in a correctly wired service this never
//! happens.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::error::{Result, ToDoError};
use crate::handlers::{
    CreateToDoItemHandler, DeleteToDoItemHandler, GetToDoItemHandler, GetToDoItemsHandler, Handler,
    UpdateToDoItemHandler,
};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::requests::{DeleteToDoItem, GetToDoItem, GetToDoItems, Request};
use crate::store::ToDoStore;
use crate::validation::{self, RuleSet};

type ErasedPipeline = Box<dyn Any + Send + Sync>;

pub struct Mediator {
    pipelines: HashMap<TypeId, ErasedPipeline>,
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("pipelines", &self.pipelines.len())
            .finish()
    }
}

impl Mediator {
    pub fn builder(cache: Arc<ResponseCache>, config: PipelineConfig) -> MediatorBuilder {
        MediatorBuilder {
            cache,
            config,
            pipelines: HashMap::new(),
        }
    }

    /// The to-do service: every request type wired to its store handler
    /// behind the standard pipeline.
    pub fn for_store(
        store: Arc<ToDoStore>,
        cache: Arc<ResponseCache>,
        config: PipelineConfig,
    ) -> Self {
        Self::builder(cache, config)
            .register(
                CreateToDoItemHandler::new(store.clone()),
                validation::create_rules(store.clone()),
            )
            .register(UpdateToDoItemHandler::new(store.clone()), validation::update_rules())
            .register(DeleteToDoItemHandler::new(store.clone()), RuleSet::<DeleteToDoItem>::new())
            .register(GetToDoItemHandler::new(store.clone()), RuleSet::<GetToDoItem>::new())
            .register(GetToDoItemsHandler::new(store), RuleSet::<GetToDoItems>::new())
            .build()
    }

    pub fn handles<R: Request>(&self) -> bool {
        self.pipelines.contains_key(&TypeId::of::<R>())
    }

    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response> {
        let pipeline = self
            .pipelines
            .get(&TypeId::of::<R>())
            .and_then(|pipeline| pipeline.downcast_ref::<Pipeline<R>>())
            .ok_or_else(|| {
                tracing::error!(request = R::NAME, "no handler registered");
                ToDoError::NoHandlerFound(R::NAME)
            })?;
        pipeline.run(&request).await
    }
}

pub struct MediatorBuilder {
    cache: Arc<ResponseCache>,
    config: PipelineConfig,
    pipelines: HashMap<TypeId, ErasedPipeline>,
}

impl MediatorBuilder {
    /// Register `handler` behind the standard pipeline. Registering a request
    /// type twice replaces the earlier pipeline.
    pub fn register<R, H>(self, handler: H, rules: RuleSet<R>) -> Self
    where
        R: Request,
        H: Handler<R> + 'static,
    {
        let handler: Arc<dyn Handler<R>> = Arc::new(handler);
        let pipeline = Pipeline::standard(handler, rules, self.cache.clone(), self.config);
        self.register_pipeline(pipeline)
    }

    /// Register a custom-composed pipeline.
    pub fn register_pipeline<R: Request>(mut self, pipeline: Pipeline<R>) -> Self {
        self.pipelines.insert(TypeId::of::<R>(), Box::new(pipeline));
        self
    }

    pub fn build(self) -> Mediator {
        Mediator {
            pipelines: self.pipelines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{CreateToDoItem, UpdateToDoItem};

    #[test]
    fn store_mediator_handles_every_request() {
        let mediator = Mediator::for_store(
            Arc::new(ToDoStore::new()),
            Arc::new(ResponseCache::new()),
            PipelineConfig::default(),
        );
        assert!(mediator.handles::<CreateToDoItem>());
        assert!(mediator.handles::<UpdateToDoItem>());
        assert!(mediator.handles::<DeleteToDoItem>());
        assert!(mediator.handles::<GetToDoItem>());
        assert!(mediator.handles::<GetToDoItems>());
    }

    #[tokio::test]
    async fn unregistered_request_has_no_handler() {
        let mediator =
            Mediator::builder(Arc::new(ResponseCache::new()), PipelineConfig::default()).build();
        let err = mediator.send(GetToDoItem { id: 1 }).await.unwrap_err();
        assert!(matches!(err, ToDoError::NoHandlerFound("GetToDoItem")));
    }
}
