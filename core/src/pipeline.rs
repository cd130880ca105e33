//! Ordered chain of cross-cutting stages wrapped around each handler.
//!
//! # Design
//! A [`Pipeline`] owns the stages for one request type plus its handler.
//! Each stage receives the request and a [`Next`] continuation for the rest
//! of the chain; it may act before and after calling it, or return early
//! without calling it at all. The standard order is fixed:
//!
//! ```text
//! UnhandledError -> Performance -> Logging -> Validation -> Caching -> Handler
//! ```
//!
//! Validation runs before caching so invalid requests never populate the
//! cache or reach the store. Error translation is outermost so every stage's
//! failures are normalized at the boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::error::{Result, ToDoError};
use crate::handlers::Handler;
use crate::requests::Request;
use crate::validation::RuleSet;

pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Requests slower than this are logged at `warn`.
    pub slow_request_threshold: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold: DEFAULT_SLOW_REQUEST_THRESHOLD,
        }
    }
}

/// A stage wrapped around the rest of the chain.
pub trait Behavior<R: Request>: Send + Sync {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>>;
}

/// The remainder of a pipeline: zero or more stages, then the handler.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn Behavior<R>>],
    handler: &'a dyn Handler<R>,
}

impl<'a, R: Request> Next<'a, R> {
    pub fn run(self, request: &'a R) -> BoxFuture<'a, Result<R::Response>> {
        match self.behaviors.split_first() {
            Some((stage, rest)) => stage.handle(
                request,
                Next {
                    behaviors: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.handle(request),
        }
    }
}

pub struct Pipeline<R: Request> {
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn Handler<R>>,
}

impl<R: Request> Pipeline<R> {
    /// A pipeline running `behaviors` outermost-first around `handler`.
    pub fn new(handler: Arc<dyn Handler<R>>, behaviors: Vec<Arc<dyn Behavior<R>>>) -> Self {
        Self { behaviors, handler }
    }

    /// The standard stage order around `handler`.
    pub fn standard(
        handler: Arc<dyn Handler<R>>,
        rules: RuleSet<R>,
        cache: Arc<ResponseCache>,
        config: PipelineConfig,
    ) -> Self {
        let behaviors: Vec<Arc<dyn Behavior<R>>> = vec![
            Arc::new(UnhandledErrorBehavior),
            Arc::new(PerformanceBehavior::new(config.slow_request_threshold)),
            Arc::new(LoggingBehavior),
            Arc::new(ValidationBehavior::new(rules)),
            Arc::new(CachingBehavior::new(cache)),
        ];
        Self::new(handler, behaviors)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    pub fn run<'a>(&'a self, request: &'a R) -> BoxFuture<'a, Result<R::Response>> {
        Next {
            behaviors: &self.behaviors,
            handler: self.handler.as_ref(),
        }
        .run(request)
    }
}

/// Converts non-domain errors and panics into `Unhandled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnhandledErrorBehavior;

impl<R: Request> Behavior<R> for UnhandledErrorBehavior {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>> {
        Box::pin(async move {
            match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(error)) if error.is_domain() => Err(error),
                Ok(Err(error)) => {
                    tracing::error!(
                        request = R::NAME,
                        payload = ?request,
                        %error,
                        "unhandled error"
                    );
                    Err(ToDoError::Unhandled { request: R::NAME })
                }
                Err(panic) => {
                    tracing::error!(
                        request = R::NAME,
                        payload = ?request,
                        panic = panic_message(panic.as_ref()),
                        "request panicked"
                    );
                    Err(ToDoError::Unhandled { request: R::NAME })
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Warns when the inner chain takes longer than the threshold.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceBehavior {
    threshold: Duration,
}

impl PerformanceBehavior {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }
}

impl<R: Request> Behavior<R> for PerformanceBehavior {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = next.run(request).await;
            let elapsed = started.elapsed();
            if elapsed > self.threshold {
                tracing::warn!(
                    request = R::NAME,
                    payload = ?request,
                    elapsed_ms = elapsed.as_millis() as u64,
                    threshold_ms = self.threshold.as_millis() as u64,
                    "long running request"
                );
            }
            result
        })
    }
}

/// Records the request before and its outcome after the inner chain, in a
/// span tagged with a fresh request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl<R: Request> Behavior<R> for LoggingBehavior {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request", request = R::NAME, %request_id);
        Box::pin(
            async move {
                tracing::info!(payload = ?request, "handling request");
                let result = next.run(request).await;
                match &result {
                    Ok(response) => tracing::info!(response = ?response, "handled request"),
                    Err(error) => tracing::warn!(%error, "request failed"),
                }
                result
            }
            .instrument(span),
        )
    }
}

/// Runs the request's rule set and stops the chain on any failure.
#[derive(Debug)]
pub struct ValidationBehavior<R> {
    rules: RuleSet<R>,
}

impl<R> ValidationBehavior<R> {
    pub fn new(rules: RuleSet<R>) -> Self {
        Self { rules }
    }
}

impl<R: Request> Behavior<R> for ValidationBehavior<R> {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>> {
        Box::pin(async move {
            if !self.rules.is_empty() {
                self.rules
                    .validate(request)
                    .map_err(ToDoError::ValidationFailed)?;
            }
            next.run(request).await
        })
    }
}

/// Serves cacheable requests from the cache and drops keys that a
/// successful request invalidates.
#[derive(Debug, Clone)]
pub struct CachingBehavior {
    cache: Arc<ResponseCache>,
}

impl CachingBehavior {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

impl<R: Request> Behavior<R> for CachingBehavior {
    fn handle<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
    ) -> BoxFuture<'a, Result<R::Response>> {
        Box::pin(async move {
            let response = match request.cache_key() {
                Some(key) => {
                    if let Some(cached) = self.cache.get::<R::Response>(&key)? {
                        tracing::debug!(request = R::NAME, %key, "cache hit");
                        return Ok(cached);
                    }
                    tracing::debug!(request = R::NAME, %key, "cache miss");
                    let seen = self.cache.generation(&key);
                    let response = next.run(request).await?;
                    if !self.cache.insert_if_current(key.clone(), seen, response.clone()) {
                        tracing::debug!(request = R::NAME, %key, "skipped caching stale response");
                    }
                    response
                }
                None => next.run(request).await?,
            };
            for key in request.invalidates(&response) {
                if self.cache.remove(&key) {
                    tracing::debug!(request = R::NAME, %key, "invalidated cached response");
                }
            }
            Ok(response)
        })
    }
}
