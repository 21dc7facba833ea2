// crates/frameflow-core/src/middleware/mod.rs
// ============================================================================
// Module: Middleware Composition Engine
// Description: Async chain-of-responsibility executor for frame requests.
// Purpose: Compose middlewares sequentially or as concurrent branches.
// Dependencies: async-trait, tokio
// ============================================================================

//! ## Overview
//! A [`Middleware`] receives the current [`FrameContext`] and a [`Next`]
//! continuation. Calling [`Next::run`] with a [`ContextPatch`] applies the
//! patch and invokes the remainder of the chain; not calling it
//! short-circuits. Earlier middlewares wrap later ones and may transform the
//! eventual [`FrameResult`].
//!
//! [`concurrent_middleware`] runs branches in parallel over the same context.
//! A branch's continuation only records the patch it wanted to contribute;
//! once every branch settles the patches merge in declaration order and the
//! real continuation runs exactly once. Any branch failure fails the whole
//! combinator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::core::context::ContextPatch;
use crate::core::context::FrameContext;
use crate::core::error::FrameError;
use crate::core::frame::FrameResult;

pub mod openframes;
pub mod pressed_button;
pub mod render;
pub mod state;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Boxed, sendable future used by chain continuations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared middleware handle.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// Result of a middleware invocation.
pub type MiddlewareResult = Result<FrameResult, FrameError>;

/// Composable unit of the request pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles the request, optionally delegating to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when the request cannot be handled.
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult;
}

/// Errors raised at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// No middleware was supplied to a sequential composition.
    #[error("at least one middleware is required")]
    Empty,
    /// No branch was supplied to a concurrent composition.
    #[error("at least one concurrent branch is required")]
    NoBranches,
}

// ============================================================================
// SECTION: Continuation
// ============================================================================

/// Continuation handed to a middleware.
pub struct Next<'a> {
    /// Continuation variant.
    inner: NextInner<'a>,
}

/// Continuation variants.
enum NextInner<'a> {
    /// End of the chain; reaching it means no middleware produced a result.
    Terminal,
    /// Remaining middlewares followed by an enclosing continuation.
    Chain {
        /// Middlewares not yet invoked.
        rest: &'a [SharedMiddleware],
        /// Continuation invoked once `rest` is exhausted.
        outer: Box<Next<'a>>,
    },
    /// Concurrent-branch continuation recording the contributed patch.
    Capture(Arc<Mutex<Option<ContextPatch>>>),
}

impl<'a> Next<'a> {
    /// Returns the terminal continuation.
    #[must_use]
    pub const fn terminal() -> Self {
        Self {
            inner: NextInner::Terminal,
        }
    }

    /// Returns a continuation running `rest` and then `outer`.
    #[must_use]
    pub fn chain(rest: &'a [SharedMiddleware], outer: Self) -> Self {
        Self {
            inner: NextInner::Chain {
                rest,
                outer: Box::new(outer),
            },
        }
    }

    /// Returns a continuation that records its patch instead of advancing.
    fn capture(slot: Arc<Mutex<Option<ContextPatch>>>) -> Self {
        Self {
            inner: NextInner::Capture(slot),
        }
    }

    /// Applies `patch` to `ctx` and advances the chain.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] from downstream middlewares, or an internal error
    /// when the chain ends without producing a result.
    pub fn run(self, ctx: FrameContext, patch: ContextPatch) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            match self.inner {
                NextInner::Terminal => {
                    Err(FrameError::internal("middleware chain ended without a result"))
                }
                NextInner::Chain {
                    rest,
                    outer,
                } => match rest.split_first() {
                    None => outer.run(ctx, patch).await,
                    Some((head, tail)) => {
                        head.handle(ctx.apply(patch), Next::chain(tail, *outer)).await
                    }
                },
                NextInner::Capture(slot) => {
                    let mut guard = slot
                        .lock()
                        .map_err(|_| FrameError::internal("concurrent patch slot poisoned"))?;
                    let merged = guard.take().unwrap_or_default().merge(patch);
                    *guard = Some(merged);
                    Ok(FrameResult::Deferred)
                }
            }
        })
    }
}

// ============================================================================
// SECTION: Sequential Composition
// ============================================================================

/// Middleware running a fixed list in order.
struct ComposedMiddleware {
    /// Middlewares in invocation order.
    list: Vec<SharedMiddleware>,
}

#[async_trait]
impl Middleware for ComposedMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        Next::chain(&self.list, next).run(ctx, ContextPatch::new()).await
    }
}

/// Folds a list of middlewares into one.
///
/// A single middleware is returned as-is.
///
/// # Errors
///
/// Returns [`ComposeError::Empty`] when the list is empty.
pub fn compose_middleware(list: Vec<SharedMiddleware>) -> Result<SharedMiddleware, ComposeError> {
    match list.len() {
        0 => Err(ComposeError::Empty),
        1 => list.into_iter().next().ok_or(ComposeError::Empty),
        _ => Ok(Arc::new(ComposedMiddleware {
            list,
        })),
    }
}

/// Runs a middleware chain to completion with a terminal continuation.
///
/// # Errors
///
/// Returns [`FrameError`] from the chain.
pub async fn run_middleware(middleware: &SharedMiddleware, ctx: FrameContext) -> MiddlewareResult {
    middleware.handle(ctx, Next::terminal()).await
}

// ============================================================================
// SECTION: Concurrent Composition
// ============================================================================

/// Middleware running independent branches in parallel.
struct ConcurrentMiddleware {
    /// Branches in declaration order.
    branches: Vec<SharedMiddleware>,
}

#[async_trait]
impl Middleware for ConcurrentMiddleware {
    async fn handle(&self, ctx: FrameContext, next: Next<'_>) -> MiddlewareResult {
        let mut tasks = JoinSet::new();
        for (position, branch) in self.branches.iter().enumerate() {
            let branch = Arc::clone(branch);
            let branch_ctx = ctx.clone();
            tasks.spawn(async move {
                let slot = Arc::new(Mutex::new(None));
                branch.handle(branch_ctx, Next::capture(Arc::clone(&slot))).await?;
                let patch = slot
                    .lock()
                    .map_err(|_| FrameError::internal("concurrent patch slot poisoned"))?
                    .take()
                    .unwrap_or_default();
                Ok::<_, FrameError>((position, patch))
            });
        }
        let mut patches: Vec<Option<ContextPatch>> = vec![None; self.branches.len()];
        while let Some(joined) = tasks.join_next().await {
            let (position, patch) = joined.map_err(|err| {
                FrameError::internal(format!("concurrent branch did not complete: {err}"))
            })??;
            if let Some(entry) = patches.get_mut(position) {
                *entry = Some(patch);
            }
        }
        let merged = patches.into_iter().flatten().fold(ContextPatch::new(), ContextPatch::merge);
        next.run(ctx, merged).await
    }
}

/// Builds a middleware that runs `branches` concurrently and merges their
/// contributions in declaration order.
///
/// # Errors
///
/// Returns [`ComposeError::NoBranches`] when no branch is supplied.
pub fn concurrent_middleware(
    branches: Vec<SharedMiddleware>,
) -> Result<SharedMiddleware, ComposeError> {
    if branches.is_empty() {
        return Err(ComposeError::NoBranches);
    }
    Ok(Arc::new(ConcurrentMiddleware {
        branches,
    }))
}

// ============================================================================
// SECTION: Handler Adapter
// ============================================================================

/// Terminal middleware wrapping an application handler.
pub struct HandlerMiddleware<F> {
    /// Application handler.
    handler: F,
}

impl<F> HandlerMiddleware<F> {
    /// Wraps a handler.
    #[must_use]
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
        }
    }
}

#[async_trait]
impl<F, Fut> Middleware for HandlerMiddleware<F>
where
    F: Fn(FrameContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    async fn handle(&self, ctx: FrameContext, _next: Next<'_>) -> MiddlewareResult {
        (self.handler)(ctx).await
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
