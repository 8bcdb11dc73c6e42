//! Renderers and the renderer-kind decorator chain.
//!
//! Header, usage and validation-error output are produced by renderers. The core
//! never formats anything itself: the innermost renderer is a host-supplied default
//! (empty unless provided) and plugins layer decorators over it.

use crate::context::CommandContext;
use crate::parser::ValidationFailure;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Produces text for a context. `failure` is set only for validation-error rendering.
#[async_trait]
pub trait Render: Send + Sync {
    async fn render(
        &self,
        ctx: &CommandContext,
        failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String>;
}

/// Receives the renderer it wraps and decides whether and when to call it.
#[async_trait]
pub trait RenderDecorator: Send + Sync {
    async fn decorate(
        &self,
        base: &dyn Render,
        ctx: &CommandContext,
        failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String>;
}

/// Renders nothing; signals "nothing to render"
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRenderer;

#[async_trait]
impl Render for EmptyRenderer {
    async fn render(
        &self,
        _ctx: &CommandContext,
        _failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

struct FnRender<F>(F);

#[async_trait]
impl<F> Render for FnRender<F>
where
    F: for<'a> Fn(&'a CommandContext, Option<&'a ValidationFailure>) -> BoxFuture<'a, anyhow::Result<String>>
        + Send
        + Sync,
{
    async fn render(
        &self,
        ctx: &CommandContext,
        failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String> {
        (self.0)(ctx, failure).await
    }
}

/// Build a renderer from an async closure
pub fn render_fn<F>(render: F) -> Arc<dyn Render>
where
    F: for<'a> Fn(&'a CommandContext, Option<&'a ValidationFailure>) -> BoxFuture<'a, anyhow::Result<String>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnRender(render))
}

struct FnRenderDecorator<F>(F);

#[async_trait]
impl<F> RenderDecorator for FnRenderDecorator<F>
where
    F: for<'a> Fn(
            &'a dyn Render,
            &'a CommandContext,
            Option<&'a ValidationFailure>,
        ) -> BoxFuture<'a, anyhow::Result<String>>
        + Send
        + Sync,
{
    async fn decorate(
        &self,
        base: &dyn Render,
        ctx: &CommandContext,
        failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String> {
        (self.0)(base, ctx, failure).await
    }
}

/// Build a renderer decorator from an async closure
pub fn render_decorator<F>(decorator: F) -> Arc<dyn RenderDecorator>
where
    F: for<'a> Fn(
            &'a dyn Render,
            &'a CommandContext,
            Option<&'a ValidationFailure>,
        ) -> BoxFuture<'a, anyhow::Result<String>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnRenderDecorator(decorator))
}

struct Decorated {
    decorator: Arc<dyn RenderDecorator>,
    base: Arc<dyn Render>,
}

#[async_trait]
impl Render for Decorated {
    async fn render(
        &self,
        ctx: &CommandContext,
        failure: Option<&ValidationFailure>,
    ) -> anyhow::Result<String> {
        self.decorator
            .decorate(self.base.as_ref(), ctx, failure)
            .await
    }
}

/// Compile a renderer decorator chain.
///
/// Folds left-to-right in registration order: each decorator wraps everything
/// registered before it, so the last-registered decorator runs first.
pub fn compile_renderer(
    default: Arc<dyn Render>,
    decorators: &[Arc<dyn RenderDecorator>],
) -> Arc<dyn Render> {
    decorators.iter().fold(default, |base, decorator| {
        Arc::new(Decorated {
            decorator: Arc::clone(decorator),
            base,
        })
    })
}

/// The three renderers a command context can use
#[derive(Clone)]
pub struct Renderers {
    pub header: Arc<dyn Render>,
    pub usage: Arc<dyn Render>,
    pub validation: Arc<dyn Render>,
}

impl Default for Renderers {
    fn default() -> Self {
        Self {
            header: Arc::new(EmptyRenderer),
            usage: Arc::new(EmptyRenderer),
            validation: Arc::new(EmptyRenderer),
        }
    }
}

impl fmt::Debug for Renderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderers").finish_non_exhaustive()
    }
}
