//! Command runners and the command-kind decorator chain.
//!
//! A command decorator receives the runner it wraps and returns a new runner. It
//! may call the wrapped runner, transform its outcome, or never call it at all
//! (short-circuit), which stops every inner decorator and the command body.

use crate::context::CommandContext;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Runs a command against a frozen context. `Some(text)` is destined for the terminal.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<Option<String>>;
}

/// Wraps a runner in another runner
pub trait CommandDecorator: Send + Sync {
    fn decorate(&self, base: Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner>;
}

impl<F> CommandDecorator for F
where
    F: Fn(Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner> + Send + Sync,
{
    fn decorate(&self, base: Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner> {
        self(base)
    }
}

struct FnRunner<F>(F);

#[async_trait]
impl<F> CommandRunner for FnRunner<F>
where
    F: for<'a> Fn(&'a CommandContext) -> BoxFuture<'a, anyhow::Result<Option<String>>>
        + Send
        + Sync,
{
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<Option<String>> {
        (self.0)(ctx).await
    }
}

/// Build a runner from an async closure
pub fn runner_fn<F>(body: F) -> Arc<dyn CommandRunner>
where
    F: for<'a> Fn(&'a CommandContext) -> BoxFuture<'a, anyhow::Result<Option<String>>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnRunner(body))
}

/// Compile a command decorator chain.
///
/// `decorators` is ordered outermost-first. The fold runs right-to-left: the last
/// element wraps `base` first and the first element ends up outermost, so it is
/// the first to execute.
pub fn compile_command(
    base: Arc<dyn CommandRunner>,
    decorators: &[Arc<dyn CommandDecorator>],
) -> Arc<dyn CommandRunner> {
    decorators
        .iter()
        .rev()
        .fold(base, |runner, decorator| decorator.decorate(runner))
}
