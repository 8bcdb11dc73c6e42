//! Renderer and command decorator chains composed through plugin setup

use super::test_utils::detached_context;
use cliweave::{
    build_surface, runner_fn, CommandDef, CommandRunner, Plugin, Renderers,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn wrapping_plugin(id: &str, deps: &[&str], open: &'static str, close: &'static str) -> Arc<Plugin> {
    let builder = deps
        .iter()
        .fold(Plugin::builder(id), |builder, dep| builder.depends_on(*dep));
    Arc::new(
        builder
            .setup(move |surface| {
                surface.decorate_header_renderer(move |base, ctx, failure| {
                    Box::pin(async move {
                        let inner = base.render(ctx, failure).await?;
                        Ok(format!("{open}{inner}{close}"))
                    })
                });
                Ok(())
            })
            .build(),
    )
}

fn recording_plugin(
    id: &str,
    deps: &[&str],
    calls: Arc<Mutex<Vec<String>>>,
    short_circuit: bool,
) -> Arc<Plugin> {
    let label = id.to_string();
    let builder = deps
        .iter()
        .fold(Plugin::builder(id), |builder, dep| builder.depends_on(*dep));
    Arc::new(
        builder
            .setup(move |surface| {
                let calls = Arc::clone(&calls);
                let label = label.clone();
                surface.decorate_command(move |base: Arc<dyn CommandRunner>| {
                    let calls = Arc::clone(&calls);
                    let label = label.clone();
                    runner_fn(move |ctx| {
                        let base = Arc::clone(&base);
                        let calls = Arc::clone(&calls);
                        let label = label.clone();
                        Box::pin(async move {
                            calls.lock().push(label.clone());
                            if short_circuit {
                                Ok(Some(format!("stopped by {label}")))
                            } else {
                                base.run(ctx).await
                            }
                        })
                    })
                });
                Ok(())
            })
            .build(),
    )
}

fn spy_command(calls: Arc<Mutex<Vec<String>>>) -> CommandDef {
    CommandDef::new("spy").run(move |_| {
        let calls = Arc::clone(&calls);
        Box::pin(async move {
            calls.lock().push("base".to_string());
            Ok(Some("base output".to_string()))
        })
    })
}

#[tokio::test]
async fn test_later_renderer_decorator_wraps_earlier() {
    let order = vec![
        wrapping_plugin("d1", &[], "(", ")"),
        wrapping_plugin("d2", &["d1"], "[", "]"),
    ];
    let compiled = build_surface(&order, Renderers::default()).await.unwrap();

    let rendered = compiled
        .renderers()
        .header
        .render(&detached_context(), None)
        .await
        .unwrap();
    assert_eq!(rendered, "[()]");
}

#[tokio::test]
async fn test_later_command_decorator_runs_first() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let order = vec![
        recording_plugin("c1", &[], Arc::clone(&calls), false),
        recording_plugin("c2", &["c1"], Arc::clone(&calls), false),
    ];
    let compiled = build_surface(&order, Renderers::default()).await.unwrap();

    let command = spy_command(Arc::clone(&calls));
    let output = compiled
        .command_runner(&command)
        .run(&detached_context())
        .await
        .unwrap();

    assert_eq!(output.as_deref(), Some("base output"));
    assert_eq!(*calls.lock(), vec!["c2", "c1", "base"]);
}

#[tokio::test]
async fn test_short_circuit_skips_inner_decorators_and_base() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let order = vec![
        recording_plugin("c1", &[], Arc::clone(&calls), false),
        recording_plugin("c2", &["c1"], Arc::clone(&calls), true),
    ];
    let compiled = build_surface(&order, Renderers::default()).await.unwrap();

    let command = spy_command(Arc::clone(&calls));
    let output = compiled
        .command_runner(&command)
        .run(&detached_context())
        .await
        .unwrap();

    assert_eq!(output.as_deref(), Some("stopped by c2"));
    assert_eq!(*calls.lock(), vec!["c2"]);
}

#[tokio::test]
async fn test_decorator_ignoring_base_drops_earlier_renderers() {
    let replace = Arc::new(
        Plugin::builder("replace")
            .depends_on("d1")
            .setup(|surface| {
                surface.decorate_header_renderer(|_base, _ctx, _failure| {
                    Box::pin(async { Ok("only mine".to_string()) })
                });
                Ok(())
            })
            .build(),
    );
    let order = vec![wrapping_plugin("d1", &[], "(", ")"), replace];
    let compiled = build_surface(&order, Renderers::default()).await.unwrap();

    let rendered = compiled
        .renderers()
        .header
        .render(&detached_context(), None)
        .await
        .unwrap();
    assert_eq!(rendered, "only mine");
}
