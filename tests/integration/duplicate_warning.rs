//! Duplicate plugin ids are dropped with a single warning.

use super::test_utils::{ids, plugin};
use cliweave::plugin::Resolver;
use cliweave::resolve_plugins;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_first_registration_wins_with_one_warning() {
    let first = plugin("a", &[]);
    let dependent = plugin("b", &["a"]);
    let duplicate = plugin("a", &[]);
    let input = vec![Arc::clone(&first), dependent, duplicate];

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let order = tracing::subscriber::with_default(subscriber, || resolve_plugins(&input)).unwrap();

    assert_eq!(ids(&order), vec!["a", "b"]);
    assert!(Arc::ptr_eq(&order[0], &first));

    let output = logs.contents();
    let warnings: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("WARN") && line.contains("Duplicate plugin id"))
        .collect();
    assert_eq!(warnings.len(), 1, "captured logs: {output}");
    assert!(warnings[0].contains("'a'"));
}

#[test]
fn test_resolver_reports_dropped_ids() {
    let input = vec![plugin("a", &[]), plugin("a", &[]), plugin("c", &[]), plugin("c", &[])];
    let resolver = Resolver::new(&input);

    let dropped: Vec<&str> = resolver.duplicates().iter().map(|id| id.as_str()).collect();
    assert_eq!(dropped, vec!["a", "c"]);
    assert_eq!(ids(&resolver.resolve().unwrap()), vec!["a", "c"]);
}
