//! Built-in plugins

pub mod globals;

pub use globals::{globals, GlobalsExtension, GLOBALS};
