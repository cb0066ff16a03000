//! Top-level views.

pub mod console_view;

pub use console_view::ConsolePage;
