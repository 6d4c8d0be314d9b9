//! adaptest-report — Renderers for saved attempt reports.
//!
//! Turns an `AttemptReport` into something an instructor can read: a
//! markdown summary or a self-contained HTML page.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::to_markdown;
