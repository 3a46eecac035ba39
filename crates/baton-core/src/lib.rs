//! baton core - turns agent event streams into a live terminal progress view.
//!
//! Events from different agent backends are classified into short activity
//! phrases ([`activity`]) and item summaries ([`summary`]), then rendered by a
//! [`ProgressPrinter`] as a refreshing status line plus a permanent log of items.

pub mod activity;
pub mod event;
pub mod payload;
pub mod printer;
pub mod render;
pub mod sink;
pub mod summary;

pub use activity::extract_activity;
pub use event::{Event, EventKind, RunStatus};
pub use printer::{PrinterOptions, ProgressPrinter};
pub use sink::{ConsoleSink, MemorySink, NullSink, TerminalSink};
pub use summary::{summarize_item, summarize_item_with_width, summarize_tool_use, ItemKind};
