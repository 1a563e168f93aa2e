#![warn(clippy::pedantic)]

pub mod analyzer;
pub mod error;
pub mod events;
pub mod graph;
pub mod scanner;
pub mod walker;

pub use error::ScanError;
pub use events::{CollectingSink, Event, EventSink, NullSink, UnsafeReason, Verdict};
pub use scanner::check;
pub use walker::GrammarWalker;
