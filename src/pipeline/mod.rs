//! Event ingestion pipeline.
//!
//! - `parse`: feed payload → records for one locality
//! - `nearby`: place text → nearby-place sentence
//! - `announce`: record → announcement text
//! - `novelty`: in-process "already acted on" check
//! - `run`: the whole chain, fetch to notify

pub mod announce;
pub mod nearby;
pub mod novelty;
pub mod parse;
pub mod run;

pub use announce::AnnouncementTemplate;
pub use nearby::{format_nearby, parse_nearby, render_nearby};
pub use novelty::{NoveltyState, NoveltyTracker};
pub use parse::{ParsedBatch, RecordParser, SkippedEntry};
pub use run::{Pipeline, RunOutcome, RunStatus};
