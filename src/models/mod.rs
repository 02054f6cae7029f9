// src/models/mod.rs

//! Domain models for the quake watcher.

mod config;
mod event;

// Re-export all public types
pub use config::{
    AnnouncementConfig, Config, FeedConfig, FilterConfig, LocalityMatch, NotifierConfig,
    NotifierKind, StorageConfig,
};
pub use event::{EventRecord, NearbyPlace};
