// src/services/mod.rs

//! External collaborators: feed retrieval and announcement sinks.

mod feed;
mod notifier;

pub use feed::FeedClient;
pub use notifier::{LogNotifier, Notifier, WebhookNotifier, build_notifier};
