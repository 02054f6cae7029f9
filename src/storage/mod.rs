//! Durable event history.
//!
//! One SQLite file holds one row per event code. Production and test mode
//! use different file names in the same base folder:
//!
//! ```text
//! {base_folder}/
//! ├── quakewatch.db         # Production history
//! └── quakewatch_test.db    # Test mode
//! ```

pub mod sqlite;

pub use sqlite::{EventStore, UpsertOutcome};

/// Production database file name.
pub const DB_FILE: &str = "quakewatch.db";

/// Test-mode database file name.
pub const TEST_DB_FILE: &str = "quakewatch_test.db";
