//! Seismic event record.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// One named place near an epicenter, as described by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyPlace {
    /// Place name, including any trailing qualifier such as a country
    pub name: String,

    /// Distance from the epicenter in kilometers
    pub distance_km: f64,

    /// Compass bearing abbreviation from the place to the epicenter (e.g. `SW`)
    pub bearing: String,
}

/// A seismic event parsed from the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Stable feed identifier; unique across the store
    pub code: String,

    /// Locality the record was selected for
    pub country: String,

    /// Free-text place description
    pub place: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Depth in kilometers
    pub depth: f64,

    pub magnitude: f64,

    /// Magnitude scale code (`mb`, `ml`, `mww`, ...)
    pub magnitude_type: String,

    /// Event kind reported by the feed (`earthquake`, `quarry blast`, ...)
    pub event_type: String,

    /// Product types attached to the event
    #[serde(default)]
    pub types: Vec<String>,

    /// Origin time, always UTC
    pub occurred_at_utc: DateTime<Utc>,

    /// Source local-time offset; display only
    pub timezone_offset_minutes: i32,

    /// Machine-readable detail document
    pub detail_url: String,

    /// Human-facing event page
    pub link_url: String,

    /// Pre-rendered announcement
    pub announcement_text: String,

    /// Places near the epicenter in ascending distance
    #[serde(default)]
    pub nearby_places: Vec<NearbyPlace>,
}

impl EventRecord {
    /// Origin time in the feed's local offset.
    ///
    /// Falls back to UTC when the offset is outside the valid range.
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.timezone_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        self.occurred_at_utc.with_timezone(&offset)
    }
}
