// src/pipeline/parse.rs

//! Feed payload parsing.
//!
//! Turns a GeoJSON-style feed (`features[].properties`, `features[].geometry`)
//! into typed [`EventRecord`]s for one locality. Each entry is validated on
//! its own: a malformed entry is skipped with a reason, and only a payload
//! where every entry is malformed fails as a whole.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{EventRecord, LocalityMatch};
use crate::utils::time::from_epoch_millis;

use super::announce::AnnouncementTemplate;
use super::nearby::parse_nearby;

#[derive(Debug, Deserialize)]
struct RawFeed {
    features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    properties: RawProperties,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    code: Option<String>,
    place: Option<String>,
    mag: Option<f64>,
    #[serde(rename = "magType")]
    mag_type: Option<String>,
    time: Option<f64>,
    tz: Option<i32>,
    url: Option<String>,
    detail: Option<String>,
    types: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    country: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    coordinates: Vec<f64>,
}

/// An entry that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the feed's `features` array
    pub index: usize,
    /// Event code, when it could be read
    pub code: Option<String>,
    pub reason: String,
}

/// Parse result with per-entry diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Records for the requested locality, in feed order
    pub records: Vec<EventRecord>,
    /// Malformed entries
    pub skipped: Vec<SkippedEntry>,
    /// Entries in the payload
    pub total: usize,
}

/// A validated entry, before locality filtering.
struct Entry {
    region: Option<String>,
    record: EventRecord,
}

/// Parser for raw feed payloads.
#[derive(Debug, Clone, Default)]
pub struct RecordParser {
    match_mode: LocalityMatch,
    template: AnnouncementTemplate,
}

impl RecordParser {
    pub fn new(match_mode: LocalityMatch, template: AnnouncementTemplate) -> Self {
        Self {
            match_mode,
            template,
        }
    }

    /// Parse raw feed text into records tagged with `locality`.
    pub fn parse(&self, raw: &str, locality: &str) -> Result<Vec<EventRecord>> {
        Ok(self.parse_batch(raw, locality)?.records)
    }

    /// Parse raw feed text, keeping diagnostics for skipped entries.
    pub fn parse_batch(&self, raw: &str, locality: &str) -> Result<ParsedBatch> {
        ensure_locality(locality)?;
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::parse(format!("feed is not valid JSON: {e}")))?;
        self.parse_value(&value, locality)
    }

    /// Parse an already-decoded feed payload.
    pub fn parse_value(&self, value: &Value, locality: &str) -> Result<ParsedBatch> {
        ensure_locality(locality)?;

        let feed = RawFeed::deserialize(value)
            .map_err(|e| AppError::parse(format!("feed has no features array: {e}")))?;

        let mut batch = ParsedBatch {
            total: feed.features.len(),
            ..ParsedBatch::default()
        };
        let mut entries = Vec::new();

        for (index, feature) in feed.features.iter().enumerate() {
            match parse_entry(feature) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    let code = feature
                        .pointer("/properties/code")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    log::warn!(
                        "Skipping feed entry {} ({}): {}",
                        index,
                        code.as_deref().unwrap_or("no code"),
                        reason
                    );
                    batch.skipped.push(SkippedEntry {
                        index,
                        code,
                        reason,
                    });
                }
            }
        }

        if batch.total > 0 && entries.is_empty() {
            return Err(AppError::parse(format!(
                "all {} feed entries are malformed; first: {}",
                batch.total, batch.skipped[0].reason
            )));
        }

        for Entry { region, mut record } in entries {
            if !self.matches(region.as_deref(), &record.place, locality) {
                continue;
            }
            record.country = locality.to_string();
            record.announcement_text = self.template.render(&record);
            batch.records.push(record);
        }

        log::debug!(
            "Parsed {} entries: {} for {}, {} skipped",
            batch.total,
            batch.records.len(),
            locality,
            batch.skipped.len()
        );
        Ok(batch)
    }

    /// Whether an entry belongs to the locality.
    fn matches(&self, region: Option<&str>, place: &str, locality: &str) -> bool {
        match self.match_mode {
            LocalityMatch::Contains => region.unwrap_or(place).contains(locality),
            LocalityMatch::Exact => {
                let region = region
                    .or_else(|| place.rsplit(',').next())
                    .unwrap_or(place)
                    .trim();
                region == locality
            }
        }
    }
}

fn ensure_locality(locality: &str) -> Result<()> {
    if locality.trim().is_empty() {
        return Err(AppError::NoLocality);
    }
    Ok(())
}

/// Validate one feature into a record with display fields still unset.
fn parse_entry(feature: &Value) -> std::result::Result<Entry, String> {
    let raw = RawFeature::deserialize(feature).map_err(|e| e.to_string())?;
    let props = raw.properties;

    let code = props
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or("missing code")?;
    let place = props.place.ok_or("missing place")?;
    let magnitude = props.mag.ok_or("missing mag")?;
    let millis = props.time.ok_or("missing time")?;
    let occurred_at_utc = from_epoch_millis(millis).map_err(|e| e.to_string())?;

    let coordinates = raw
        .geometry
        .map(|g| g.coordinates)
        .ok_or("missing geometry")?;
    let [longitude, latitude, depth] = coordinates[..] else {
        return Err(format!(
            "expected [longitude, latitude, depth], got {} coordinate(s)",
            coordinates.len()
        ));
    };

    let types = props
        .types
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let nearby_places = parse_nearby(&place);

    Ok(Entry {
        region: props.country.or(props.region),
        record: EventRecord {
            code,
            country: String::new(),
            place,
            latitude,
            longitude,
            depth,
            magnitude,
            magnitude_type: props.mag_type.unwrap_or_default(),
            event_type: props.kind.unwrap_or_else(|| "earthquake".to_string()),
            types,
            occurred_at_utc,
            timezone_offset_minutes: props.tz.unwrap_or(0),
            detail_url: props.detail.unwrap_or_default(),
            link_url: props.url.unwrap_or_default(),
            announcement_text: String::new(),
            nearby_places,
        },
    })
}
