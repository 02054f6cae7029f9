// src/pipeline/announce.rs

//! Announcement text rendering.

use std::sync::LazyLock;

use chrono::SecondsFormat;
use regex::{Captures, Regex};

use crate::models::{AnnouncementConfig, EventRecord};
use crate::utils::truncate_graphemes;

use super::nearby::format_nearby;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex"));

/// Template for announcement text.
///
/// Supported placeholders:
/// - `{magnitude}` (as reported), `{magnitude_type}`, `{depth}` (one decimal), `{code}`
/// - `{place}`, `{nearby}`, `{where}` (nearby text, or `en {place}` without one)
/// - `{local_time}` (`HH:MM` in the feed offset), `{utc_time}` (RFC 3339)
/// - `{link}`
///
/// Placeholders are substituted in one pass; text coming from the record is
/// never expanded again. Unknown placeholders are left as written.
#[derive(Debug, Clone)]
pub struct AnnouncementTemplate {
    template: String,
    max_length: usize,
}

impl AnnouncementTemplate {
    pub fn new(template: impl Into<String>, max_length: usize) -> Self {
        Self {
            template: template.into(),
            max_length,
        }
    }

    pub fn from_config(config: &AnnouncementConfig) -> Self {
        Self::new(config.template.clone(), config.max_length)
    }

    /// Render the announcement for a record, cut to the configured length.
    pub fn render(&self, record: &EventRecord) -> String {
        let nearby = format_nearby(record);
        let location = if nearby.is_empty() {
            format!("en {}", record.place)
        } else {
            nearby.clone()
        };

        let text = PLACEHOLDER_REGEX.replace_all(&self.template, |caps: &Captures<'_>| {
            match &caps[1] {
                "magnitude" => record.magnitude.to_string(),
                "magnitude_type" => record.magnitude_type.clone(),
                "depth" => format!("{:.1}", record.depth),
                "code" => record.code.clone(),
                "place" => record.place.clone(),
                "nearby" => nearby.clone(),
                "where" => location.clone(),
                "local_time" => record.local_time().format("%H:%M").to_string(),
                "utc_time" => record
                    .occurred_at_utc
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                "link" => record.link_url.clone(),
                _ => caps[0].to_string(),
            }
        });

        truncate_graphemes(&text, self.max_length)
    }
}

impl Default for AnnouncementTemplate {
    fn default() -> Self {
        Self::from_config(&AnnouncementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::nearby::parse_nearby;
    use chrono::{TimeZone, Utc};

    fn sample_record(place: &str) -> EventRecord {
        EventRecord {
            code: "c000tmn4".into(),
            country: "Philippines".into(),
            place: place.into(),
            latitude: 9.5166,
            longitude: 126.3037,
            depth: 84.37,
            magnitude: 4.8,
            magnitude_type: "mb".into(),
            event_type: "earthquake".into(),
            types: vec![],
            occurred_at_utc: Utc.with_ymd_and_hms(2015, 2, 6, 9, 39, 8).unwrap(),
            timezone_offset_minutes: 480,
            detail_url: String::new(),
            link_url: "http://earthquake.usgs.gov/earthquakes/eventpage/usc000tmn4".into(),
            announcement_text: String::new(),
            nearby_places: parse_nearby(place),
        }
    }

    #[test]
    fn test_default_template_with_nearby() {
        let record = sample_record("28km NNE of Cortes, Philippines");
        assert_eq!(
            AnnouncementTemplate::default().render(&record),
            "SISMO. 4.8 grados mb a 28 km al NNE de Cortes, Philippines. A horas 17:39 http://earthquake.usgs.gov/earthquakes/eventpage/usc000tmn4"
        );
    }

    #[test]
    fn test_default_template_without_nearby() {
        let record = sample_record("Mindanao, Philippines");
        let text = AnnouncementTemplate::default().render(&record);
        assert!(text.starts_with("SISMO. 4.8 grados mb en Mindanao, Philippines."));
    }

    #[test]
    fn test_custom_placeholders() {
        let template = AnnouncementTemplate::new("{code} M{magnitude} {depth}km {utc_time}", 280);
        let record = sample_record("Mindanao, Philippines");
        assert_eq!(
            template.render(&record),
            "c000tmn4 M4.8 84.4km 2015-02-06T09:39:08Z"
        );
    }

    #[test]
    fn test_render_respects_max_length() {
        let template = AnnouncementTemplate::new("SISMO {place}", 10);
        let text = template.render(&sample_record("Mindanao, Philippines"));
        assert_eq!(text, "SISMO Min…");
    }

    #[test]
    fn test_magnitude_printed_as_reported() {
        let mut record = sample_record("Mindanao, Philippines");
        record.magnitude = 4.35;
        let template = AnnouncementTemplate::new("M{magnitude}", 280);
        assert_eq!(template.render(&record), "M4.35");
    }

    #[test]
    fn test_record_text_is_not_expanded_again() {
        let mut record = sample_record("Isla {link}, Philippines");
        record.link_url = "http://example.com/{code}".into();
        let template = AnnouncementTemplate::new("{place} {link} {unknown}", 280);
        assert_eq!(
            template.render(&record),
            "Isla {link}, Philippines http://example.com/{code} {unknown}"
        );
    }
}
