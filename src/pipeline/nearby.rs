// src/pipeline/nearby.rs

//! Nearby-place text.
//!
//! Feed place descriptions list one or more clauses such as
//! `"2 km al SW de Umuquena"` or `"2km SW of Umuquena"`, nearest first.
//! They are parsed into [`NearbyPlace`] tuples and rendered back as one
//! Spanish sentence fragment.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{EventRecord, NearbyPlace};

static CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<distance>\d+(?:\.\d+)?)\s*km\s+(?:al\s+)?(?P<bearing>[NSEW]{1,3})\s+(?:de|of)\s+(?P<name>.+)$",
    )
    .expect("nearby clause regex")
});

/// Parse a place description into nearby-place tuples, keeping source order.
///
/// Fragments that do not start a clause (a trailing country, for instance)
/// stay attached to the preceding clause's name. Text with no clause at all
/// yields an empty list.
pub fn parse_nearby(place: &str) -> Vec<NearbyPlace> {
    let mut places: Vec<NearbyPlace> = Vec::new();

    for fragment in place.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if let Some(caps) = CLAUSE_REGEX.captures(fragment) {
            let Ok(distance_km) = caps["distance"].parse::<f64>() else {
                continue;
            };
            places.push(NearbyPlace {
                name: caps["name"].trim().to_string(),
                distance_km,
                bearing: caps["bearing"].to_string(),
            });
        } else if let Some(last) = places.last_mut() {
            last.name.push_str(", ");
            last.name.push_str(fragment);
        }
    }

    places
}

/// Render one clause as `"a {N} km al {BEARING} de {NAME}"`.
fn render_clause(place: &NearbyPlace) -> String {
    format!(
        "a {} km al {} de {}",
        format_distance(place.distance_km),
        place.bearing,
        place.name
    )
}

fn format_distance(km: f64) -> String {
    if km.fract() == 0.0 {
        format!("{km:.0}")
    } else {
        km.to_string()
    }
}

/// Join rendered clauses: commas between, `", y "` before the last one.
pub fn render_nearby(places: &[NearbyPlace]) -> String {
    let clauses: Vec<String> = places.iter().map(render_clause).collect();
    match clauses.split_last() {
        None => String::new(),
        Some((only, [])) => only.clone(),
        Some((last, rest)) => format!("{}, y {}", rest.join(", "), last),
    }
}

/// Human-readable proximity text for a record.
///
/// Uses the record's parsed places, or parses its place text when none
/// were attached. Returns an empty string when nothing is extractable.
pub fn format_nearby(record: &EventRecord) -> String {
    if record.nearby_places.is_empty() {
        render_nearby(&parse_nearby(&record.place))
    } else {
        render_nearby(&record.nearby_places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const UMUQUENA: &str = "2 km al SW de Umuquena, 18 km al E de La Fria, 31 km al NE de San Juan de Colon, 38 km al ESE de Puerto Santander, Colombia";

    fn record_with_place(place: &str) -> EventRecord {
        EventRecord {
            code: "test".into(),
            country: "Venezuela".into(),
            place: place.into(),
            latitude: 0.0,
            longitude: 0.0,
            depth: 0.0,
            magnitude: 0.0,
            magnitude_type: "ml".into(),
            event_type: "earthquake".into(),
            types: vec![],
            occurred_at_utc: Utc::now(),
            timezone_offset_minutes: 0,
            detail_url: String::new(),
            link_url: String::new(),
            announcement_text: String::new(),
            nearby_places: vec![],
        }
    }

    #[test]
    fn test_format_four_clauses() {
        let record = record_with_place(UMUQUENA);
        assert_eq!(
            format_nearby(&record),
            "a 2 km al SW de Umuquena, a 18 km al E de La Fria, a 31 km al NE de San Juan de Colon, y a 38 km al ESE de Puerto Santander, Colombia"
        );
    }

    #[test]
    fn test_parse_keeps_order_and_trailing_qualifier() {
        let places = parse_nearby(UMUQUENA);
        assert_eq!(places.len(), 4);
        assert_eq!(places[0].name, "Umuquena");
        assert_eq!(places[0].bearing, "SW");
        assert_eq!(places[0].distance_km, 2.0);
        assert_eq!(places[3].name, "Puerto Santander, Colombia");
        assert_eq!(places[3].bearing, "ESE");
        assert_eq!(places[3].distance_km, 38.0);
    }

    #[test]
    fn test_single_clause_has_no_connector() {
        let record = record_with_place("2 km al SW de Umuquena");
        assert_eq!(format_nearby(&record), "a 2 km al SW de Umuquena");
    }

    #[test]
    fn test_two_clauses() {
        let record = record_with_place("5 km al N de Caracas, 12 km al S de Guarenas");
        assert_eq!(
            format_nearby(&record),
            "a 5 km al N de Caracas, y a 12 km al S de Guarenas"
        );
    }

    #[test]
    fn test_english_feed_form_is_localized() {
        let record = record_with_place("28km NNE of Cortes, Philippines");
        assert_eq!(
            format_nearby(&record),
            "a 28 km al NNE de Cortes, Philippines"
        );
    }

    #[test]
    fn test_decimal_distance() {
        let places = parse_nearby("2.5 km al W de Mene Grande");
        assert_eq!(render_nearby(&places), "a 2.5 km al W de Mene Grande");
    }

    #[test]
    fn test_no_clause_is_empty_string() {
        assert_eq!(format_nearby(&record_with_place("Venezuela")), "");
        assert_eq!(format_nearby(&record_with_place("")), "");
        assert_eq!(
            format_nearby(&record_with_place("off the coast of Sucre, Venezuela")),
            ""
        );
    }

    #[test]
    fn test_prefers_attached_places() {
        let mut record = record_with_place("Venezuela");
        record.nearby_places = parse_nearby("7 km al E de Merida");
        assert_eq!(format_nearby(&record), "a 7 km al E de Merida");
    }
}
