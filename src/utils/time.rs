// src/utils/time.rs

//! Feed timestamp conversion.
//!
//! Feed times are epoch milliseconds and therefore already UTC. Some feeds
//! carry fractional milliseconds, so conversion goes through microseconds.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

/// Convert epoch microseconds to a UTC datetime.
pub fn from_epoch_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| AppError::parse(format!("timestamp {micros}us out of range")))
}

/// Convert (possibly fractional) epoch milliseconds to a UTC datetime.
pub fn from_epoch_millis(millis: f64) -> Result<DateTime<Utc>> {
    if !millis.is_finite() {
        return Err(AppError::parse(format!("timestamp {millis} is not finite")));
    }
    let micros = (millis * 1000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return Err(AppError::parse(format!("timestamp {millis}ms out of range")));
    }
    from_epoch_micros(micros as i64)
}
