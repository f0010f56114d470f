//! Duration and date/time leaf decoders.

use std::any::Any;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ValidationError;
use crate::node::ConfigNode;
use crate::reflect::TypeInfo;
use crate::validated::Validated;

use super::leaf::require_leaf_value;
use super::{Decoder, DecoderContext};

/// Parse the time section of an ISO-8601 duration (`nH`, `nM`, `n[.n]S`,
/// in that order), returning the total in seconds.
fn parse_time_section(section: &str) -> Option<f64> {
    let mut seconds = 0.0;
    let mut buffer = String::new();
    let mut next_units: &[(char, f64)] = &[('H', 3600.0), ('M', 60.0), ('S', 1.0)];
    for c in section.chars() {
        if c.is_ascii_digit() || c == '.' {
            buffer.push(c);
        } else {
            let position = next_units.iter().position(|(unit, _)| *unit == c)?;
            let amount: f64 = buffer.parse().ok()?;
            seconds += amount * next_units[position].1;
            buffer.clear();
            next_units = &next_units[position + 1..];
        }
    }
    if !buffer.is_empty() {
        return None;
    }
    Some(seconds)
}

/// Parse an ISO-8601 duration of the form `PnDTnHnMn.nS`.
///
/// Mirrors the subset accepted for configuration values: days, hours,
/// minutes, and fractional seconds; no years, months, or negatives.
fn parse_iso_duration(text: &str) -> Option<Duration> {
    let upper = text.trim().to_ascii_uppercase();
    let body = upper.strip_prefix('P')?;
    if body.is_empty() {
        return None;
    }
    let (date_section, time_section) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut seconds = 0.0;
    if !date_section.is_empty() {
        let days: f64 = date_section.strip_suffix('D')?.parse().ok()?;
        seconds += days * 86_400.0;
    }
    if let Some(section) = time_section {
        if section.is_empty() {
            return None;
        }
        seconds += parse_time_section(section)?;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Decodes a duration: a plain integer is milliseconds, anything else
/// must be an ISO-8601 duration.
pub struct DurationDecoder;

impl Decoder for DurationDecoder {
    fn name(&self) -> &'static str {
        "Duration"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<Duration>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        let trimmed = value.trim();
        let parsed = if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            trimmed.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            parse_iso_duration(trimmed)
        };
        match parsed {
            Some(duration) => Validated::valid(Box::new(duration)),
            None => Validated::invalid(ValidationError::DecodingNumberParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}

/// Decodes a `NaiveDate` using the configured `local_date_format`.
pub struct DateDecoder;

impl Decoder for DateDecoder {
    fn name(&self) -> &'static str {
        "Date"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<NaiveDate>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        match NaiveDate::parse_from_str(value.trim(), &ctx.config.local_date_format) {
            Ok(date) => Validated::valid(Box::new(date)),
            Err(_) => Validated::invalid(ValidationError::DecodingValueParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}

/// Decodes a `NaiveDateTime` using the configured `local_date_time_format`.
pub struct LocalDateTimeDecoder;

impl Decoder for LocalDateTimeDecoder {
    fn name(&self) -> &'static str {
        "LocalDateTime"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<NaiveDateTime>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        match NaiveDateTime::parse_from_str(value.trim(), &ctx.config.local_date_time_format) {
            Ok(date_time) => Validated::valid(Box::new(date_time)),
            Err(_) => Validated::invalid(ValidationError::DecodingValueParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}

/// Decodes a `DateTime<Utc>`: RFC 3339 by default, or the configured
/// `date_decoder_format`.
pub struct DateTimeDecoder;

impl DateTimeDecoder {
    fn parse(value: &str, format: Option<&str>) -> Option<DateTime<Utc>> {
        match format {
            None => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Some(format) => DateTime::parse_from_str(value, format)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|| {
                    // Formats without an offset parse as naive and are
                    // taken to be UTC.
                    NaiveDateTime::parse_from_str(value, format)
                        .ok()
                        .map(|naive| naive.and_utc())
                }),
        }
    }
}

impl Decoder for DateTimeDecoder {
    fn name(&self) -> &'static str {
        "DateTime"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<DateTime<Utc>>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        match Self::parse(value.trim(), ctx.config.date_decoder_format.as_deref()) {
            Some(date_time) => Validated::valid(Box::new(date_time)),
            None => Validated::invalid(ValidationError::DecodingValueParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}
