// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time value parsing and tempo scaling.

use serde::{Deserialize, Serialize};

/// A time as written in a show file: a raw number of seconds or an
/// `"H:M:S"` timecode string (fractional seconds allowed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// Raw seconds
    Seconds(f64),
    /// `"H:M:S"` timecode
    Timecode(String),
}

impl TimeValue {
    /// Resolve to seconds
    pub fn to_seconds(&self) -> Result<f64, TimecodeError> {
        match self {
            TimeValue::Seconds(s) => Ok(*s),
            TimeValue::Timecode(s) => parse_timecode(s),
        }
    }
}

impl From<f64> for TimeValue {
    fn from(seconds: f64) -> Self {
        TimeValue::Seconds(seconds)
    }
}

impl From<&str> for TimeValue {
    fn from(timecode: &str) -> Self {
        TimeValue::Timecode(timecode.to_string())
    }
}

/// Parse an `"H:M:S"` timecode into seconds
pub fn parse_timecode(timecode: &str) -> Result<f64, TimecodeError> {
    let parts: Vec<&str> = timecode.split(':').collect();
    if parts.len() != 3 {
        return Err(TimecodeError::Malformed(timecode.to_string()));
    }

    let mut fields = [0.0f64; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part
            .trim()
            .parse()
            .map_err(|_| TimecodeError::NonNumeric(timecode.to_string()))?;
    }

    Ok(fields[0] * 3600.0 + fields[1] * 60.0 + fields[2])
}

/// Scale factor applied to every time in a show, derived from a global bpm
///
/// With a bpm present, show times are beats and are multiplied by `60/bpm`
/// to obtain seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoScale(f64);

impl TempoScale {
    /// No scaling; times are plain seconds
    pub fn identity() -> Self {
        Self(1.0)
    }

    /// Scale derived from beats per minute; `None` if bpm is not positive
    pub fn from_bpm(bpm: f64) -> Option<Self> {
        (bpm > 0.0).then(|| Self(60.0 / bpm))
    }

    /// Apply the scale to a time or duration in show units
    pub fn apply(&self, value: f64) -> f64 {
        value * self.0
    }

    /// The raw multiplier
    pub fn factor(&self) -> f64 {
        self.0
    }
}

impl Default for TempoScale {
    fn default() -> Self {
        Self::identity()
    }
}

/// Error parsing a timecode string
#[derive(Debug, thiserror::Error)]
pub enum TimecodeError {
    /// Not in `H:M:S` form
    #[error("timecode {0:?} is not in H:M:S form")]
    Malformed(String),

    /// A field was not a number
    #[error("timecode {0:?} contains a non-numeric field")]
    NonNumeric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode() {
        assert_eq!(parse_timecode("0:00:05").unwrap(), 5.0);
        assert_eq!(parse_timecode("0:01:30.5").unwrap(), 90.5);
        assert_eq!(parse_timecode("1:00:00").unwrap(), 3600.0);
        assert_eq!(parse_timecode("2:30:15").unwrap(), 9015.0);
    }

    #[test]
    fn test_parse_timecode_malformed() {
        assert!(parse_timecode("5").is_err());
        assert!(parse_timecode("0:05").is_err());
        assert!(parse_timecode("0:0:0:5").is_err());
        assert!(parse_timecode("a:b:c").is_err());
        assert!(parse_timecode("").is_err());
    }

    #[test]
    fn test_time_value_untagged() {
        let number: TimeValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(number.to_seconds().unwrap(), 12.5);

        let timecode: TimeValue = serde_json::from_str("\"0:00:12.5\"").unwrap();
        assert_eq!(timecode.to_seconds().unwrap(), 12.5);
    }

    #[test]
    fn test_tempo_scale() {
        let scale = TempoScale::from_bpm(120.0).unwrap();
        assert_eq!(scale.factor(), 0.5);
        assert_eq!(scale.apply(4.0), 2.0);

        assert_eq!(TempoScale::identity().apply(4.0), 4.0);
        assert!(TempoScale::from_bpm(0.0).is_none());
        assert!(TempoScale::from_bpm(-60.0).is_none());
    }
}
