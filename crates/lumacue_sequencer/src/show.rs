// SPDX-License-Identifier: MIT OR Apache-2.0
//! Show definition parsing and validation.
//!
//! A show file is a JSON document with an ordered `sequence` of schedule
//! entries and an optional global `bpm`. Times are either raw seconds or
//! `"H:M:S"` timecodes. All validation happens here, at load time; a failed
//! load never produces a partially-built show.

use crate::action::{Action, Params};
use crate::timecode::{TempoScale, TimeValue, TimecodeError};
use crate::trigger::TriggerElement;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parsed show file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowDefinition {
    /// Beats per minute; when present, every time in the show is a beat
    /// count and is rescaled by `60/bpm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    /// Schedule entries in firing order
    pub sequence: Vec<ScheduleEntry>,
}

/// One entry of the show's schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScheduleEntry {
    /// Fires a single time
    Once {
        /// Absolute activation time
        #[serde(rename = "startTime")]
        start_time: TimeValue,
        /// Actions dispatched when the entry fires
        actions: Vec<ActionEntry>,
    },
    /// Fires repeatedly within a window
    Periodic {
        /// Absolute activation time
        #[serde(rename = "startTime")]
        start_time: TimeValue,
        /// Time between firings
        period: TimeValue,
        /// Expiry time; absent means the entry never expires
        #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
        end_time: Option<TimeValue>,
        /// Actions dispatched on each firing
        actions: Vec<ActionEntry>,
    },
}

/// One action of a schedule entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEntry {
    /// Name matched against the callback registry
    pub name: String,
    /// Opaque parameters handed to the handler
    #[serde(default)]
    pub parameters: Params,
    /// Delay after the owning entry fires; absent fires immediately
    #[serde(rename = "offsetTime", default, skip_serializing_if = "Option::is_none")]
    pub offset_time: Option<TimeValue>,
}

impl ShowDefinition {
    /// Parse a show definition from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a show definition from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// The tempo scale derived from the global `bpm`
    pub fn tempo_scale(&self) -> Result<TempoScale, ConfigError> {
        match self.bpm {
            None => Ok(TempoScale::identity()),
            Some(bpm) => TempoScale::from_bpm(bpm).ok_or(ConfigError::InvalidBpm(bpm)),
        }
    }

    /// Build the trigger elements this show defines, in load order
    pub fn build_elements(&self) -> Result<Vec<TriggerElement>, ConfigError> {
        let scale = self.tempo_scale()?;
        self.sequence
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.build_element(index, scale))
            .collect()
    }
}

impl ScheduleEntry {
    fn build_element(&self, index: usize, scale: TempoScale) -> Result<TriggerElement, ConfigError> {
        match self {
            ScheduleEntry::Once {
                start_time,
                actions,
            } => {
                let start = scale.apply(start_time.to_seconds()?);
                let mut element = TriggerElement::once(start);
                for entry in actions {
                    element = element.with_action(entry.build_action(scale)?);
                }
                Ok(element)
            }
            ScheduleEntry::Periodic {
                start_time,
                period,
                end_time,
                actions,
            } => {
                let raw_period = period.to_seconds()?;
                if raw_period <= 0.0 {
                    return Err(ConfigError::NonPositivePeriod {
                        index,
                        period: raw_period,
                    });
                }

                let start = start_time.to_seconds()?;
                let end = match end_time {
                    Some(time) => time.to_seconds()?,
                    None => f64::INFINITY,
                };
                if start > end {
                    return Err(ConfigError::InvertedWindow { index, start, end });
                }

                let mut element =
                    TriggerElement::periodic(scale.apply(start), scale.apply(raw_period))
                        .with_end(scale.apply(end));
                for entry in actions {
                    element = element.with_action(entry.build_action(scale)?);
                }
                Ok(element)
            }
        }
    }
}

impl ActionEntry {
    fn build_action(&self, scale: TempoScale) -> Result<Action, ConfigError> {
        let mut action = Action::new(&self.name).with_parameters(self.parameters.clone());
        if let Some(time) = &self.offset_time {
            let offset = time.to_seconds()?;
            if offset < 0.0 {
                return Err(ConfigError::NegativeOffset {
                    name: self.name.clone(),
                    offset,
                });
            }
            action = action.with_offset(scale.apply(offset));
        }
        Ok(action)
    }
}

/// Error loading a show definition
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Show file could not be read
    #[error("failed to read show file: {0}")]
    Io(#[from] std::io::Error),

    /// Show file is not a valid show definition
    #[error("malformed show definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// A time field could not be parsed
    #[error(transparent)]
    Timecode(#[from] TimecodeError),

    /// `bpm` must be positive
    #[error("bpm must be positive, got {0}")]
    InvalidBpm(f64),

    /// A periodic entry's period must be positive
    #[error("periodic entry {index}: period must be positive, got {period}")]
    NonPositivePeriod {
        /// Position of the entry in the show's sequence
        index: usize,
        /// The rejected period in seconds
        period: f64,
    },

    /// A periodic entry starts after it ends
    #[error("periodic entry {index}: startTime {start} is after endTime {end}")]
    InvertedWindow {
        /// Position of the entry in the show's sequence
        index: usize,
        /// Start time in seconds
        start: f64,
        /// End time in seconds
        end: f64,
    },

    /// An action's offset must be non-negative
    #[error("action {name:?}: offsetTime must be non-negative, got {offset}")]
    NegativeOffset {
        /// Name of the offending action
        name: String,
        /// The rejected offset in seconds
        offset: f64,
    },
}
