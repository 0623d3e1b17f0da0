// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue scheduling core for `LumaCue`.
//!
//! This crate provides time-driven trigger/action sequencing:
//! - Named actions with opaque parameter bundles
//! - Once and periodic trigger elements with a firing state machine
//! - Offset actions replayed on every trigger cycle
//! - A sequence container that advances time and dispatches callbacks
//! - A fixed-rate polling runner
//!
//! ## Architecture
//!
//! A [`Sequence`] owns the trigger elements loaded from a show definition
//! and a name-keyed callback registry. Time moves only through
//! [`Sequence::advance`]: either a [`ShowRunner`] polls it from a
//! free-running clock, or an external time source (an audio playback
//! position) calls it directly. Firing decisions live entirely in the
//! per-element state machine in [`trigger`].

pub mod action;
pub mod runner;
pub mod sequence;
pub mod show;
pub mod timecode;
pub mod trigger;

pub use action::{Action, Params};
pub use runner::ShowRunner;
pub use sequence::{Handler, Sequence};
pub use show::{ActionEntry, ConfigError, ScheduleEntry, ShowDefinition};
pub use timecode::{parse_timecode, TempoScale, TimeValue, TimecodeError};
pub use trigger::{ElementId, Schedule, TriggerElement, TriggerState};
