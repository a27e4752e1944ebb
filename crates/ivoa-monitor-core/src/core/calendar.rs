// crates/ivoa-monitor-core/src/core/calendar.rs
// ============================================================================
// Module: IVOA Monitor Calendar Dates
// Description: Calendar dates stored in `YYYY-MM-DD` form.
// Purpose: Provide date parsing, formatting, and whole-day arithmetic.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every date the monitor persists (insert, update, validation) is a calendar
//! day rendered as `YYYY-MM-DD`. The core never reads the wall clock; hosts
//! supply "today" explicitly so reconciliation stays replayable in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Storage format for calendar days.
const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Calendar Day
// ============================================================================

/// A calendar day as persisted in the store.
///
/// # Invariants
/// - Display and parse round-trip through `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDay(Date);

impl CalendarDay {
    /// Wraps a `time::Date`.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Returns the wrapped date.
    #[must_use]
    pub const fn date(self) -> Date {
        self.0
    }

    /// Parses a `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns [`DayParseError`] when the input is not a valid calendar day.
    pub fn parse(value: &str) -> Result<Self, DayParseError> {
        Date::parse(value.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|err| DayParseError(format!("{value}: {err}")))
    }

    /// Returns the number of whole days from `earlier` to `self`.
    ///
    /// Negative when `earlier` lies after `self`.
    #[must_use]
    pub fn days_since(self, earlier: Self) -> i64 {
        (self.0 - earlier.0).whole_days()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl FromStr for CalendarDay {
    type Err = DayParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Invalid calendar day text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid calendar day: {0}")]
pub struct DayParseError(String);

// ============================================================================
// SECTION: Tests
// ============================================================================
