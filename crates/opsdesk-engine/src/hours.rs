// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working-hours window.
//!
//! Immutable value constructed once from configuration and passed into
//! the orchestrators. Off-hours only changes the SLA wording on ticket
//! creation; routing is unaffected.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

/// A weekly working-hours window in a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct WorkingHours {
    start_hour: u8,
    end_hour: u8,
    /// 1 = Monday through 7 = Sunday.
    days: Vec<u8>,
    offset: FixedOffset,
}

impl WorkingHours {
    /// Build from config values. Out-of-range offsets clamp to UTC.
    pub fn new(start_hour: u8, end_hour: u8, days: Vec<u8>, utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self {
            start_hour,
            end_hour,
            days,
            offset,
        }
    }

    /// Is the given instant inside the window?
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.offset);
        let weekday = local.weekday().number_from_monday() as u8;
        if !self.days.contains(&weekday) {
            return false;
        }
        let hour = local.hour() as u8;
        self.start_hour <= hour && hour < self.end_hour
    }

    /// Is right now inside the window?
    pub fn is_open_now(&self) -> bool {
        self.contains(Utc::now())
    }
}
