// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule expression parsing and next-fire computation.
//!
//! Two accepted forms: simple `HH:MM` (translated to `<m> <h> * * *`) and
//! 5-field cron (`minute hour day-of-month month day-of-week`) with `*`,
//! lists, ranges, and steps. All times are local wall-clock; comparisons
//! use naive local datetimes so a DST jump cannot wedge the walk.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("invalid schedule '{0}': expected HH:MM or 5 cron fields")]
    Shape(String),

    #[error("invalid cron field '{field}': {reason}")]
    Field { field: String, reason: String },

    #[error("value {value} out of range {min}-{max}")]
    Range { value: u32, min: u32, max: u32 },
}

/// A parsed schedule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minutes: u64, // bit i set = minute i matches (0-59)
    hours: u32,   // 0-23
    dom: u32,     // 1-31
    months: u16,  // 1-12
    dow: u8,      // 0-6, Sunday = 0
    dom_restricted: bool,
    dow_restricted: bool,
    source: String,
}

fn full_mask(min: u32, max: u32) -> u64 {
    let mut mask = 0u64;
    for v in min..=max {
        mask |= 1 << v;
    }
    mask
}

fn parse_value(s: &str, min: u32, max: u32) -> Result<u32, CronError> {
    let value: u32 = s
        .parse()
        .map_err(|_| CronError::Field {
            field: s.to_string(),
            reason: "not a number".to_string(),
        })?;
    if value < min || value > max {
        return Err(CronError::Range { value, min, max });
    }
    Ok(value)
}

/// Parse one cron field into a bitmask. Supports `*`, `*/step`, `a`,
/// `a-b`, `a-b/step`, and comma lists of those.
fn parse_field(field: &str, min: u32, max: u32) -> Result<u64, CronError> {
    let mut mask = 0u64;
    for part in field.split(',') {
        let (range_part, step) = match part.split_once('/') {
            Some((r, s)) => (r, parse_value(s, 1, max.max(1))?),
            None => (part, 1),
        };
        let (lo, hi) = if range_part == "*" {
            (min, max)
        } else if let Some((a, b)) = range_part.split_once('-') {
            (parse_value(a, min, max)?, parse_value(b, min, max)?)
        } else {
            let v = parse_value(range_part, min, max)?;
            (v, v)
        };
        if lo > hi {
            return Err(CronError::Field {
                field: part.to_string(),
                reason: "range start after end".to_string(),
            });
        }
        let mut v = lo;
        while v <= hi {
            mask |= 1 << v;
            v += step;
        }
    }
    if mask == 0 {
        return Err(CronError::Field {
            field: field.to_string(),
            reason: "matches nothing".to_string(),
        });
    }
    Ok(mask)
}

impl CronExpr {
    /// Parse `HH:MM` or a 5-field cron expression.
    pub fn parse(schedule: &str) -> Result<Self, CronError> {
        let schedule = schedule.trim();

        // Simple time-of-day form.
        if let Some((h, m)) = schedule.split_once(':') {
            if h.chars().all(|c| c.is_ascii_digit()) && m.chars().all(|c| c.is_ascii_digit()) {
                let hour = parse_value(h, 0, 23)?;
                let minute = parse_value(m, 0, 59)?;
                return Ok(Self {
                    minutes: 1 << minute,
                    hours: 1 << hour,
                    dom: full_mask(1, 31) as u32,
                    months: full_mask(1, 12) as u16,
                    dow: full_mask(0, 6) as u8,
                    dom_restricted: false,
                    dow_restricted: false,
                    source: schedule.to_string(),
                });
            }
        }

        let fields: Vec<&str> = schedule.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::Shape(schedule.to_string()));
        }

        // Day-of-week accepts 7 as an alias for Sunday; fold bit 7 into 0.
        let dow_mask = {
            let raw = parse_field(fields[4], 0, 7)?;
            let folded = if raw & (1 << 7) != 0 { raw | 1 } else { raw };
            (folded & 0x7f) as u8
        };

        Ok(Self {
            minutes: parse_field(fields[0], 0, 59)?,
            hours: parse_field(fields[1], 0, 23)? as u32,
            dom: parse_field(fields[2], 1, 31)? as u32,
            months: parse_field(fields[3], 1, 12)? as u16,
            dow: dow_mask,
            dom_restricted: fields[2] != "*",
            dow_restricted: fields[4] != "*",
            source: schedule.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the expression matches a given local minute.
    pub fn matches(&self, t: NaiveDateTime) -> bool {
        if self.minutes & (1 << t.minute()) == 0 {
            return false;
        }
        if self.hours & (1 << t.hour()) == 0 {
            return false;
        }
        if self.months & (1 << t.month()) == 0 {
            return false;
        }
        let dom_ok = self.dom & (1 << t.day()) != 0;
        let dow_ok = self.dow & (1 << t.weekday().num_days_from_sunday()) != 0;
        // Standard cron: when both day fields are restricted, either may
        // match; otherwise both must.
        if self.dom_restricted && self.dow_restricted {
            dom_ok || dow_ok
        } else {
            dom_ok && dow_ok
        }
    }

    /// Next matching minute strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut t = truncate_to_minute(after) + Duration::minutes(1);
        // A year of minutes bounds the walk for any satisfiable expression.
        for _ in 0..(366 * 24 * 60) {
            if self.matches(t) {
                return Some(t);
            }
            t += Duration::minutes(1);
        }
        None
    }

    /// Whether a firing was due earlier today (at or before `now`).
    pub fn due_today_before(&self, now: NaiveDateTime) -> bool {
        let mut t = match now.date().and_hms_opt(0, 0, 0) {
            Some(t) => t,
            None => return false,
        };
        let cutoff = truncate_to_minute(now);
        while t <= cutoff {
            if self.matches(t) {
                return true;
            }
            t += Duration::minutes(1);
        }
        false
    }

    /// Human description: `Daily at 2:30 PM`, `Every minute`, or the raw
    /// expression.
    pub fn describe(&self) -> String {
        let everything_daily = self.dom == full_mask(1, 31) as u32
            && self.months == full_mask(1, 12) as u16
            && self.dow == full_mask(0, 6) as u8;

        if everything_daily {
            if self.minutes == full_mask(0, 59) && self.hours == full_mask(0, 23) as u32 {
                return "Every minute".to_string();
            }
            if let (Some(minute), Some(hour)) =
                (single_bit(self.minutes), single_bit(self.hours as u64))
            {
                let (h12, ampm) = match hour {
                    0 => (12, "AM"),
                    1..=11 => (hour, "AM"),
                    12 => (12, "PM"),
                    _ => (hour - 12, "PM"),
                };
                return format!("Daily at {}:{:02} {}", h12, minute, ampm);
            }
            if single_bit(self.minutes).is_some() && self.hours == full_mask(0, 23) as u32 {
                if let Some(minute) = single_bit(self.minutes) {
                    return format!("Hourly at :{:02}", minute);
                }
            }
        }
        format!("Cron: {}", self.source)
    }
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t)
}

/// Index of the single set bit, if exactly one is set.
fn single_bit(mask: u64) -> Option<u32> {
    (mask.count_ones() == 1).then(|| mask.trailing_zeros())
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
