// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedules: iCalendar recurrences evaluated in a named time zone.
//!
//! Only the schedule subset the controller emits is understood here:
//! a `DTSTART` and an optional `RRULE` with FREQ, INTERVAL, COUNT, UNTIL
//! and (for weekly rules) BYDAY. Everything else in the block is skipped.

use crate::acl::UserId;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a schedule.
    pub struct ScheduleId;
}

/// A schedule row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub owner: UserId,
    /// iCalendar text defining the recurrence.
    pub icalendar: String,
    /// IANA zone name the recurrence is evaluated in.
    pub timezone: String,
    /// How long a started task may run before a stop is due; 0 = unlimited.
    #[serde(default)]
    pub duration_secs: u64,
}

impl Schedule {
    pub fn new(
        id: impl Into<ScheduleId>,
        name: impl Into<String>,
        owner: impl Into<UserId>,
        icalendar: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            icalendar: icalendar.into(),
            timezone: timezone.into(),
            duration_secs: 0,
        }
    }

    /// A once-off schedule fires at DTSTART and is then spent.
    pub fn is_once_off(&self) -> bool {
        parse_icalendar(&self.icalendar)
            .map(|ev| ev.rrule.is_none())
            .unwrap_or(false)
    }

    /// First fire time strictly after `after`, or `None` when the
    /// recurrence is exhausted or unparseable.
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let event = parse_icalendar(&self.icalendar).ok()?;
        let zone = Tz::from_str(&self.timezone).unwrap_or(Tz::UTC);
        event.next_after(after, zone)
    }
}

/// Errors from iCalendar parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleParseError {
    #[error("missing DTSTART")]
    MissingDtstart,
    #[error("bad date-time value: {0}")]
    BadDateTime(String),
    #[error("bad RRULE part: {0}")]
    BadRule(String),
}

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freq {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Parsed recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub freq: Freq,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<NaiveDateTime>,
    /// Weekly-only: fire on these weekdays at DTSTART's time of day.
    pub byday: Vec<Weekday>,
}

/// The event subset extracted from an iCalendar block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// DTSTART as a naive local stamp; `utc` marks a trailing `Z`.
    pub dtstart: NaiveDateTime,
    pub dtstart_utc: bool,
    /// Zone from `DTSTART;TZID=...`, overriding the schedule zone.
    pub tzid: Option<String>,
    pub rrule: Option<RecurrenceRule>,
}

// Occurrence scan cap; a recurrence this sparse is treated as exhausted.
const MAX_OCCURRENCE_SCAN: u32 = 100_000;

impl CalendarEvent {
    /// First occurrence strictly after `after`, evaluated in `zone`.
    pub fn next_after(&self, after: DateTime<Utc>, zone: Tz) -> Option<DateTime<Utc>> {
        let zone = match &self.tzid {
            Some(name) => Tz::from_str(name).unwrap_or(zone),
            None => zone,
        };
        let start = if self.dtstart_utc {
            Utc.from_utc_datetime(&self.dtstart)
        } else {
            resolve_local(zone, self.dtstart)?
        };

        let rule = match &self.rrule {
            None => return (start > after).then_some(start),
            Some(r) => r,
        };

        let mut remaining = rule.count;
        let mut occurrence = 0u32;
        loop {
            if occurrence >= MAX_OCCURRENCE_SCAN {
                return None;
            }
            let candidates = occurrences_in_period(start, zone, rule, occurrence);
            for t in candidates {
                // BYDAY expansion of the first week may produce instants
                // before DTSTART; the recurrence begins at DTSTART.
                if t < start {
                    continue;
                }
                if let Some(until) = rule.until {
                    let limit = if self.dtstart_utc {
                        Utc.from_utc_datetime(&until)
                    } else {
                        resolve_local(zone, until)?
                    };
                    if t > limit {
                        return None;
                    }
                }
                if let Some(ref mut n) = remaining {
                    if *n == 0 {
                        return None;
                    }
                    *n -= 1;
                }
                if t > after {
                    return Some(t);
                }
            }
            occurrence += 1;
        }
    }
}

/// The occurrence(s) of period number `n` (0 = the DTSTART period).
///
/// All frequencies yield one instant per period except weekly rules with
/// BYDAY, which yield one per listed weekday, in chronological order.
fn occurrences_in_period(
    start: DateTime<Utc>,
    zone: Tz,
    rule: &RecurrenceRule,
    n: u32,
) -> Vec<DateTime<Utc>> {
    let interval = rule.interval.max(1);
    let steps = (n * interval) as i64;
    let local = start.with_timezone(&zone).naive_local();

    let base = match rule.freq {
        Freq::Minutely => Some(local + Duration::minutes(steps)),
        Freq::Hourly => Some(local + Duration::hours(steps)),
        Freq::Daily => Some(local + Duration::days(steps)),
        Freq::Weekly => Some(local + Duration::weeks(steps)),
        Freq::Monthly => local.checked_add_months(Months::new(steps as u32)),
        Freq::Yearly => local.checked_add_months(Months::new(steps as u32 * 12)),
    };
    let base = match base {
        Some(b) => b,
        None => return Vec::new(),
    };

    if rule.freq == Freq::Weekly && !rule.byday.is_empty() {
        // Expand the week containing `base` to the listed weekdays.
        let week_start = base - Duration::days(base.weekday().num_days_from_monday() as i64);
        let mut days: Vec<NaiveDateTime> = rule
            .byday
            .iter()
            .map(|wd| week_start + Duration::days(wd.num_days_from_monday() as i64))
            .collect();
        days.sort();
        days.into_iter()
            .filter_map(|d| resolve_local(zone, d))
            .collect()
    } else {
        resolve_local(zone, base).into_iter().collect()
    }
}

/// Resolve a naive local stamp in `zone`, taking the earlier side of DST
/// ambiguities and skipping nonexistent stamps forward by an hour.
fn resolve_local(zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        chrono::LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        chrono::LocalResult::None => zone
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc)),
    }
}

/// Parse the DTSTART/RRULE subset out of an iCalendar block.
pub fn parse_icalendar(text: &str) -> Result<CalendarEvent, ScheduleParseError> {
    let mut dtstart = None;
    let mut dtstart_utc = false;
    let mut tzid = None;
    let mut rrule = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("DTSTART") {
            let (params, value) = rest
                .split_once(':')
                .ok_or_else(|| ScheduleParseError::BadDateTime(line.to_string()))?;
            for param in params.trim_start_matches(';').split(';') {
                if let Some(z) = param.strip_prefix("TZID=") {
                    tzid = Some(z.to_string());
                }
            }
            let value = value.trim();
            dtstart_utc = value.ends_with('Z');
            let bare = value.trim_end_matches('Z');
            let parsed = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S")
                .map_err(|_| ScheduleParseError::BadDateTime(value.to_string()))?;
            dtstart = Some(parsed);
        } else if let Some(rest) = line.strip_prefix("RRULE:") {
            rrule = Some(parse_rrule(rest)?);
        }
    }

    Ok(CalendarEvent {
        dtstart: dtstart.ok_or(ScheduleParseError::MissingDtstart)?,
        dtstart_utc,
        tzid,
        rrule,
    })
}

fn parse_rrule(text: &str) -> Result<RecurrenceRule, ScheduleParseError> {
    let mut freq = None;
    let mut interval = 1u32;
    let mut count = None;
    let mut until = None;
    let mut byday = Vec::new();

    for part in text.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| ScheduleParseError::BadRule(part.to_string()))?;
        match key {
            "FREQ" => {
                freq = Some(match value {
                    "MINUTELY" => Freq::Minutely,
                    "HOURLY" => Freq::Hourly,
                    "DAILY" => Freq::Daily,
                    "WEEKLY" => Freq::Weekly,
                    "MONTHLY" => Freq::Monthly,
                    "YEARLY" => Freq::Yearly,
                    other => return Err(ScheduleParseError::BadRule(other.to_string())),
                });
            }
            "INTERVAL" => {
                interval = value
                    .parse()
                    .map_err(|_| ScheduleParseError::BadRule(part.to_string()))?;
            }
            "COUNT" => {
                count = Some(
                    value
                        .parse()
                        .map_err(|_| ScheduleParseError::BadRule(part.to_string()))?,
                );
            }
            "UNTIL" => {
                let bare = value.trim_end_matches('Z');
                let parsed = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S")
                    .map_err(|_| ScheduleParseError::BadDateTime(value.to_string()))?;
                until = Some(parsed);
            }
            "BYDAY" => {
                for day in value.split(',') {
                    byday.push(match day {
                        "MO" => Weekday::Mon,
                        "TU" => Weekday::Tue,
                        "WE" => Weekday::Wed,
                        "TH" => Weekday::Thu,
                        "FR" => Weekday::Fri,
                        "SA" => Weekday::Sat,
                        "SU" => Weekday::Sun,
                        other => return Err(ScheduleParseError::BadRule(other.to_string())),
                    });
                }
            }
            // WKST, BYMONTH etc. are never emitted by the manager UI.
            _ => {}
        }
    }

    Ok(RecurrenceRule {
        freq: freq.ok_or_else(|| ScheduleParseError::BadRule("missing FREQ".to_string()))?,
        interval,
        count,
        until,
        byday,
    })
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
