use crate::error::{ToolError, ToolResult};
use crate::syllabus::DatedItem;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, Property};
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

/// An event flattened to local wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftSummary {
    pub shifted: usize,
    pub skipped: usize,
}

pub fn parse_calendar(text: &str) -> ToolResult<Calendar> {
    if !text.contains("BEGIN:VCALENDAR") {
        return Err(ToolError::CalendarParse(
            "missing BEGIN:VCALENDAR; is this an .ics file?".into(),
        ));
    }
    text.parse::<Calendar>()
        .map_err(|err| ToolError::CalendarParse(err.to_string()))
}

pub fn load_calendar_file<P: AsRef<Path>>(path: P) -> ToolResult<Calendar> {
    let text = fs::read_to_string(path.as_ref())?;
    let calendar = parse_calendar(&text)?;
    debug!(path = %path.as_ref().display(), components = calendar.components.len(), "loaded calendar");
    Ok(calendar)
}

#[cfg(feature = "remote")]
pub fn fetch_calendar(url: &str, timeout: StdDuration) -> ToolResult<Calendar> {
    let fetch_error = |message: String| ToolError::Fetch {
        url: url.to_string(),
        message,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| fetch_error(err.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|err| fetch_error(err.to_string()))?;
    if !response.status().is_success() {
        return Err(fetch_error(format!("status {}", response.status())));
    }
    let text = response.text().map_err(|err| fetch_error(err.to_string()))?;
    parse_calendar(&text)
}

#[cfg(not(feature = "remote"))]
pub fn fetch_calendar(url: &str, _timeout: StdDuration) -> ToolResult<Calendar> {
    Err(ToolError::Fetch {
        url: url.to_string(),
        message: "built without the `remote` feature".into(),
    })
}

/// Events from a remote feed; any failure is logged and gives an empty list.
pub fn fetch_events(url: &str, timeout: StdDuration) -> Vec<CalendarEvent> {
    match fetch_calendar(url, timeout) {
        Ok(calendar) => events(&calendar),
        Err(err) => {
            warn!(%err, "calendar feed unavailable");
            Vec::new()
        }
    }
}

fn to_local(value: &DatePerhapsTime) -> (NaiveDateTime, bool) {
    match value {
        DatePerhapsTime::Date(date) => (date.and_time(NaiveTime::MIN), true),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => (*naive, false),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(utc)) => {
            (utc.with_timezone(&Local).naive_local(), false)
        }
        // Wall-clock time in the event's own zone.
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, .. }) => {
            (*date_time, false)
        }
    }
}

/// Every VEVENT with a start, sorted by start.
pub fn events(calendar: &Calendar) -> Vec<CalendarEvent> {
    let mut out: Vec<CalendarEvent> = calendar
        .components
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .filter_map(|event| {
            let (start, all_day) = to_local(&event.get_start()?);
            let end = event.get_end().map(|end| to_local(&end).0);
            Some(CalendarEvent {
                summary: event.get_summary().unwrap_or_default().to_string(),
                start,
                end,
                all_day,
                description: event.get_description().map(str::to_string),
            })
        })
        .collect();
    out.sort_by_key(|e| e.start);
    out
}

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Date-valued properties that move together with DTSTART.
const DATED_PROPERTIES: [&str; 5] = ["DTSTART", "DTEND", "RECURRENCE-ID", "EXDATE", "RDATE"];

/// One DATE or DATE-TIME value moved by `delta`, written back in the same form.
fn shift_stamp(stamp: &str, delta: Duration) -> Option<String> {
    if let Some(utc) = stamp.strip_suffix('Z') {
        let moved = NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT).ok()? + delta;
        Some(format!("{}Z", moved.format(DATE_TIME_FORMAT)))
    } else if stamp.contains('T') {
        let moved = NaiveDateTime::parse_from_str(stamp, DATE_TIME_FORMAT).ok()? + delta;
        Some(moved.format(DATE_TIME_FORMAT).to_string())
    } else {
        let moved = NaiveDate::parse_from_str(stamp, DATE_FORMAT).ok()? + delta;
        Some(moved.format(DATE_FORMAT).to_string())
    }
}

/// Comma-separated values; RDATE periods keep their durations.
fn shift_list(value: &str, delta: Duration) -> Option<String> {
    let items = value
        .split(',')
        .map(|item| {
            let parts = item
                .split('/')
                .map(|part| {
                    if part.trim_start_matches(['+', '-']).starts_with('P') {
                        Some(part.to_string())
                    } else {
                        shift_stamp(part, delta)
                    }
                })
                .collect::<Option<Vec<_>>>()?;
            Some(parts.join("/"))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(items.join(","))
}

fn shift_rule(rule: &str, delta: Duration) -> Option<String> {
    let parts = rule
        .split(';')
        .map(|part| match part.strip_prefix("UNTIL=") {
            Some(until) => shift_stamp(until, delta).map(|moved| format!("UNTIL={moved}")),
            None => Some(part.to_string()),
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(";"))
}

fn with_value(property: &Property, value: String) -> Property {
    let mut moved = Property::new(property.key(), value);
    for param in property.params().values() {
        moved.append_parameter(param.clone());
    }
    moved
}

fn shift_event(event: &Event, delta: Duration) -> ToolResult<Event> {
    let shift = |property: &Property| -> ToolResult<Property> {
        let (key, value) = (property.key(), property.value());
        let moved = if key == "RRULE" {
            shift_rule(value, delta)
        } else if DATED_PROPERTIES.contains(&key) {
            shift_list(value, delta)
        } else {
            return Ok(property.clone());
        };
        moved.map(|moved| with_value(property, moved)).ok_or_else(|| {
            ToolError::CalendarParse(format!(
                "event `{}` has an unreadable {key} value `{value}`",
                event.get_summary().unwrap_or_default()
            ))
        })
    };

    let mut moved = Event::new();
    for property in event.properties().values() {
        moved.append_property(shift(property)?);
    }
    for property in event.multi_properties().values().flatten() {
        moved.append_multi_property(shift(property)?);
    }
    for child in event.components() {
        moved.append_component(child.clone());
    }
    Ok(moved)
}

/// Move every event by `days`: start, end, recurrence exceptions and the
/// RRULE `UNTIL` bound, keeping each value's form (date, floating, UTC or TZID).
///
/// Events without a DTSTART are left alone and counted as skipped. A date
/// value that cannot be read fails the whole shift and leaves `calendar`
/// untouched.
pub fn shift_calendar(calendar: &mut Calendar, days: i64) -> ToolResult<ShiftSummary> {
    let delta = Duration::days(days);
    let mut summary = ShiftSummary::default();
    let mut components = Vec::with_capacity(calendar.components.len());
    for component in &calendar.components {
        match component {
            CalendarComponent::Event(event) if event.properties().contains_key("DTSTART") => {
                components.push(CalendarComponent::Event(shift_event(event, delta)?));
                summary.shifted += 1;
            }
            CalendarComponent::Event(_) => {
                summary.skipped += 1;
                components.push(component.clone());
            }
            _ => components.push(component.clone()),
        }
    }
    calendar.components = components;
    info!(days, shifted = summary.shifted, skipped = summary.skipped, "shifted calendar");
    Ok(summary)
}

/// Days to add so that `from` lands on `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Titles of events today, and of events in the following seven days
/// formatted as `Essay 1 (Fri)`.
pub fn split_today_upcoming(events: &[CalendarEvent], today: NaiveDate) -> (Vec<String>, Vec<String>) {
    let horizon = today + Duration::days(7);
    let mut today_events = Vec::new();
    let mut upcoming = Vec::new();
    for event in events {
        let date = event.date();
        if date == today {
            today_events.push(event.summary.clone());
        } else if date > today && date <= horizon {
            upcoming.push(format!("{} ({})", event.summary, date.format("%a")));
        }
    }
    (today_events, upcoming)
}

/// Events as due items for a syllabus schedule.
pub fn dated_items(events: &[CalendarEvent]) -> Vec<DatedItem> {
    events
        .iter()
        .filter(|e| !e.summary.trim().is_empty())
        .map(|e| DatedItem {
            date: e.date(),
            title: e.summary.clone(),
        })
        .collect()
}

pub fn to_ics_string(calendar: &Calendar) -> String {
    calendar.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event_at(summary: &str, date: NaiveDate) -> CalendarEvent {
        CalendarEvent {
            summary: summary.into(),
            start: date.and_hms_opt(9, 0, 0).unwrap(),
            end: None,
            all_day: false,
            description: None,
        }
    }

    #[test]
    fn text_without_calendar_header_is_rejected() {
        let err = parse_calendar("hello").unwrap_err();
        assert!(matches!(err, ToolError::CalendarParse(_)));
    }

    #[test]
    fn today_and_next_seven_days_are_split() {
        let today = d(2025, 9, 1);
        let events = vec![
            event_at("Old", d(2025, 8, 31)),
            event_at("Quiz", today),
            event_at("Essay 1", d(2025, 9, 5)),
            event_at("Edge", d(2025, 9, 8)),
            event_at("Later", d(2025, 9, 9)),
        ];
        let (now, next) = split_today_upcoming(&events, today);
        assert_eq!(now, vec!["Quiz"]);
        assert_eq!(next, vec!["Essay 1 (Fri)", "Edge (Mon)"]);
    }

    #[test]
    fn stamps_keep_their_form() {
        let week = Duration::days(7);
        assert_eq!(shift_stamp("20250901", week).as_deref(), Some("20250908"));
        assert_eq!(shift_stamp("20250901T090000", week).as_deref(), Some("20250908T090000"));
        assert_eq!(shift_stamp("20250901T150000Z", week).as_deref(), Some("20250908T150000Z"));
        assert_eq!(shift_stamp("2025-09-01", week), None);
    }

    #[test]
    fn rule_bounds_and_periods_move() {
        let week = Duration::days(7);
        assert_eq!(
            shift_rule("FREQ=WEEKLY;UNTIL=20251208T235959Z;BYDAY=MO", week).as_deref(),
            Some("FREQ=WEEKLY;UNTIL=20251215T235959Z;BYDAY=MO")
        );
        assert_eq!(shift_rule("FREQ=DAILY;COUNT=5", week).as_deref(), Some("FREQ=DAILY;COUNT=5"));
        assert_eq!(
            shift_list("20250901T090000/PT1H,20250903T090000/20250903T100000", week).as_deref(),
            Some("20250908T090000/PT1H,20250910T090000/20250910T100000")
        );
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d(2025, 1, 13), d(2026, 1, 12)), 364);
        assert_eq!(days_between(d(2025, 1, 13), d(2025, 1, 6)), -7);
    }
}
