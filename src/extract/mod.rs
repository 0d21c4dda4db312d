pub mod days;
pub mod time;

pub use days::days_of_week;
pub use time::{TimeRange, line_containing, office_hours, time_range};

use crate::schedule_event::ScheduleEvent;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static COURSE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]{3,4})-(\d{4})-([A-Z0-9]+)").expect("course code pattern"));
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").expect("date pattern"));
static CAMPUS_ROOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SOU-([A-Z]),\s*(\d+)").expect("campus room pattern"));
static ROOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{1,3}-\d{3,4})\b").expect("room pattern"));

const REMOTE_MARKERS: [&str; 3] = ["REMOTE", "ONLINE", "ZOOM"];

/// Text from one course code up to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseBlock<'a> {
    pub code: String,
    pub number: String,
    pub text: &'a str,
}

pub fn course_blocks(text: &str) -> Vec<CourseBlock<'_>> {
    let mut starts: Vec<usize> = COURSE_CODE.find_iter(text).map(|m| m.start()).collect();
    starts.push(text.len());

    starts
        .windows(2)
        .filter_map(|pair| {
            let block = &text[pair[0]..pair[1]];
            let caps = COURSE_CODE.captures(block)?;
            Some(CourseBlock {
                code: caps.get(0)?.as_str().replace('-', " "),
                number: caps.get(2)?.as_str().to_string(),
                text: block,
            })
        })
        .collect()
}

/// `ENGL-2740-H1602` -> `ENGL 2740 H1602`
pub fn course_code(text: &str) -> Option<String> {
    COURSE_CODE
        .find(text)
        .map(|m| m.as_str().replace('-', " "))
}

/// Four digit course number from either the dashed or spaced form.
pub fn course_number(code: &str) -> Option<String> {
    static NUMBER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b[A-Z]{3,4}[- ](\d{4})\b").expect("course number pattern"));
    NUMBER
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            let trimmed = code.trim();
            (trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()))
                .then(|| trimmed.to_string())
        })
}

/// First and last `M/D/YYYY` date in the text, empty when none.
pub fn dates(text: &str) -> (String, String) {
    let found: Vec<&str> = DATE.find_iter(text).map(|m| m.as_str()).collect();
    match (found.first(), found.last()) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => (String::new(), String::new()),
    }
}

pub fn is_remote(text: &str) -> bool {
    let upper = text.to_uppercase();
    REMOTE_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Room label, with campus codes like `SOU-B, 204` shortened to `SB-204`.
pub fn room(text: &str) -> String {
    if let Some(caps) = CAMPUS_ROOM.captures(text) {
        return format!("S{}-{}", &caps[1], &caps[2]);
    }
    ROOM.captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Room for display, where a remote label wins over any room found.
pub fn location(text: &str) -> (String, bool) {
    if is_remote(text) {
        ("Remote".to_string(), true)
    } else {
        (room(text), false)
    }
}

/// Meeting days and time for a block, read from the line that carries the time.
pub fn meeting(text: &str) -> Option<(TimeRange, Vec<chrono::Weekday>)> {
    let range = time_range(text)?;
    let days = days_of_week(line_containing(text, range.span));
    Some((range, days))
}

pub fn schedule_events(text: &str) -> Vec<ScheduleEvent> {
    course_blocks(text)
        .into_iter()
        .filter_map(|block| {
            let Some((range, days)) = meeting(block.text) else {
                debug!(course = %block.code, "no meeting time found");
                return None;
            };
            let (room, online) = location(block.text);
            let mut event = ScheduleEvent::new(block.code, range.start, range.end, days);
            event.room = room;
            event.online = online;
            Some(event)
        })
        .collect()
}
