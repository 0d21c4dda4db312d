use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// One recurring weekly meeting pulled out of pasted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub name: String,
    /// Minutes since midnight.
    pub start: u32,
    pub end: u32,
    pub days: Vec<Weekday>,
    pub room: String,
    pub online: bool,
}

impl ScheduleEvent {
    pub fn new(name: impl Into<String>, start: u32, end: u32, days: Vec<Weekday>) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            days: normalize_days(days),
            room: String::new(),
            online: false,
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn time_label(&self) -> String {
        format!("{} - {}", format_clock(self.start), format_clock(self.end))
    }
}

/// Sort Monday-first and drop duplicates.
pub fn normalize_days(mut days: Vec<Weekday>) -> Vec<Weekday> {
    days.sort_by_key(|wd| wd.num_days_from_monday());
    days.dedup();
    days
}

/// `570` -> `9:30 AM`
pub fn format_clock(minutes: u32) -> String {
    let hour24 = (minutes / 60) % 24;
    let minute = minutes % 60;
    let meridiem = if hour24 >= 12 { "PM" } else { "AM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}:{minute:02} {meridiem}")
}
