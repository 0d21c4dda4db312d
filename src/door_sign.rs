use crate::html::{document, escape};
use crate::schedule_event::{ScheduleEvent, format_clock};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::info;

const EARLIEST_START: u32 = 8 * 60;
const LATEST_END: u32 = 17 * 60;
const HEADER_ROWS: usize = 1;
const LABEL_COLUMNS: usize = 1;

/// Maps clock times and weekdays onto CSS grid lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub day_start: u32,
    pub day_end: u32,
    pub slot_minutes: u32,
    pub days: Vec<Weekday>,
}

impl GridLayout {
    /// Smallest hour-aligned window covering 8:00-17:00 and every event.
    pub fn fit(events: &[ScheduleEvent], slot_minutes: u32) -> Self {
        let slot_minutes = slot_minutes.max(5);
        let earliest = events
            .iter()
            .map(|e| e.start / 60 * 60)
            .min()
            .unwrap_or(EARLIEST_START);
        let latest = events
            .iter()
            .map(|e| e.end.div_ceil(60) * 60)
            .max()
            .unwrap_or(LATEST_END);

        let mut days = vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];
        if events.iter().any(|e| e.meets_on(Weekday::Sat)) {
            days.push(Weekday::Sat);
        }

        Self {
            day_start: earliest.min(EARLIEST_START),
            day_end: latest.max(LATEST_END).min(24 * 60),
            slot_minutes,
            days,
        }
    }

    pub fn slot_count(&self) -> usize {
        (self.day_end - self.day_start).div_ceil(self.slot_minutes) as usize
    }

    /// Grid row whose slot contains `minutes`; row 1 is the header.
    pub fn row_for(&self, minutes: u32) -> usize {
        let clamped = minutes.clamp(self.day_start, self.day_end);
        ((clamped - self.day_start) / self.slot_minutes) as usize + HEADER_ROWS + 1
    }

    /// Grid line after the last slot touched by an event ending at `minutes`.
    pub fn end_line_for(&self, minutes: u32) -> usize {
        let clamped = minutes.clamp(self.day_start, self.day_end);
        (clamped - self.day_start).div_ceil(self.slot_minutes) as usize + HEADER_ROWS + 1
    }

    /// Grid column for a weekday; column 1 holds the time labels.
    pub fn column_for(&self, day: Weekday) -> Option<usize> {
        self.days
            .iter()
            .position(|d| *d == day)
            .map(|idx| idx + LABEL_COLUMNS + 1)
    }

    /// `(column, row_start, row_end)` for every day the event meets.
    pub fn placements(&self, event: &ScheduleEvent) -> Vec<(usize, usize, usize)> {
        let row_start = self.row_for(event.start);
        let row_end = self.end_line_for(event.end).max(row_start + 1);
        event
            .days
            .iter()
            .filter_map(|day| self.column_for(*day))
            .map(|col| (col, row_start, row_end))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorSignInfo {
    pub name: String,
    pub office: String,
    pub term: String,
    pub email: String,
}

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Roboto, sans-serif; margin: 0.5in; color: #111; }
header h1 { margin: 0; font-size: 28px; }
header p { margin: 2px 0; color: #444; }
.grid { display: grid; gap: 2px; margin-top: 16px; background: #ddd; border: 1px solid #999; }
.grid > div { background: #fff; padding: 2px 4px; font-size: 12px; }
.day { font-weight: bold; text-align: center; background: #f0f0f0 !important; }
.time { color: #666; text-align: right; }
.event { border-left: 4px solid #2b6cb0; background: #ebf4ff !important; overflow: hidden; }
.event.office { border-left-color: #2f855a; background: #f0fff4 !important; }
.event.online { border-left-color: #b7791f; background: #fffbea !important; }
.event strong { display: block; }
@media print { body { margin: 0.3in; } }
"#;

pub fn render_door_sign(
    info: &DoorSignInfo,
    events: &[ScheduleEvent],
    layout: &GridLayout,
) -> String {
    let mut body = String::new();
    body.push_str("<header>");
    let _ = write!(body, "<h1>{}</h1>", escape(&info.name));
    for line in [&info.office, &info.email, &info.term] {
        if !line.trim().is_empty() {
            let _ = write!(body, "<p>{}</p>", escape(line));
        }
    }
    body.push_str("</header>\n");

    let _ = write!(
        body,
        "<div class=\"grid\" style=\"grid-template-columns: 5.5em repeat({}, 1fr); grid-template-rows: 2em repeat({}, 1.3em);\">\n",
        layout.days.len(),
        layout.slot_count()
    );

    for day in &layout.days {
        if let Some(col) = layout.column_for(*day) {
            let _ = writeln!(
                body,
                "<div class=\"day\" style=\"grid-column: {col}; grid-row: 1;\">{day}</div>"
            );
        }
    }

    // Slots longer than an hour can put two hours on one row; the first wins.
    let mut last_row = 0;
    for hour in (layout.day_start..layout.day_end).step_by(60) {
        let row = layout.row_for(hour);
        if row == last_row {
            continue;
        }
        last_row = row;
        let _ = writeln!(
            body,
            "<div class=\"time\" style=\"grid-column: 1; grid-row: {row};\">{}</div>",
            format_clock(hour)
        );
    }

    for event in events {
        let class = if event.name == "Office Hours" {
            "event office"
        } else if event.online {
            "event online"
        } else {
            "event"
        };
        let place = if event.online {
            "Remote".to_string()
        } else {
            event.room.clone()
        };
        for (col, row_start, row_end) in layout.placements(event) {
            let _ = write!(
                body,
                "<div class=\"{class}\" style=\"grid-column: {col}; grid-row: {row_start} / {row_end};\"><strong>{}</strong>{}",
                escape(&event.name),
                escape(&event.time_label())
            );
            if !place.is_empty() {
                let _ = write!(body, "<br>{}", escape(&place));
            }
            body.push_str("</div>\n");
        }
    }
    body.push_str("</div>\n");

    info!(events = events.len(), "rendered door sign");
    let title = if info.name.trim().is_empty() {
        "Door Sign".to_string()
    } else {
        format!("{} - Door Sign", info.name)
    };
    document(&title, STYLE, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(start: u32, end: u32, days: Vec<Weekday>) -> ScheduleEvent {
        ScheduleEvent::new("ENGL 1190 H1602", start, end, days)
    }

    #[test]
    fn default_window_is_eight_to_five() {
        let layout = GridLayout::fit(&[], 30);
        assert_eq!((layout.day_start, layout.day_end), (480, 1020));
        assert_eq!(layout.slot_count(), 18);
        assert_eq!(layout.days.len(), 5);
    }

    #[test]
    fn window_grows_to_cover_evening_class() {
        let layout = GridLayout::fit(&[event(18 * 60 + 30, 20 * 60 + 45, vec![Weekday::Tue])], 30);
        assert_eq!(layout.day_end, 21 * 60);
        assert_eq!(layout.day_start, 480);
    }

    #[test]
    fn rows_and_columns_follow_slot_arithmetic() {
        let layout = GridLayout::fit(&[], 30);
        assert_eq!(layout.row_for(480), 2);
        assert_eq!(layout.row_for(9 * 60), 4);
        assert_eq!(layout.row_for(9 * 60 + 15), 4);
        assert_eq!(layout.end_line_for(10 * 60 + 30), 7);
        assert_eq!(layout.end_line_for(10 * 60 + 20), 7);
        assert_eq!(layout.column_for(Weekday::Mon), Some(2));
        assert_eq!(layout.column_for(Weekday::Fri), Some(6));
        assert_eq!(layout.column_for(Weekday::Sat), None);
    }

    #[test]
    fn saturday_column_added_only_when_needed() {
        let layout = GridLayout::fit(&[event(540, 600, vec![Weekday::Sat])], 30);
        assert_eq!(layout.column_for(Weekday::Sat), Some(7));
    }

    #[test]
    fn placements_emit_one_cell_per_meeting_day() {
        let layout = GridLayout::fit(&[], 30);
        let e = event(9 * 60, 10 * 60 + 30, vec![Weekday::Mon, Weekday::Wed]);
        assert_eq!(layout.placements(&e), vec![(2, 4, 7), (4, 4, 7)]);
    }

    #[test]
    fn every_hour_is_labelled_with_uneven_slots() {
        let layout = GridLayout::fit(&[], 45);
        let html = render_door_sign(&DoorSignInfo::default(), &[], &layout);
        assert_eq!(html.matches("<div class=\"time\"").count(), 9);
        assert!(html.contains("grid-row: 3;\">9:00 AM</div>"));
        assert!(html.contains("grid-row: 6;\">11:00 AM</div>"));
        assert!(html.contains(">4:00 PM</div>"));

        let wide = GridLayout::fit(&[], 90);
        let html = render_door_sign(&DoorSignInfo::default(), &[], &wide);
        assert_eq!(html.matches("<div class=\"time\"").count(), 6);
    }

    #[test]
    fn rendered_sign_escapes_and_places_events() {
        let mut e = event(9 * 60, 10 * 60 + 30, vec![Weekday::Mon]);
        e.room = "SB-204".into();
        let info = DoorSignInfo {
            name: "Dr. A & B".into(),
            ..Default::default()
        };
        let layout = GridLayout::fit(std::slice::from_ref(&e), 30);
        let html = render_door_sign(&info, &[e], &layout);
        assert!(html.contains("Dr. A &amp; B"));
        assert!(html.contains("grid-column: 2; grid-row: 4 / 7;"));
        assert!(html.contains("SB-204"));
    }
}
