use crate::calendar::AcademicCalendar;
use crate::html::{document, escape};
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt::Write;
use tracing::{debug, info};

/// Something due or happening on a date, typically from a course calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedItem {
    pub date: NaiveDate,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusRow {
    pub week: u32,
    pub date: NaiveDate,
    pub topic: String,
    pub due: Vec<String>,
    /// Holiday name when the class does not meet.
    pub cancelled: Option<String>,
}

impl SyllabusRow {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_some()
    }
}

/// One topic per non-empty line, with list bullets removed.
pub fn parse_topics(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['•', '-', '*'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Week 1 starts on the Monday of the week containing `term_start`.
pub fn week_number(term_start: NaiveDate, date: NaiveDate) -> u32 {
    let week_start = term_start - Duration::days(term_start.weekday().num_days_from_monday() as i64);
    let days = (date - week_start).num_days().max(0);
    (days / 7) as u32 + 1
}

pub fn build_syllabus_rows(
    calendar: &AcademicCalendar,
    start: NaiveDate,
    end: NaiveDate,
    topics: &[String],
    items: &[DatedItem],
) -> Vec<SyllabusRow> {
    let mut rows: Vec<SyllabusRow> = calendar
        .meeting_days_in_range(start, end)
        .into_iter()
        .map(|date| SyllabusRow {
            week: week_number(start, date),
            date,
            topic: String::new(),
            due: Vec::new(),
            cancelled: None,
        })
        .collect();

    rows.extend(
        calendar
            .cancelled_meetings_in_range(start, end)
            .into_iter()
            .map(|(date, name)| SyllabusRow {
                week: week_number(start, date),
                date,
                topic: format!("No class: {name}"),
                due: Vec::new(),
                cancelled: Some(name.to_string()),
            }),
    );
    rows.sort_by_key(|row| row.date);

    let mut topic_iter = topics.iter();
    for row in rows.iter_mut().filter(|row| !row.is_cancelled()) {
        if let Some(topic) = topic_iter.next() {
            row.topic = topic.clone();
        }
    }
    let unused = topic_iter.count();
    if unused > 0 {
        debug!(unused, "more topics than class meetings");
    }

    let mut sorted_items: Vec<&DatedItem> = items
        .iter()
        .filter(|item| item.date >= start && item.date <= end)
        .collect();
    sorted_items.sort_by_key(|item| item.date);
    for item in sorted_items {
        match rows
            .iter_mut()
            .find(|row| !row.is_cancelled() && row.date >= item.date)
        {
            Some(row) => row.due.push(item.title.clone()),
            None => debug!(title = %item.title, date = %item.date, "no meeting on or after item"),
        }
    }

    rows
}

const STYLE: &str = r#"
body { font-family: Georgia, 'Times New Roman', serif; margin: 0.75in; color: #111; }
h1 { font-size: 24px; margin-bottom: 4px; }
.term { color: #555; margin-bottom: 16px; }
table { width: 100%; border-collapse: collapse; }
th { background: #eee; text-align: left; padding: 6px; border: 1px solid #555; }
td { padding: 6px; border: 1px solid #555; vertical-align: top; }
td.week { width: 4em; text-align: center; font-weight: bold; }
td.date { width: 8em; white-space: nowrap; }
tr.no-class td { background: #f5f5f5; color: #777; font-style: italic; }
tr.week-start td { border-top: 2px solid #000; }
"#;

pub fn render_syllabus_html(title: &str, term: &str, rows: &[SyllabusRow]) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h1>{}</h1>", escape(title));
    if !term.trim().is_empty() {
        let _ = write!(body, "<div class=\"term\">{}</div>", escape(term));
    }
    body.push_str(
        "\n<table>\n<thead><tr><th>Week</th><th>Date</th><th>Topic</th><th>Due</th></tr></thead>\n<tbody>\n",
    );

    let mut last_week = 0;
    for row in rows {
        let mut classes = Vec::new();
        if row.is_cancelled() {
            classes.push("no-class");
        }
        let week_cell = if row.week != last_week {
            if last_week != 0 {
                classes.push("week-start");
            }
            last_week = row.week;
            row.week.to_string()
        } else {
            String::new()
        };
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", classes.join(" "))
        };
        let due = row
            .due
            .iter()
            .map(|d| escape(d))
            .collect::<Vec<_>>()
            .join("<br>");
        let _ = writeln!(
            body,
            "<tr{class_attr}><td class=\"week\">{week_cell}</td><td class=\"date\">{}</td><td>{}</td><td>{due}</td></tr>",
            row.date.format("%a %b %-d"),
            escape(&row.topic)
        );
    }
    body.push_str("</tbody>\n</table>\n");

    info!(rows = rows.len(), "rendered syllabus schedule");
    document(title, STYLE, &body)
}
