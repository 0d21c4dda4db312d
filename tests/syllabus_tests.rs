use chrono::{NaiveDate, Weekday};
use faculty_tools::config::TermBreak;
use faculty_tools::syllabus::{build_syllabus_rows, parse_topics, render_syllabus_html, week_number};
use faculty_tools::{AcademicCalendar, DatedItem, ToolsConfig};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn item(date: NaiveDate, title: &str) -> DatedItem {
    DatedItem {
        date,
        title: title.into(),
    }
}

const TOPICS: &str = "\
- Introductions
* The Rhetorical Situation

• Ethos
Pathos
Logos
Kairos
";

#[test]
fn topics_fill_meetings_and_skip_holidays() {
    let start = d(2026, 1, 12);
    let end = d(2026, 1, 28);
    let calendar = AcademicCalendar::for_term(start, end, [Weekday::Mon, Weekday::Wed]);
    let topics = parse_topics(TOPICS);
    assert_eq!(topics.len(), 6);

    let rows = build_syllabus_rows(&calendar, start, end, &topics, &[]);
    let summary: Vec<(NaiveDate, u32, &str)> = rows
        .iter()
        .map(|row| (row.date, row.week, row.topic.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (d(2026, 1, 12), 1, "Introductions"),
            (d(2026, 1, 14), 1, "The Rhetorical Situation"),
            (d(2026, 1, 19), 2, "No class: Martin Luther King Jr. Day"),
            (d(2026, 1, 21), 2, "Ethos"),
            (d(2026, 1, 26), 3, "Pathos"),
            (d(2026, 1, 28), 3, "Logos"),
        ]
    );
    assert!(rows[2].is_cancelled());
}

#[test]
fn due_items_move_to_the_next_meeting() {
    let start = d(2026, 1, 12);
    let end = d(2026, 1, 28);
    let calendar = AcademicCalendar::for_term(start, end, [Weekday::Mon, Weekday::Wed]);
    let items = [
        item(d(2026, 1, 19), "Reading Response 1"),
        item(d(2026, 1, 13), "Diagnostic Essay"),
        item(d(2026, 1, 14), "Syllabus Quiz"),
        item(d(2026, 2, 10), "Essay 2"),
        item(d(2026, 1, 29), "After the last meeting"),
    ];
    let rows = build_syllabus_rows(&calendar, start, end, &[], &items);

    let on = |date: NaiveDate| rows.iter().find(|row| row.date == date).unwrap();
    assert_eq!(on(d(2026, 1, 14)).due, vec!["Diagnostic Essay", "Syllabus Quiz"]);
    assert!(on(d(2026, 1, 19)).due.is_empty());
    assert_eq!(on(d(2026, 1, 21)).due, vec!["Reading Response 1"]);
    assert!(rows.iter().all(|row| !row.due.iter().any(|t| t.starts_with("Essay 2"))));
}

#[test]
fn configured_breaks_become_cancelled_rows() {
    let mut config = ToolsConfig::default();
    config.breaks.push(TermBreak {
        start: d(2026, 3, 9),
        end: d(2026, 3, 13),
        name: "Spring Break".into(),
    });
    let start = d(2026, 3, 2);
    let end = d(2026, 3, 20);
    let calendar = config.term_calendar(start, end, &[Weekday::Tue, Weekday::Thu]);
    let rows = build_syllabus_rows(&calendar, start, end, &[], &[]);
    assert_eq!(rows.len(), 6);
    assert_eq!(rows.iter().filter(|row| row.is_cancelled()).count(), 2);
    assert_eq!(rows[2].cancelled.as_deref(), Some("Spring Break"));
}

#[test]
fn weeks_start_on_monday_of_the_first_week() {
    // Term starts on a Wednesday
    let start = d(2026, 1, 14);
    assert_eq!(week_number(start, d(2026, 1, 16)), 1);
    assert_eq!(week_number(start, d(2026, 1, 19)), 2);
    assert_eq!(week_number(start, d(2026, 1, 10)), 1);
}

#[test]
fn html_marks_holidays_and_week_boundaries() {
    let start = d(2026, 1, 12);
    let end = d(2026, 1, 21);
    let calendar = AcademicCalendar::for_term(start, end, [Weekday::Mon, Weekday::Wed]);
    let rows = build_syllabus_rows(&calendar, start, end, &parse_topics("Intro\nArgument & Evidence"), &[]);
    let html = render_syllabus_html("ENGL 1190: Composition I", "Spring 2026", &rows);

    assert!(html.contains("<h1>ENGL 1190: Composition I</h1>"));
    assert!(html.contains("<div class=\"term\">Spring 2026</div>"));
    assert!(html.contains("Mon Jan 12"));
    assert!(html.contains("Argument &amp; Evidence"));
    assert!(html.contains("<tr class=\"no-class week-start\">"));
    assert_eq!(html.matches("<td class=\"week\">1</td>").count(), 1);
}
