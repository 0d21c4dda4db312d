use crate::error::ToolError;
use crate::html::{document, escape};
use chrono::NaiveDate;
use std::fmt::{self, Write};
use std::str::FromStr;
use tracing::info;

const BLANK_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub last: String,
    pub first: String,
}

impl Student {
    /// `Last, First`, or the single name when there is no first name.
    pub fn display(&self) -> String {
        if self.first.is_empty() {
            self.last.clone()
        } else {
            format!("{}, {}", self.last, self.first)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetMode {
    /// Adds a column for nicknames and pronouns.
    FirstWeek,
    #[default]
    Standard,
}

impl fmt::Display for SheetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SheetMode::FirstWeek => "first-week",
            SheetMode::Standard => "standard",
        })
    }
}

impl FromStr for SheetMode {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-week" | "first_week" | "firstweek" => Ok(SheetMode::FirstWeek),
            "standard" => Ok(SheetMode::Standard),
            _ => Err(ToolError::invalid(format!(
                "unknown sheet mode '{s}' (use first-week or standard)"
            ))),
        }
    }
}

/// Parses a pasted roster. Accepts `Last, First Middle` and `First ... Last`;
/// a single token is kept as-is. Sorted by last name.
pub fn parse_roster(text: &str) -> Vec<Student> {
    let mut students: Vec<Student> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            if let Some((last, rest)) = line.split_once(',') {
                let first = rest.split_whitespace().next().unwrap_or_default();
                return Some(Student {
                    last: last.trim().to_string(),
                    first: first.to_string(),
                });
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [] => None,
                [only] => Some(Student {
                    last: only.to_string(),
                    first: String::new(),
                }),
                [first, .., last] => Some(Student {
                    last: last.to_string(),
                    first: first.to_string(),
                }),
            }
        })
        .collect();
    students.sort_by(|a, b| a.last.cmp(&b.last));
    students
}

const STYLE: &str = r#"
@media print {
  @page { margin: 0.5in; }
  body { font-family: sans-serif; }
}
body { font-family: 'Segoe UI', sans-serif; color: #000; }
h1 { text-align: center; margin-bottom: 5px; font-size: 24px; }
.meta { text-align: center; margin-bottom: 20px; color: #444; }
table { width: 100%; border-collapse: collapse; }
th { background: #eee; text-align: left; padding: 10px; border: 1px solid #000; }
td { padding: 8px; border: 1px solid #000; height: 35px; vertical-align: middle; }
.col-name { width: 30%; font-weight: bold; }
.col-sign { width: 35%; }
.col-note { width: 35%; }
"#;

pub fn render_signin(class_name: &str, date: NaiveDate, mode: SheetMode, students: &[Student]) -> String {
    let notes = mode == SheetMode::FirstWeek;
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{} - Sign In</h1>", escape(class_name));
    let _ = writeln!(body, "<div class=\"meta\">{}</div>", date.format("%A, %B %d, %Y"));

    body.push_str("<table>\n<thead><tr><th class=\"col-name\">Student Name</th><th class=\"col-sign\">Signature</th>");
    if notes {
        body.push_str("<th class=\"col-note\">Notes (Nickname/Pronouns)</th>");
    }
    body.push_str("</tr></thead>\n<tbody>\n");

    let extra_cell = if notes { "<td></td>" } else { "" };
    for student in students {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td></td>{extra_cell}</tr>",
            escape(&student.display())
        );
    }
    for _ in 0..BLANK_ROWS {
        let _ = writeln!(body, "<tr><td></td><td></td>{extra_cell}</tr>");
    }
    body.push_str("</tbody>\n</table>\n");

    info!(students = students.len(), %mode, "rendered sign-in sheet");
    document(&format!("{class_name} Sign In"), STYLE, &body)
}
