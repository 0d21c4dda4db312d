use crate::error::ToolResult;
use crate::html::{bullet_list, document, escape};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use tracing::info;

pub const DEFAULT_PROMPT: &str =
    "Write about whatever is in your head right now: stress, lunch plans, traffic, or your to-do list.";
pub const DEFAULT_MINUTES: u32 = 7;
pub const DEFAULT_AGENDA: &str = "Freewrite\nTopic\nTopic";

const CALM_COLOR: &str = "#88c0d0";
const WARNING_COLOR: &str = "#ebcb8b";

/// What the podium shows for one class meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodiumSession {
    pub agenda: String,
    pub tech_free_writing: bool,
    pub prompt: String,
    pub minutes: u32,
}

impl Default for PodiumSession {
    fn default() -> Self {
        Self {
            agenda: DEFAULT_AGENDA.to_string(),
            tech_free_writing: true,
            prompt: DEFAULT_PROMPT.to_string(),
            minutes: DEFAULT_MINUTES,
        }
    }
}

impl PodiumSession {
    pub fn agenda_items(&self) -> Vec<String> {
        self.agenda
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn total_seconds(&self) -> u32 {
        self.minutes.saturating_mul(60)
    }
}

/// Calendar titles for today and for the following week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPlan {
    pub today: Vec<String>,
    pub upcoming: Vec<String>,
}

pub fn fuzzy_time(seconds_left: u32) -> String {
    let minutes = seconds_left as f64 / 60.0;
    if minutes >= 5.0 {
        return format!("About {} minutes remaining", minutes.round_ties_even() as u32);
    }
    let text = if minutes >= 3.5 {
        "About four minutes remaining"
    } else if minutes >= 2.75 {
        "About three minutes remaining"
    } else if minutes >= 2.25 {
        "About two and a half minutes remaining"
    } else if minutes >= 1.75 {
        "About two minutes remaining"
    } else if minutes >= 1.25 {
        "About a minute and a half remaining"
    } else if minutes >= 0.75 {
        "About one minute remaining"
    } else if minutes > 0.0 {
        "Less than a minute remaining"
    } else {
        "Time is up"
    };
    text.to_string()
}

pub fn timer_color(seconds_left: u32) -> &'static str {
    if seconds_left < 60 {
        WARNING_COLOR
    } else {
        CALM_COLOR
    }
}

/// A point in the countdown where the displayed message or colour changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerStep {
    pub seconds_left: u32,
    pub message: String,
    pub color: &'static str,
}

/// Every change point from `total_seconds` down to zero, in countdown order.
pub fn fuzzy_schedule(total_seconds: u32) -> Vec<TimerStep> {
    let mut steps: Vec<TimerStep> = Vec::new();
    for seconds_left in (0..=total_seconds).rev() {
        let message = fuzzy_time(seconds_left);
        let color = timer_color(seconds_left);
        let changed = steps
            .last()
            .is_none_or(|last| last.message != message || last.color != color);
        if changed {
            steps.push(TimerStep {
                seconds_left,
                message,
                color,
            });
        }
    }
    steps
}

/// Counts down one second per `tick`, writing the message whenever it changes.
pub fn run_countdown<W: Write>(
    total_seconds: u32,
    out: &mut W,
    mut tick: impl FnMut(),
) -> ToolResult<()> {
    let mut last = String::new();
    for seconds_left in (0..=total_seconds).rev() {
        let message = fuzzy_time(seconds_left);
        if message != last {
            writeln!(out, "{message}")?;
            out.flush()?;
            last = message;
        }
        if seconds_left > 0 {
            tick();
        }
    }
    Ok(())
}

const WELCOME_STYLE: &str = r#"
body { background: #0e1117; color: #e6edf3; font-family: 'Segoe UI', Roboto, sans-serif; margin: 2rem 3rem; }
.dashboard-title { font-size: 4em; font-weight: bold; color: #ffffff; margin-bottom: 0; }
.dashboard-subtitle { font-size: 1.5em; color: #aaaaaa; margin-bottom: 30px; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 3rem; }
h3 { font-size: 1.6em; margin-bottom: 0.5rem; }
.agenda-box, .calendar-box { background-color: #1e1e1e; border-left: 6px solid #00ff00; padding: 20px; border-radius: 5px; margin-bottom: 20px; }
.calendar-box { border-left-color: #00aaff; font-size: 1.2em; }
.calendar-box.upcoming { border-left-color: #ffa500; }
.calendar-box.empty { color: #666; }
.agenda-box ul { font-size: 1.3em; line-height: 1.6; }
.tfw-alert { background-color: #333300; border: 2px solid #ffd700; color: #ffd700; padding: 15px; text-align: center; font-size: 1.5em; font-weight: bold; border-radius: 10px; margin-top: 20px; }
.tfw-alert span { font-size: 0.6em; font-weight: normal; }
"#;

fn calendar_box(items: &[String], class: &str, empty_text: &str) -> String {
    match bullet_list(items, "events") {
        Some(list) => format!("<div class=\"calendar-box {class}\">{list}</div>"),
        None => format!("<div class=\"calendar-box {class} empty\">{}</div>", escape(empty_text)),
    }
}

pub fn render_welcome(session: &PodiumSession, today: NaiveDate, plan: &DayPlan) -> String {
    let mut body = String::new();
    body.push_str("<div class=\"dashboard-title\">Welcome to Class</div>\n");
    let _ = writeln!(
        body,
        "<div class=\"dashboard-subtitle\">{}</div>",
        today.format("%A, %B %d")
    );
    body.push_str("<div class=\"columns\">\n<div>\n<h3>Today's Agenda</h3>\n");
    let agenda = bullet_list(&session.agenda_items(), "agenda").unwrap_or_default();
    let _ = writeln!(body, "<div class=\"agenda-box\">{agenda}</div>");
    if session.tech_free_writing {
        body.push_str(
            "<div class=\"tfw-alert\">TECH-FREE WRITING TODAY<br><span>Please grab your TFW Journal and a pen.</span></div>\n",
        );
    }
    body.push_str("</div>\n<div>\n<h3>Today's Plan</h3>\n");
    body.push_str(&calendar_box(&plan.today, "today", "No specific calendar events today."));
    body.push_str("\n<h3>Due Next Week</h3>\n");
    body.push_str(&calendar_box(&plan.upcoming, "upcoming", "No upcoming deadlines found."));
    body.push_str("\n</div>\n</div>\n");

    info!(
        agenda = session.agenda_items().len(),
        today = plan.today.len(),
        upcoming = plan.upcoming.len(),
        "rendered welcome screen"
    );
    document("Welcome to Class", WELCOME_STYLE, &body)
}

const FOCUS_STYLE: &str = r#"
body { background: #0e1117; color: #ffffff; font-family: 'Segoe UI', sans-serif; margin: 2rem; }
.focus-prompt { font-size: 2.8em; text-align: center; margin: 40px 0; font-weight: bold; }
.focus-timer { font-size: 3.5em; text-align: center; font-weight: 300; margin-top: 20px; }
.progress { height: 8px; background: #222; border-radius: 4px; margin: 20px 10%; }
.progress div { height: 100%; width: 0; background: #88c0d0; border-radius: 4px; }
.focus-rules { font-size: 1.3em; color: #888; text-align: center; line-height: 1.8; margin-top: 50px; }
"#;

const FOCUS_RULES: [&str; 3] = [
    "Put all technology away.",
    "Keep your pen moving the entire time.",
    "If you get stuck, write \"I am stuck\" until a new thought comes.",
];

const FOCUS_SCRIPT: &str = r#"
(function () {
  var steps = SCHEDULE;
  var total = TOTAL;
  var left = total;
  var timer = document.getElementById('timer');
  var bar = document.getElementById('bar');
  function show() {
    for (var i = steps.length - 1; i >= 0; i--) {
      if (steps[i].seconds_left >= left) {
        timer.textContent = steps[i].message;
        timer.style.color = steps[i].color;
        break;
      }
    }
    bar.style.width = (total === 0 ? 100 : (total - left) * 100 / total) + '%';
  }
  show();
  var id = setInterval(function () {
    if (left > 0) { left--; show(); } else { clearInterval(id); }
  }, 1000);
})();
"#;

/// Full-screen writing prompt with a self-updating fuzzy timer.
pub fn render_focus(session: &PodiumSession) -> ToolResult<String> {
    let total = session.total_seconds();
    let schedule = fuzzy_schedule(total);
    // Keep the JSON from closing the script element early.
    let json = serde_json::to_string(&schedule)?.replace("</", "<\\/");

    let mut body = String::new();
    let _ = writeln!(body, "<div class=\"focus-prompt\">{}</div>", escape(&session.prompt));
    let _ = writeln!(
        body,
        "<div id=\"timer\" class=\"focus-timer\" style=\"color:{}\">{}</div>",
        timer_color(total),
        escape(&fuzzy_time(total))
    );
    body.push_str("<div class=\"progress\"><div id=\"bar\"></div></div>\n<div class=\"focus-rules\">");
    let rules: Vec<String> = FOCUS_RULES.iter().map(|r| format!("&bull; {}", escape(r))).collect();
    body.push_str(&rules.join("<br>\n"));
    body.push_str("</div>\n<script>");
    body.push_str(
        &FOCUS_SCRIPT
            .replace("SCHEDULE", &json)
            .replace("TOTAL", &total.to_string()),
    );
    body.push_str("</script>\n");

    info!(minutes = session.minutes, steps = schedule.len(), "rendered focus screen");
    Ok(document("Tech-Free Writing", FOCUS_STYLE, &body))
}
