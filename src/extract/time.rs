use super::days::days_of_week;
use crate::schedule_event::{normalize_days, ScheduleEvent};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

static CLASS_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<sh>\d{1,2}):(?P<sm>\d{2})(?:\s*(?P<sp>[AP])M)?\s*-\s*(?P<eh>\d{1,2}):(?P<em>\d{2})\s*(?P<ep>[AP])M",
    )
    .expect("class time pattern")
});

static LOOSE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<sh>\d{1,2})(?::(?P<sm>\d{2}))?\s*(?:(?P<sp>[AP])\.?M\.?)?\s*(?:-|–|\bto\b)\s*(?P<eh>\d{1,2})(?::(?P<em>\d{2}))?\s*(?:(?P<ep>[AP])\.?M\.?)?",
    )
    .expect("office hour pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn from_capture(caps: &Captures<'_>, name: &str) -> Option<Self> {
        caps.name(name).map(|m| {
            if m.as_str().eq_ignore_ascii_case("p") {
                Meridiem::Pm
            } else {
                Meridiem::Am
            }
        })
    }

    fn flip(self) -> Self {
        match self {
            Meridiem::Am => Meridiem::Pm,
            Meridiem::Pm => Meridiem::Am,
        }
    }

    /// Bare office-hour numbers 1 through 7 are afternoon, 12 is noon.
    fn assumed_for(hour: u32) -> Self {
        match hour {
            1..=7 | 12 => Meridiem::Pm,
            _ => Meridiem::Am,
        }
    }
}

fn to_minutes(hour: u32, minute: u32, meridiem: Meridiem) -> u32 {
    let base = hour % 12;
    let hour24 = match meridiem {
        Meridiem::Am => base,
        Meridiem::Pm => base + 12,
    };
    hour24 * 60 + minute
}

fn number(caps: &Captures<'_>, name: &str) -> u32 {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// A class meeting time found in pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Upper-cased matched text, e.g. `9:00 AM - 10:30 AM`.
    pub raw: String,
    pub start: u32,
    pub end: u32,
    /// Byte span of the match inside the searched text.
    pub span: (usize, usize),
}

/// First `h:mm[ AM|PM] - h:mm AM|PM` range in the text.
pub fn time_range(text: &str) -> Option<TimeRange> {
    let caps = CLASS_TIME.captures(text)?;
    let whole = caps.get(0)?;

    let end_meridiem = Meridiem::from_capture(&caps, "ep")?;
    let end = to_minutes(number(&caps, "eh"), number(&caps, "em"), end_meridiem);

    let (sh, sm) = (number(&caps, "sh"), number(&caps, "sm"));
    let start = match Meridiem::from_capture(&caps, "sp") {
        Some(meridiem) => to_minutes(sh, sm, meridiem),
        None => {
            let inherited = to_minutes(sh, sm, end_meridiem);
            if inherited > end {
                to_minutes(sh, sm, end_meridiem.flip())
            } else {
                inherited
            }
        }
    };

    Some(TimeRange {
        raw: whole.as_str().to_uppercase(),
        start,
        end,
        span: (whole.start(), whole.end()),
    })
}

/// The full line of `text` that contains the byte span.
pub fn line_containing(text: &str, span: (usize, usize)) -> &str {
    let (start, end) = span;
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..].find('\n').map(|i| end + i).unwrap_or(text.len());
    &text[line_start..line_end]
}

fn resolve_loose(caps: &Captures<'_>) -> (u32, u32) {
    let (sh, sm) = (number(caps, "sh"), number(caps, "sm"));
    let (eh, em) = (number(caps, "eh"), number(caps, "em"));
    let start_marker = Meridiem::from_capture(caps, "sp");
    let end_marker = Meridiem::from_capture(caps, "ep");

    match (start_marker, end_marker) {
        (Some(s), Some(e)) => (to_minutes(sh, sm, s), to_minutes(eh, em, e)),
        (None, Some(e)) => {
            let end = to_minutes(eh, em, e);
            let start = to_minutes(sh, sm, e);
            if start > end {
                (to_minutes(sh, sm, e.flip()), end)
            } else {
                (start, end)
            }
        }
        (Some(s), None) => {
            let start = to_minutes(sh, sm, s);
            let end = to_minutes(eh, em, s);
            if end <= start {
                (start, to_minutes(eh, em, s.flip()))
            } else {
                (start, end)
            }
        }
        (None, None) => {
            let start = to_minutes(sh, sm, Meridiem::assumed_for(sh));
            let mut end = to_minutes(eh, em, Meridiem::assumed_for(eh));
            if end <= start && eh < 12 {
                end = to_minutes(eh, em, Meridiem::Pm);
            }
            (start, end)
        }
    }
}

/// Office hour entries such as `M/W 1-2; T 10:30-11:30 AM`.
///
/// Entries are separated by `;` or newlines. Each time range takes its days
/// from the text between it and the previous range. Days listed before a
/// comma with no time of their own, as in `Mon, Wed 2-3pm`, join the next
/// range.
pub fn office_hours(text: &str) -> Vec<ScheduleEvent> {
    let mut events = Vec::new();
    for entry in text.split(['\n', ';']) {
        let mut carried = Vec::new();
        for segment in entry.split(',') {
            let mut cursor = 0;
            for caps in LOOSE_TIME.captures_iter(segment) {
                let Some(whole) = caps.get(0) else { continue };
                let mut days = days_of_week(&segment[cursor..whole.start()]);
                if cursor == 0 {
                    days.append(&mut carried);
                    days = normalize_days(days);
                }
                cursor = whole.end();
                if days.is_empty() {
                    debug!(entry = %whole.as_str(), "office hour entry without days skipped");
                    continue;
                }
                let (start, end) = resolve_loose(&caps);
                if end <= start {
                    debug!(entry = %whole.as_str(), "office hour entry with empty range skipped");
                    continue;
                }
                events.push(ScheduleEvent::new("Office Hours", start, end, days));
            }
            if cursor == 0 {
                carried.extend(days_of_week(segment));
            }
        }
    }
    events
}
