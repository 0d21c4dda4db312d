use super::{CAMPUS_ROOM, ROOM};
use crate::schedule_event::normalize_days;
use chrono::Weekday;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

struct DayRule {
    pattern: Regex,
    days: &'static [Weekday],
}

impl DayRule {
    fn new(pattern: &str, days: &'static [Weekday]) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("day pattern"),
            days,
        }
    }
}

// Paired codes are checked before single letters.
static PAIR_RULES: Lazy<Vec<DayRule>> = Lazy::new(|| {
    vec![
        DayRule::new(r"\bM/W\b|\bMW\b", &[Weekday::Mon, Weekday::Wed]),
        DayRule::new(r"\bMWF\b", &[Weekday::Mon, Weekday::Wed, Weekday::Fri]),
        DayRule::new(
            r"\bT/TH\b|\bTTH\b|\bT/R\b|\bTR\b",
            &[Weekday::Tue, Weekday::Thu],
        ),
    ]
});

static SINGLE_RULES: Lazy<Vec<DayRule>> = Lazy::new(|| {
    vec![
        DayRule::new(r"\bM\b", &[Weekday::Mon]),
        DayRule::new(r"\bT\b", &[Weekday::Tue]),
        DayRule::new(r"\bW\b", &[Weekday::Wed]),
        DayRule::new(r"\bR\b|\bTH\b", &[Weekday::Thu]),
        DayRule::new(r"\bF\b", &[Weekday::Fri]),
        DayRule::new(r"\bSAT?\b", &[Weekday::Sat]),
    ]
});

static NAME_RULES: Lazy<Vec<DayRule>> = Lazy::new(|| {
    vec![
        DayRule::new(r"\bMON(?:DAY)?S?\b", &[Weekday::Mon]),
        DayRule::new(r"\bTUE(?:S(?:DAY)?)?S?\b", &[Weekday::Tue]),
        DayRule::new(r"\bWED(?:NESDAY)?S?\b", &[Weekday::Wed]),
        DayRule::new(r"\bTHU(?:R(?:S(?:DAY)?)?)?S?\b", &[Weekday::Thu]),
        DayRule::new(r"\bFRI(?:DAY)?S?\b", &[Weekday::Fri]),
        DayRule::new(r"\bSATURDAYS?\b", &[Weekday::Sat]),
    ]
});

fn apply(rules: &[DayRule], line: &str, found: &mut Vec<Weekday>) {
    for rule in rules {
        if rule.pattern.is_match(line) {
            found.extend_from_slice(rule.days);
        }
    }
}

/// Weekdays named on a single line of schedule text.
///
/// Pairs such as `M/W` or `TTH` are matched first, then standalone letter
/// codes, and only when neither matched, spelled-out day names. Room codes
/// like `SOU-F, 110` are removed first so building letters are not days.
pub fn days_of_week(line: &str) -> Vec<Weekday> {
    let upper = line.to_uppercase();
    let upper = CAMPUS_ROOM.replace_all(&upper, " ");
    let upper = ROOM.replace_all(&upper, " ");
    let mut found = Vec::new();

    apply(&PAIR_RULES, &upper, &mut found);
    apply(&SINGLE_RULES, &upper, &mut found);
    if found.is_empty() {
        apply(&NAME_RULES, &upper, &mut found);
    }

    let days = normalize_days(found);
    debug!(line = %line.trim(), ?days, "detected meeting days");
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_pair_yields_monday_wednesday() {
        assert_eq!(
            days_of_week("M/W 9:00 AM - 10:30 AM"),
            vec![Weekday::Mon, Weekday::Wed]
        );
    }

    #[test]
    fn fused_tth_is_not_read_as_lone_tuesday_only() {
        assert_eq!(
            days_of_week("TTH 11:00 - 12:15 PM"),
            vec![Weekday::Tue, Weekday::Thu]
        );
    }

    #[test]
    fn meridiem_letters_are_not_days() {
        assert!(days_of_week("9:00 AM - 10:30 AM").is_empty());
    }

    #[test]
    fn single_codes_combine() {
        assert_eq!(
            days_of_week("T R 2:00 PM - 3:15 PM"),
            vec![Weekday::Tue, Weekday::Thu]
        );
        assert_eq!(days_of_week("F 8:00 AM - 10:45 AM"), vec![Weekday::Fri]);
    }

    #[test]
    fn day_names_only_used_as_fallback() {
        assert_eq!(
            days_of_week("Mondays and Wednesdays 1:00 PM - 2:15 PM"),
            vec![Weekday::Mon, Weekday::Wed]
        );
        assert_eq!(days_of_week("Thurs 6:00 - 8:45 PM"), vec![Weekday::Thu]);
    }

    #[test]
    fn building_letters_are_not_days() {
        assert_eq!(
            days_of_week("T/TH 1:00 - 2:15 PM SOU-F, 110"),
            vec![Weekday::Tue, Weekday::Thu]
        );
        assert_eq!(
            days_of_week("W 9:00 - 10:15 AM sou-m, 204"),
            vec![Weekday::Wed]
        );
        assert!(days_of_week("SOU-W, 12 room change").is_empty());
    }

    #[test]
    fn words_containing_th_do_not_mark_thursday() {
        assert_eq!(days_of_week("MATH W 9:00 AM - 9:50 AM"), vec![Weekday::Wed]);
    }
}
