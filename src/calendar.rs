use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct AcademicCalendar {
    holidays: BTreeMap<NaiveDate, String>,
    meeting_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDate {
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicCalendarConfig {
    meeting_days: Vec<Weekday>,
    holidays: Vec<NamedDate>,
}

impl Default for AcademicCalendar {
    fn default() -> Self {
        Self::with_year_range(2025, 2025)
    }
}

impl AcademicCalendar {
    pub const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Mon-Fri meetings with US federal holidays for every year in the range.
    pub fn with_year_range(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self {
            holidays: BTreeMap::new(),
            meeting_days: HashSet::from([
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
        };

        for year in start..=end {
            calendar.add_us_holidays(year);
        }
        calendar
    }

    /// Calendar for a term that meets on `meeting_days`, with federal holidays
    /// for every year the term touches.
    pub fn for_term<I>(start: NaiveDate, end: NaiveDate, meeting_days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut calendar = Self::with_year_range(start.year(), end.year());
        calendar.set_meeting_days(meeting_days);
        calendar
    }

    pub fn custom<I, J>(meeting_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NamedDate>,
    {
        let config = AcademicCalendarConfig::new(meeting_days, holidays);
        Self::from_config(&config)
    }

    pub fn from_config(config: &AcademicCalendarConfig) -> Self {
        let holidays = config
            .holidays
            .iter()
            .map(|h| (h.date, h.name.clone()))
            .collect();
        Self {
            holidays,
            meeting_days: config.meeting_days.iter().copied().collect(),
        }
    }

    pub fn to_config(&self) -> AcademicCalendarConfig {
        AcademicCalendarConfig::from(self)
    }

    fn add_us_holidays(&mut self, year: i32) {
        let fixed = [
            (1, 1, "New Year's Day"),
            (7, 4, "Independence Day"),
            (11, 11, "Veterans Day"),
            (12, 25, "Christmas Day"),
        ];
        for (month, day, name) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.add_holiday(date, name);
            }
        }

        let floating = [
            (1, Weekday::Mon, 3, "Martin Luther King Jr. Day"),
            (2, Weekday::Mon, 3, "Presidents' Day"),
            (9, Weekday::Mon, 1, "Labor Day"),
            (10, Weekday::Mon, 2, "Columbus Day"),
            (11, Weekday::Thu, 4, "Thanksgiving"),
        ];
        for (month, weekday, n, name) in floating {
            if let Some(date) = Self::nth_weekday(year, month, weekday, n) {
                self.add_holiday(date, name);
            }
        }

        if let Some(date) = Self::last_weekday(year, 5, Weekday::Mon) {
            self.add_holiday(date, "Memorial Day");
        }
    }

    /// Helper: Find the nth occurrence of a weekday in a month
    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
    }

    /// Helper: Find the last occurrence of a weekday in a month
    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let mut date = first_of_next - Duration::days(1);
        while date.weekday() != weekday {
            date = date - Duration::days(1);
        }
        Some(date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.holidays.insert(date, name.into());
    }

    pub fn add_holidays(&mut self, dates: &[NamedDate]) {
        for holiday in dates {
            self.add_holiday(holiday.date, holiday.name.clone());
        }
    }

    /// Mark every date from `start` through `end` (inclusive) as a holiday.
    pub fn add_break(&mut self, start: NaiveDate, end: NaiveDate, name: &str) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut current = start;
        while current <= end {
            self.add_holiday(current, name);
            current = current + Duration::days(1);
        }
    }

    pub fn set_meeting_days<I>(&mut self, days: I)
    where
        I: IntoIterator<Item = Weekday>,
    {
        self.meeting_days = days.into_iter().collect();
    }

    pub fn meeting_days(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| self.meeting_days.contains(day))
            .collect()
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Check if the class meets on a date
    pub fn is_meeting_day(&self, date: NaiveDate) -> bool {
        self.meeting_days.contains(&date.weekday()) && !self.is_holiday(date)
    }

    /// Find the next meeting date after a given date, looking at most a year ahead
    pub fn next_meeting_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from;
        for _ in 0..366 {
            current = current + Duration::days(1);
            if self.is_meeting_day(current) {
                return Some(current);
            }
        }
        None
    }

    /// Get all meeting dates in a date range
    pub fn meeting_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;

        while current <= end {
            if self.is_meeting_day(current) {
                days.push(current);
            }
            current = current + Duration::days(1);
        }
        days
    }

    /// Holidays in a range that would otherwise have been meeting dates
    pub fn cancelled_meetings_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(NaiveDate, &str)> {
        if start > end {
            return Vec::new();
        }
        self.holidays
            .range(start..=end)
            .filter(|(date, _)| self.meeting_days.contains(&date.weekday()))
            .map(|(date, name)| (*date, name.as_str()))
            .collect()
    }

    pub fn count_meeting_days(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.meeting_days_in_range(start, end).len()
    }
}

impl AcademicCalendarConfig {
    pub fn new<I, J>(meeting_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NamedDate>,
    {
        let mut meeting: Vec<Weekday> = meeting_days.into_iter().collect();
        meeting.sort_by_key(|wd| wd.num_days_from_monday());
        meeting.dedup();

        let mut holidays: Vec<NamedDate> = holidays.into_iter().collect();
        holidays.sort_by_key(|h| h.date);
        holidays.dedup_by_key(|h| h.date);

        Self {
            meeting_days: meeting,
            holidays,
        }
    }

    pub fn meeting_days(&self) -> &[Weekday] {
        &self.meeting_days
    }

    pub fn holidays(&self) -> &[NamedDate] {
        &self.holidays
    }
}

impl From<&AcademicCalendar> for AcademicCalendarConfig {
    fn from(calendar: &AcademicCalendar) -> Self {
        let holidays = calendar
            .holidays
            .iter()
            .map(|(date, name)| NamedDate {
                date: *date,
                name: name.clone(),
            })
            .collect();
        Self {
            meeting_days: calendar.meeting_days(),
            holidays,
        }
    }
}
