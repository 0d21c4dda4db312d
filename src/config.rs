use crate::assignment_sheet::ContractType;
use crate::calendar::{AcademicCalendar, NamedDate};
use crate::course_hours::{CourseHours, CourseHoursTable};
use crate::door_sign::DoorSignInfo;
use crate::error::{ToolError, ToolResult};
use crate::podium::PodiumSession;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const CONFIG_ENV: &str = "FACULTY_TOOLS_CONFIG";

/// A closure spanning several days, e.g. spring break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBreak {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Extra or replacement entries for the course hour table.
    pub course_hours: BTreeMap<String, CourseHours>,
    pub default_contract_type: ContractType,
    /// Class label -> public ICS feed URL.
    pub class_calendars: BTreeMap<String, String>,
    pub podium: PodiumSession,
    pub door_sign: DoorSignInfo,
    pub holidays: Vec<NamedDate>,
    pub breaks: Vec<TermBreak>,
    pub slot_minutes: u32,
    pub fetch_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            course_hours: BTreeMap::new(),
            default_contract_type: ContractType::Base,
            class_calendars: BTreeMap::new(),
            podium: PodiumSession::default(),
            door_sign: DoorSignInfo::default(),
            holidays: Vec::new(),
            breaks: Vec::new(),
            slot_minutes: 30,
            fetch_timeout_secs: 10,
        }
    }
}

impl ToolsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ToolResult<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(file)?;
        debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    /// Explicit path, then `FACULTY_TOOLS_CONFIG`; a missing file means defaults
    /// unless the path was given explicitly.
    pub fn load(path: Option<&Path>) -> ToolResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(env_path) if Path::new(&env_path).exists() => Self::from_file(Path::new(&env_path)),
            Some(env_path) => {
                debug!(path = ?env_path, "configuration file not found; using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ToolResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn to_json(&self) -> ToolResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn course_hours_table(&self) -> CourseHoursTable {
        CourseHoursTable::with_overrides(&self.course_hours)
    }

    /// US holidays for every year the term touches, plus configured closures.
    pub fn term_calendar(&self, start: NaiveDate, end: NaiveDate, meeting_days: &[Weekday]) -> AcademicCalendar {
        let mut calendar = AcademicCalendar::for_term(start, end, meeting_days.iter().copied());
        calendar.add_holidays(&self.holidays);
        for closure in &self.breaks {
            calendar.add_break(closure.start, closure.end, &closure.name);
        }
        calendar
    }

    pub fn calendar_url(&self, label: &str) -> ToolResult<&str> {
        if let Some(url) = self.class_calendars.get(label) {
            return Ok(url);
        }
        let wanted = label.to_lowercase();
        self.class_calendars
            .iter()
            .find(|(name, _)| name.to_lowercase().starts_with(&wanted))
            .map(|(_, url)| url.as_str())
            .ok_or_else(|| ToolError::invalid(format!("no class calendar named '{label}'")))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        std::fs::write(
            &path,
            r#"{ "course_hours": { "1181": { "credit": 3, "contact": 4, "equivalency": 4 } },
                 "class_calendars": { "ENGL 1190 (Mon/Wed)": "https://example.edu/1190.ics" } }"#,
        )
        .unwrap();
        let config = ToolsConfig::from_file(&path).unwrap();
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.podium.minutes, 7);
        assert_eq!(config.course_hours_table().lookup("1181"), CourseHours::new(3, 4, 4));
        assert_eq!(config.course_hours_table().lookup("1190"), CourseHours::new(4, 4, 5));
        assert_eq!(config.calendar_url("engl 1190").unwrap(), "https://example.edu/1190.ics");
        assert!(config.calendar_url("ENGL 2000").is_err());
    }

    #[test]
    fn save_then_load_is_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        let mut config = ToolsConfig::default();
        config.default_contract_type = ContractType::Ec;
        config.breaks.push(TermBreak {
            start: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            name: "Spring Break".into(),
        });
        config.save(&path).unwrap();
        assert_eq!(ToolsConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn breaks_cancel_meetings() {
        let mut config = ToolsConfig::default();
        config.breaks.push(TermBreak {
            start: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            name: "Spring Break".into(),
        });
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let calendar = config.term_calendar(start, end, &[Weekday::Tue, Weekday::Thu]);
        assert_eq!(calendar.count_meeting_days(start, end), 4);
        assert_eq!(calendar.cancelled_meetings_in_range(start, end).len(), 2);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(ToolsConfig::load(Some(&dir.path().join("nope.json"))).is_err());
    }
}
