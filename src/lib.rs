pub mod assignment_sheet;
pub mod calendar;
pub mod config;
pub mod course_hours;
pub mod door_sign;
pub mod error;
pub mod extract;
pub mod html;
pub mod ics;
pub mod pdf;
pub mod podium;
pub mod schedule_event;
pub mod signin;
pub mod syllabus;
pub mod table;

pub use assignment_sheet::{AssignmentSheet, ContractType, FasRow};
pub use calendar::{AcademicCalendar, AcademicCalendarConfig, NamedDate};
pub use config::ToolsConfig;
pub use course_hours::{CourseHours, CourseHoursTable};
pub use door_sign::{DoorSignInfo, GridLayout};
pub use error::{ToolError, ToolResult};
pub use ics::{CalendarEvent, ShiftSummary};
pub use podium::{DayPlan, PodiumSession};
pub use schedule_event::ScheduleEvent;
pub use syllabus::{DatedItem, SyllabusRow};
