use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseHours {
    pub credit: u32,
    pub contact: u32,
    pub equivalency: u32,
}

impl CourseHours {
    pub const fn new(credit: u32, contact: u32, equivalency: u32) -> Self {
        Self {
            credit,
            contact,
            equivalency,
        }
    }
}

impl Default for CourseHours {
    fn default() -> Self {
        Self::new(3, 3, 3)
    }
}

const BUILT_IN: [(&str, CourseHours); 1] = [("1190", CourseHours::new(4, 4, 5))];

/// Credit/contact/equivalency hours keyed by four digit course number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseHoursTable {
    entries: BTreeMap<String, CourseHours>,
    fallback: CourseHours,
}

impl Default for CourseHoursTable {
    fn default() -> Self {
        Self {
            entries: BUILT_IN
                .iter()
                .map(|(number, hours)| (number.to_string(), *hours))
                .collect(),
            fallback: CourseHours::default(),
        }
    }
}

impl CourseHoursTable {
    /// Built-in entries overlaid with `overrides`.
    pub fn with_overrides(overrides: &BTreeMap<String, CourseHours>) -> Self {
        let mut table = Self::default();
        for (number, hours) in overrides {
            table.insert(number.trim(), *hours);
        }
        table
    }

    pub fn insert(&mut self, number: impl Into<String>, hours: CourseHours) {
        self.entries.insert(number.into(), hours);
    }

    pub fn lookup(&self, number: &str) -> CourseHours {
        self.entries
            .get(number.trim())
            .copied()
            .unwrap_or(self.fallback)
    }
}
