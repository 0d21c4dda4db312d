use crate::course_hours::CourseHoursTable;
use crate::error::{ToolError, ToolResult};
use crate::extract;
use chrono::Weekday;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

pub const COLUMNS: [&str; 16] = [
    "Course Code /Section",
    "Cr Hrs",
    "Cont Hrs",
    "Eq Hrs",
    "Contract Type(s)",
    "Combined With",
    "Begin Date",
    "End Date",
    "Mon",
    "Tue",
    "Wed",
    "Thu",
    "Fri",
    "Sat",
    "Room",
    "Online Section",
];

const DAY_COLUMNS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractType {
    #[default]
    Base,
    Ec,
    Xxc,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Base => "BASE",
            ContractType::Ec => "EC",
            ContractType::Xxc => "XXC",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BASE" => Ok(ContractType::Base),
            "EC" => Ok(ContractType::Ec),
            "XXC" => Ok(ContractType::Xxc),
            other => Err(ToolError::invalid(format!(
                "unknown contract type '{other}' (expected BASE, EC or XXC)"
            ))),
        }
    }
}

/// One row of the Faculty Assignment Sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FasRow {
    pub course: String,
    pub credit_hours: String,
    pub contact_hours: String,
    pub equivalency_hours: String,
    pub contract_type: String,
    pub combined_with: String,
    pub begin_date: String,
    pub end_date: String,
    /// Mon through Sat.
    pub day_times: [String; 6],
    pub room: String,
    pub online: String,
}

impl FasRow {
    pub fn from_block(
        block: &extract::CourseBlock<'_>,
        contract_type: ContractType,
        hours: &CourseHoursTable,
    ) -> Self {
        let (begin_date, end_date) = extract::dates(block.text);
        let (room, online) = extract::location(block.text);
        let course_hours = hours.lookup(&block.number);

        let mut day_times: [String; 6] = Default::default();
        if let Some((range, days)) = extract::meeting(block.text) {
            for (slot, day) in day_times.iter_mut().zip(DAY_COLUMNS) {
                if days.contains(&day) {
                    *slot = range.raw.clone();
                }
            }
        }

        debug!(course = %block.code, %room, online, "parsed assignment row");
        Self {
            course: block.code.clone(),
            credit_hours: course_hours.credit.to_string(),
            contact_hours: course_hours.contact.to_string(),
            equivalency_hours: course_hours.equivalency.to_string(),
            contract_type: contract_type.to_string(),
            combined_with: String::new(),
            begin_date,
            end_date,
            day_times,
            room,
            online: if online { "Yes".into() } else { String::new() },
        }
    }

    pub fn values(&self) -> Vec<&str> {
        let mut values = vec![
            self.course.as_str(),
            self.credit_hours.as_str(),
            self.contact_hours.as_str(),
            self.equivalency_hours.as_str(),
            self.contract_type.as_str(),
            self.combined_with.as_str(),
            self.begin_date.as_str(),
            self.end_date.as_str(),
        ];
        values.extend(self.day_times.iter().map(String::as_str));
        values.push(self.room.as_str());
        values.push(self.online.as_str());
        values
    }

    fn from_values(values: Vec<String>) -> ToolResult<Self> {
        let [
            course,
            credit_hours,
            contact_hours,
            equivalency_hours,
            contract_type,
            combined_with,
            begin_date,
            end_date,
            mon,
            tue,
            wed,
            thu,
            fri,
            sat,
            room,
            online,
        ]: [String; 16] = values
            .try_into()
            .map_err(|_| ToolError::invalid("assignment row must have 16 columns"))?;
        Ok(Self {
            course,
            credit_hours,
            contact_hours,
            equivalency_hours,
            contract_type,
            combined_with,
            begin_date,
            end_date,
            day_times: [mon, tue, wed, thu, fri, sat],
            room,
            online,
        })
    }

    fn to_dataframe_row(&self) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = COLUMNS
            .iter()
            .zip(self.values())
            .map(|(name, value)| Series::new((*name).into(), [value]).into_column())
            .collect();
        DataFrame::new(columns)
    }
}

/// Editable grid of assignment rows.
pub struct AssignmentSheet {
    df: DataFrame,
}

impl Default for AssignmentSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentSheet {
    pub fn new() -> Self {
        Self {
            df: DataFrame::empty_with_schema(&Self::default_schema()),
        }
    }

    fn default_schema() -> Schema {
        Schema::from_iter(
            COLUMNS
                .iter()
                .map(|name| Field::new((*name).into(), DataType::String)),
        )
    }

    /// One row per course block found in pasted schedule text.
    pub fn from_text(
        text: &str,
        contract_type: ContractType,
        hours: &CourseHoursTable,
    ) -> ToolResult<Self> {
        let mut sheet = Self::new();
        for block in extract::course_blocks(text) {
            sheet.push_row(&FasRow::from_block(&block, contract_type, hours))?;
        }
        info!(rows = sheet.len(), "built assignment sheet");
        Ok(sheet)
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_row(&mut self, row: &FasRow) -> ToolResult<()> {
        let new_row = row.to_dataframe_row()?;
        self.df = self.df.vstack(&new_row)?;
        Ok(())
    }

    pub fn row(&self, idx: usize) -> ToolResult<FasRow> {
        if idx >= self.len() {
            return Err(ToolError::invalid(format!(
                "row {} out of range (sheet has {} rows)",
                idx + 1,
                self.len()
            )));
        }
        let mut values = Vec::with_capacity(COLUMNS.len());
        for name in COLUMNS {
            let value = self.df.column(name)?.str()?.get(idx).unwrap_or_default();
            values.push(value.to_string());
        }
        FasRow::from_values(values)
    }

    pub fn rows(&self) -> ToolResult<Vec<FasRow>> {
        (0..self.len()).map(|idx| self.row(idx)).collect()
    }

    /// Column names match case-insensitively; `mon`, `room`, `cr hrs` all work.
    pub fn resolve_column(name: &str) -> Option<&'static str> {
        let wanted = name.trim().to_lowercase();
        COLUMNS
            .iter()
            .copied()
            .find(|col| col.to_lowercase() == wanted)
            .or_else(|| {
                COLUMNS
                    .iter()
                    .copied()
                    .find(|col| col.to_lowercase().starts_with(&wanted) && !wanted.is_empty())
            })
    }

    pub fn set_cell(&mut self, idx: usize, column: &str, value: &str) -> ToolResult<()> {
        let column_name = Self::resolve_column(column)
            .ok_or_else(|| ToolError::invalid(format!("unknown column '{column}'")))?;
        if idx >= self.len() {
            return Err(ToolError::invalid(format!("row {} out of range", idx + 1)));
        }

        let new_series = self
            .df
            .column(column_name)?
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, val)| if i == idx { Some(value) } else { val })
            .collect::<StringChunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    pub fn delete_row(&mut self, idx: usize) -> ToolResult<bool> {
        if idx >= self.len() {
            return Ok(false);
        }
        let rows = self.rows()?;
        self.df = DataFrame::empty_with_schema(&Self::default_schema());
        for (i, row) in rows.iter().enumerate() {
            if i != idx {
                self.push_row(row)?;
            }
        }
        Ok(true)
    }

    /// Tab separated rows without header or index, ready to paste into a spreadsheet.
    pub fn to_tsv(&self) -> ToolResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(Vec::new());
        for row in self.rows()? {
            writer.write_record(row.values())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| ToolError::Io(err.into_error()))?;
        String::from_utf8(bytes).map_err(|err| ToolError::invalid(err.to_string()))
    }

    pub fn render_table(&self) -> String {
        crate::table::render_text_table(&self.df)
    }
}
