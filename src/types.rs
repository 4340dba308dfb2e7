use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Workbook Layout Constants
//==============================================================================

/// Name of the sheet rows are appended to
pub const DATA_SHEET_NAME: &str = "dataIn";

/// Filename offered for download
pub const DEFAULT_FILENAME: &str = "MainData.xlsx";

/// MIME type for .xlsx downloads
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Trailing rows shown in the preview unless configured otherwise
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Header row of the data sheet, in column order
pub const HEADER: [&str; 8] = [
    "Program Name",
    "Program Code",
    "Program Budget Value",
    "First Contract Name",
    "First Contractor Name",
    "Contract Start Date",
    "Contract Finish Date",
    "Contract Value",
];

//==============================================================================
// Cell Values
//==============================================================================

/// Raw value of a single spreadsheet cell, no type coercion applied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date-time (days since 1899-12-30)
    DateTime(f64),
    /// Error literal such as `#N/A` or `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text content if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content if this is a number cell
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(serial) => write!(f, "{}", serial),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

//==============================================================================
// Record
//==============================================================================

/// One program/contract entry, written as one row of the data sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub program_name: String,
    pub program_code: String,
    pub program_budget: f64,
    pub first_contract_name: String,
    pub first_contractor_name: String,
    pub contract_start_date: NaiveDate,
    pub contract_finish_date: NaiveDate,
    pub contract_value: f64,
}

impl Record {
    /// Cells in header order. Dates are stored as `YYYY-MM-DD` text.
    pub fn to_row(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.program_name.clone()),
            CellValue::Text(self.program_code.clone()),
            CellValue::Number(self.program_budget),
            CellValue::Text(self.first_contract_name.clone()),
            CellValue::Text(self.first_contractor_name.clone()),
            CellValue::Text(self.contract_start_date.format("%Y-%m-%d").to_string()),
            CellValue::Text(self.contract_finish_date.format("%Y-%m-%d").to_string()),
            CellValue::Number(self.contract_value),
        ]
    }
}

//==============================================================================
// Workbook Model
//==============================================================================

/// A named grid of cells. Row 0 is spreadsheet row 1, column 0 is column A.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row below the last row
    pub fn append_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// In-memory workbook: ordered sheets holding raw cell values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh workbook: one `dataIn` sheet holding just the header row
    pub fn template() -> Self {
        let mut sheet = Sheet::new(DATA_SHEET_NAME);
        sheet.append_row(HEADER.iter().map(|h| CellValue::from(*h)).collect());
        Self {
            sheets: vec![sheet],
        }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The `dataIn` sheet, or the first sheet when none is named `dataIn`
    pub fn data_sheet(&self) -> Option<&Sheet> {
        self.sheet(DATA_SHEET_NAME).or_else(|| self.sheets.first())
    }

    /// Mutable counterpart of [`Workbook::data_sheet`]
    pub fn data_sheet_mut(&mut self) -> Option<&mut Sheet> {
        let idx = self
            .sheets
            .iter()
            .position(|s| s.name == DATA_SHEET_NAME)
            .unwrap_or(0);
        self.sheets.get_mut(idx)
    }
}
