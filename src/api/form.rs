//! Entry form fields and their conversion to a [`Record`]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, IntakeResult};
use crate::types::{Record, HEADER};

/// Raw HTML form submission. The page posts every field as text so that bad
/// input can be reported with the field's label. The JSON API skips this type
/// and takes a typed [`Record`], checked by [`check_record`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordForm {
    pub program_name: String,
    pub program_code: String,
    pub program_budget: String,
    pub first_contract_name: String,
    pub first_contractor_name: String,
    pub contract_start_date: String,
    pub contract_finish_date: String,
    pub contract_value: String,
}

impl RecordForm {
    /// Convert to a record. Blank dates take `today`, blank amounts are 0.
    /// Text fields are kept exactly as typed.
    pub fn to_record(&self, today: NaiveDate) -> IntakeResult<Record> {
        Ok(Record {
            program_name: self.program_name.clone(),
            program_code: self.program_code.clone(),
            program_budget: parse_amount(HEADER[2], &self.program_budget)?,
            first_contract_name: self.first_contract_name.clone(),
            first_contractor_name: self.first_contractor_name.clone(),
            contract_start_date: parse_date(HEADER[5], &self.contract_start_date, today)?,
            contract_finish_date: parse_date(HEADER[6], &self.contract_finish_date, today)?,
            contract_value: parse_amount(HEADER[7], &self.contract_value)?,
        })
    }
}

/// Parse a non-negative decimal amount
fn parse_amount(label: &str, raw: &str) -> IntakeResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| IntakeError::Validation(format!("{} must be a number, got '{}'", label, raw)))?;
    check_amount(label, value)?;
    Ok(value)
}

/// Parse a `YYYY-MM-DD` date
fn parse_date(label: &str, raw: &str, today: NaiveDate) -> IntakeResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(today);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        IntakeError::Validation(format!("{} must be a date (YYYY-MM-DD), got '{}'", label, raw))
    })
}

fn check_amount(label: &str, value: f64) -> IntakeResult<()> {
    if !value.is_finite() {
        return Err(IntakeError::Validation(format!("{} must be a finite number", label)));
    }
    if value < 0.0 {
        return Err(IntakeError::Validation(format!("{} must be >= 0", label)));
    }
    Ok(())
}

/// Numeric checks for records that arrive already typed (JSON API)
pub fn check_record(record: &Record) -> IntakeResult<()> {
    check_amount(HEADER[2], record.program_budget)?;
    check_amount(HEADER[7], record.contract_value)
}
