//! Workbook writer - in-memory [`Workbook`] → Excel (.xlsx) bytes

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, Sheet, Workbook};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

/// Serializes a [`Workbook`] to an .xlsx blob
pub struct WorkbookWriter<'a> {
    workbook: &'a Workbook,
    date_format: Format,
    datetime_format: Format,
}

impl<'a> WorkbookWriter<'a> {
    /// Create a writer for the given workbook
    pub fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            date_format: Format::new().set_num_format("yyyy-mm-dd"),
            datetime_format: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }

    /// Serialize the whole workbook into a fresh byte buffer
    pub fn to_bytes(&self) -> IntakeResult<Vec<u8>> {
        let mut xlsx = XlsxWorkbook::new();

        for sheet in &self.workbook.sheets {
            self.write_sheet(&mut xlsx, sheet)?;
        }

        xlsx.save_to_buffer()
            .map_err(|e| IntakeError::Serialization(format!("Failed to save Excel file: {}", e)))
    }

    /// Write one sheet, cell by cell
    fn write_sheet(&self, xlsx: &mut XlsxWorkbook, sheet: &Sheet) -> IntakeResult<()> {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(|e| {
            IntakeError::Serialization(format!(
                "Failed to set worksheet name '{}': {}",
                sheet.name, e
            ))
        })?;

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                self.write_cell(worksheet, row_idx as u32, col_idx as u16, cell)?;
            }
        }

        Ok(())
    }

    /// Write a single cell; empty cells are skipped
    fn write_cell(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        cell: &CellValue,
    ) -> IntakeResult<()> {
        let result = match cell {
            CellValue::Empty => return Ok(()),
            CellValue::Text(s) => worksheet.write_string(row, col, s),
            CellValue::Number(n) => worksheet.write_number(row, col, *n),
            CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
            CellValue::DateTime(serial) => {
                let format = if serial.fract() == 0.0 {
                    &self.date_format
                } else {
                    &self.datetime_format
                };
                worksheet.write_number_with_format(row, col, *serial, format)
            }
            // rust_xlsxwriter has no error-cell writer; keep the literal visible
            CellValue::Error(e) => worksheet.write_string(row, col, e),
        };

        result.map(|_| ()).map_err(|e| {
            IntakeError::Serialization(format!(
                "Failed to write cell ({}, {}): {}",
                row + 1,
                col + 1,
                e
            ))
        })
    }
}
