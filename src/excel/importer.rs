//! Workbook reader - Excel (.xlsx) bytes → in-memory [`Workbook`]

use crate::types::{CellValue, Sheet, Workbook};
use calamine::{Data, Range, Reader, Xlsx, XlsxError};
use std::io::Cursor;

/// Reads an .xlsx blob into a [`Workbook`] of raw cell values
pub struct WorkbookReader<'a> {
    bytes: &'a [u8],
}

impl<'a> WorkbookReader<'a> {
    /// Create a reader over a serialized workbook
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Parse every worksheet, keeping sheet order and cell positions
    pub fn read(&self) -> Result<Workbook, XlsxError> {
        let mut xlsx: Xlsx<_> = Xlsx::new(Cursor::new(self.bytes))?;
        let mut workbook = Workbook::new();

        for sheet_name in xlsx.sheet_names() {
            let range = xlsx.worksheet_range(&sheet_name)?;
            workbook.add_sheet(Self::convert_sheet(&sheet_name, &range));
        }

        Ok(workbook)
    }

    /// Convert a calamine range into a sheet anchored at A1
    fn convert_sheet(sheet_name: &str, range: &Range<Data>) -> Sheet {
        let mut sheet = Sheet::new(sheet_name);

        // calamine trims leading empty rows/columns; pad them back so row
        // indexes line up with spreadsheet rows
        let (first_row, first_col) = match range.start() {
            Some((row, col)) => (row as usize, col as usize),
            None => return sheet,
        };

        for _ in 0..first_row {
            sheet.append_row(Vec::new());
        }

        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; first_col];
            cells.extend(row.iter().map(Self::convert_cell));
            sheet.append_row(cells);
        }

        sheet
    }

    /// Map a calamine cell to a raw [`CellValue`]
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell_scalars() {
        assert_eq!(WorkbookReader::convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(
            WorkbookReader::convert_cell(&Data::String("Acme".to_string())),
            CellValue::Text("Acme".to_string())
        );
        assert_eq!(
            WorkbookReader::convert_cell(&Data::Float(1000.5)),
            CellValue::Number(1000.5)
        );
        assert_eq!(
            WorkbookReader::convert_cell(&Data::Int(42)),
            CellValue::Number(42.0)
        );
        assert_eq!(
            WorkbookReader::convert_cell(&Data::Bool(true)),
            CellValue::Bool(true)
        );
    }

    #[test]
    fn test_convert_cell_iso_strings_stay_text() {
        assert_eq!(
            WorkbookReader::convert_cell(&Data::DateTimeIso("2024-01-01".to_string())),
            CellValue::Text("2024-01-01".to_string())
        );
    }

    #[test]
    fn test_read_rejects_garbage() {
        let reader = WorkbookReader::new(b"definitely not a zip archive");
        assert!(reader.read().is_err());
    }

    #[test]
    fn test_read_rejects_empty_input() {
        let reader = WorkbookReader::new(&[]);
        assert!(reader.read().is_err());
    }
}
