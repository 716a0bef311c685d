//! Workbook reader: first worksheet into a normalized cell grid.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};

use crate::spec::{EnumCellValue, SpecSheetGrid};
use crate::util::convert_epoch_ms_to_excel_serial;

const TUP_ISO_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Read the first worksheet of a workbook (xlsx/xlsm/xls/xlsb/ods).
///
/// The returned grid is anchored at `A1`: leading empty rows/columns that the
/// file omits are padded with [`EnumCellValue::None`].
pub fn read_first_sheet(path: &Path) -> Result<SpecSheetGrid, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|err| format!("Failed to open workbook {}: {err}", path.display()))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(format!("Workbook contains no sheets: {}", path.display()));
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| format!("Failed to read sheet {sheet_name:?}: {err}"))?;

    if range.is_empty() {
        return Ok(SpecSheetGrid {
            sheet_name,
            rows: vec![],
        });
    }

    let (n_row_start, n_col_start) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));
    let (n_height, n_width) = range.get_size();

    let mut l_rows =
        vec![vec![EnumCellValue::None; n_col_start + n_width]; n_row_start + n_height];
    for (n_idx_row, row) in range.rows().enumerate() {
        for (n_idx_col, cell) in row.iter().enumerate() {
            l_rows[n_row_start + n_idx_row][n_col_start + n_idx_col] =
                derive_cell_value_from_data(cell);
        }
    }

    Ok(SpecSheetGrid {
        sheet_name,
        rows: l_rows,
    })
}

/// Map one `calamine` cell into the shared value model.
pub fn derive_cell_value_from_data(cell: &Data) -> EnumCellValue {
    match cell {
        Data::Empty => EnumCellValue::None,
        Data::String(s) => EnumCellValue::String(s.clone()),
        Data::Float(n) => EnumCellValue::Number(*n),
        Data::Int(n) => EnumCellValue::Number(*n as f64),
        Data::Bool(b) => EnumCellValue::Boolean(*b),
        Data::DateTime(dt) => EnumCellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => match parse_iso_datetime(s) {
            Some(dt) => EnumCellValue::DateTime(convert_epoch_ms_to_excel_serial(
                dt.and_utc().timestamp_millis(),
            )),
            None => EnumCellValue::String(s.clone()),
        },
        Data::DurationIso(s) => EnumCellValue::String(s.clone()),
        Data::Error(err) => EnumCellValue::Error(err.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    for c_fmt in TUP_ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, c_fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
