//! Raw report writer: one table into one unstyled worksheet.
//!
//! Presentation is applied afterwards by [`crate::formatter`], on the committed file.

use std::path::Path;

use polars::prelude::{AnyValue, Column, DataFrame, TimeUnit};
use rust_xlsxwriter::{Format, Workbook};

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, STR_NUM_FORMAT_DATETIME};
use crate::spec::{EnumCellValue, SpecSheetGrid, SpecXlsxReport};
use crate::util::{
    convert_epoch_ms_to_excel_serial, derive_xlsx_error_text, sanitize_sheet_name,
    validate_unique_columns, write_cell_with_format,
};

/// Write `df` to `path` with a header row of column names and one row per data row.
pub fn write_dataframe_to_xlsx(
    df: &DataFrame,
    path: &Path,
    sheet_name: &str,
) -> Result<SpecXlsxReport, String> {
    let grid = derive_sheet_grid_from_dataframe(df, sheet_name)?;
    write_sheet_grid_to_xlsx(&grid, path)
}

/// Header row of column names followed by one row of cells per `df` row.
pub fn derive_sheet_grid_from_dataframe(
    df: &DataFrame,
    sheet_name: &str,
) -> Result<SpecSheetGrid, String> {
    let l_colnames_df: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    validate_unique_columns(&l_colnames_df)?;

    let mut l_rows = Vec::with_capacity(df.height() + 1);
    l_rows.push(
        l_colnames_df
            .into_iter()
            .map(EnumCellValue::String)
            .collect::<Vec<_>>(),
    );
    for n_idx_row in 0..df.height() {
        let row = df
            .get_columns()
            .iter()
            .map(|col| derive_cell_value_from_column(col, n_idx_row))
            .collect::<Result<Vec<_>, String>>()?;
        l_rows.push(row);
    }

    Ok(SpecSheetGrid {
        sheet_name: sheet_name.to_string(),
        rows: l_rows,
    })
}

/// Write every cell of `grid` to `path`.
///
/// Blank cells are skipped. Dates carry a date number format so that the
/// value reads back as a date; no other formatting is written.
pub fn write_sheet_grid_to_xlsx(
    grid: &SpecSheetGrid,
    path: &Path,
) -> Result<SpecXlsxReport, String> {
    let (n_height, n_width) = (grid.height(), grid.width());
    if n_height > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Sheet has {} data rows; Excel allows {}.",
            n_height.saturating_sub(1),
            N_NROWS_EXCEL_MAX - 1
        ));
    }
    if n_width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Sheet has {n_width} columns; Excel allows {N_NCOLS_EXCEL_MAX}."
        ));
    }

    let report = SpecXlsxReport {
        sheet_name: sanitize_sheet_name(&grid.sheet_name, "_"),
        n_rows: n_height,
        n_cols: n_width,
        ..Default::default()
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&report.sheet_name)
        .map_err(derive_xlsx_error_text)?;

    let fmt_plain = Format::new();
    let fmt_datetime = Format::new().set_num_format(STR_NUM_FORMAT_DATETIME);

    for (n_idx_row, row) in grid.rows.iter().enumerate() {
        for (n_idx_col, value) in row.iter().enumerate() {
            let format = match value {
                EnumCellValue::None => continue,
                EnumCellValue::DateTime(_) => &fmt_datetime,
                _ => &fmt_plain,
            };
            write_cell_with_format(worksheet, n_idx_row, n_idx_col, value, format)?;
        }
    }

    workbook.save(path).map_err(derive_xlsx_error_text)?;
    Ok(report)
}

fn derive_cell_value_from_column(
    col: &Column,
    n_idx_row: usize,
) -> Result<EnumCellValue, String> {
    let value = col
        .get(n_idx_row)
        .map_err(|err| format!("Failed to access cell value: {err}"))?;
    Ok(derive_cell_value_from_any_value(value))
}

/// Map one Polars scalar into the shared value model.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        AnyValue::Date(days) => {
            EnumCellValue::DateTime(convert_epoch_ms_to_excel_serial(days as i64 * 86_400_000))
        }
        AnyValue::Datetime(val, time_unit, _) => {
            EnumCellValue::DateTime(convert_epoch_ms_to_excel_serial(to_epoch_ms(val, time_unit)))
        }
        AnyValue::DatetimeOwned(val, time_unit, _) => {
            EnumCellValue::DateTime(convert_epoch_ms_to_excel_serial(to_epoch_ms(val, time_unit)))
        }
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn to_epoch_ms(value: i64, time_unit: TimeUnit) -> i64 {
    match time_unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000_000),
        TimeUnit::Microseconds => value.div_euclid(1_000),
        TimeUnit::Milliseconds => value,
    }
}
