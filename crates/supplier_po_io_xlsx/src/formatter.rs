//! Presentation pass over an already written workbook.
//!
//! The file is reopened, its first worksheet rebuilt cell by cell with header
//! and body formats, column widths and a frozen header, then saved over the
//! same path. Cell values are carried through unchanged.

use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::conf::{N_LEN_CELL_BLANK, STR_NUM_FORMAT_DATETIME};
use crate::reader::read_first_sheet;
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecColumnWidthPolicy, SpecSheetGrid, SpecXlsxPresentation,
    SpecXlsxReport,
};
use crate::util::{
    calculate_column_width, cast_col_num, cast_row_num, derive_rust_xlsx_format,
    derive_xlsx_error_text, render_cell_text, write_cell_with_format,
};

/// Reopen `path`, apply `presentation` to its first worksheet and overwrite it.
pub fn format_xlsx_file(
    path: &Path,
    presentation: &SpecXlsxPresentation,
) -> Result<SpecXlsxReport, String> {
    let grid = read_first_sheet(path)?;

    let mut report = SpecXlsxReport {
        sheet_name: grid.sheet_name.clone(),
        n_rows: grid.height(),
        n_cols: grid.width(),
        ..Default::default()
    };
    if grid.height() == 0 {
        report.warn(format!("Worksheet {:?} is empty.", grid.sheet_name));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&grid.sheet_name)
        .map_err(derive_xlsx_error_text)?;

    let fmt_header = derive_rust_xlsx_format(&presentation.fmt_header);
    let fmt_body_left = derive_rust_xlsx_format(&derive_body_format(
        &EnumCellValue::None,
        &presentation.fmt_body,
    ));
    let fmt_body_right = derive_rust_xlsx_format(&derive_body_format(
        &EnumCellValue::Number(0.0),
        &presentation.fmt_body,
    ));
    let fmt_body_datetime = derive_rust_xlsx_format(&derive_body_format(
        &EnumCellValue::DateTime(0.0),
        &presentation.fmt_body,
    ));

    for (n_idx_row, row) in grid.rows.iter().enumerate() {
        for (n_idx_col, value) in row.iter().enumerate() {
            if let EnumCellValue::Error(text) = value {
                report.warn(format!(
                    "Error cell at row {} column {} rewritten as text {text:?}.",
                    n_idx_row + 1,
                    n_idx_col + 1
                ));
            }

            let format = if n_idx_row == 0 {
                &fmt_header
            } else {
                match value {
                    EnumCellValue::DateTime(_) => &fmt_body_datetime,
                    _ if value.is_numeric() => &fmt_body_right,
                    _ => &fmt_body_left,
                }
            };
            write_cell_with_format(worksheet, n_idx_row, n_idx_col, value, format)?;
        }
    }

    report.widths = plan_column_widths(&grid, &presentation.policy_width);
    // rust_xlsxwriter stores character widths with cell padding added, so the
    // saved `<col width>` is slightly larger than the planned width.
    for (n_idx_col, n_width) in report.widths.iter().enumerate() {
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, *n_width)
            .map_err(derive_xlsx_error_text)?;
    }

    if presentation.row_freeze > 0 {
        worksheet
            .set_freeze_panes(cast_row_num(presentation.row_freeze)?, 0)
            .map_err(derive_xlsx_error_text)?;
    }

    workbook.save(path).map_err(derive_xlsx_error_text)?;
    debug!(
        path = %path.display(),
        rows = report.n_rows,
        cols = report.n_cols,
        "formatted worksheet"
    );
    Ok(report)
}

/// Body format for one value: right-aligned numbers, left-aligned everything else.
pub fn derive_body_format(value: &EnumCellValue, fmt_body: &SpecCellFormat) -> SpecCellFormat {
    let c_align = if value.is_numeric() { "right" } else { "left" };
    let mut fmt = fmt_body.with_(SpecCellFormat {
        align: Some(c_align.to_string()),
        ..Default::default()
    });
    if matches!(value, EnumCellValue::DateTime(_)) {
        fmt.num_format = Some(STR_NUM_FORMAT_DATETIME.to_string());
    }
    fmt
}

/// Width per column from the longest cell text (header included), clamped by policy.
///
/// A blank cell counts as [`N_LEN_CELL_BLANK`] characters.
pub fn plan_column_widths(grid: &SpecSheetGrid, policy: &SpecColumnWidthPolicy) -> Vec<f64> {
    let mut l_len_max = vec![0usize; grid.width()];
    for row in &grid.rows {
        for (n_idx_col, value) in row.iter().enumerate() {
            let n_len = match value {
                EnumCellValue::None => N_LEN_CELL_BLANK,
                _ => render_cell_text(value).chars().count(),
            };
            l_len_max[n_idx_col] = usize::max(l_len_max[n_idx_col], n_len);
        }
    }
    l_len_max
        .into_iter()
        .map(|n_len| calculate_column_width(n_len, policy))
        .collect()
}
