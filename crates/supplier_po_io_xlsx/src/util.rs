//! Stateless helper utilities used by the reader, writer and formatter.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Worksheet, XlsxError};

use crate::conf::{
    N_DAYS_EXCEL_EPOCH_TO_UNIX, N_LEN_EXCEL_SHEET_NAME_MAX, N_MS_PER_DAY, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecCellFormat, SpecColumnWidthPolicy};

////////////////////////////////////////////////////////////////////////////////
// #region DateConversion

/// Convert Unix epoch milliseconds to an Excel serial number.
pub fn convert_epoch_ms_to_excel_serial(ms: i64) -> f64 {
    ms as f64 / N_MS_PER_DAY + N_DAYS_EXCEL_EPOCH_TO_UNIX
}

/// Convert an Excel serial number to Unix epoch milliseconds (rounded).
pub fn convert_excel_serial_to_epoch_ms(serial: f64) -> i64 {
    ((serial - N_DAYS_EXCEL_EPOCH_TO_UNIX) * N_MS_PER_DAY).round() as i64
}

/// Convert an Excel serial number to a naive date/time.
pub fn convert_excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(convert_excel_serial_to_epoch_ms(serial))
        .map(|dt| dt.naive_utc())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellText

/// Render a number the way a spreadsheet user reads it (`5`, not `5.0`).
pub fn render_number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Textual representation of one cell; blank cells render as `""`.
pub fn render_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => render_number_text(*n),
        EnumCellValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
        EnumCellValue::DateTime(serial) => match convert_excel_serial_to_datetime(*serial) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => render_number_text(*serial),
        },
        EnumCellValue::Error(s) => s.clone(),
    }
}

/// Final column width from the longest entry length (in characters).
pub fn calculate_column_width(n_len_max: usize, policy: &SpecColumnWidthPolicy) -> f64 {
    let n_width = (n_len_max + policy.padding) as f64 * policy.factor;
    f64::min(n_width, policy.width_max)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RustXlsxWriterGlue

/// Write one normalized value; `format` must carry a date number format for dates.
pub fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) | EnumCellValue::Error(val) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) | EnumCellValue::DateTime(val) => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet
                .write_boolean_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

/// Translate a [`SpecCellFormat`] into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if spec.border.unwrap_or(false) {
        format = format.set_border(FormatBorder::Thin);
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "vcenter" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

/// Checked conversion to a worksheet row number.
pub fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

/// Checked conversion to a worksheet column number.
pub fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

/// Render a `rust_xlsxwriter` error as kernel error text.
pub fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
