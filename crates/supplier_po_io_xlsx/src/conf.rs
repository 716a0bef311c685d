//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecColumnWidthPolicy, SpecXlsxPresentation};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sheet name used when the caller does not provide one.
pub const STR_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Number format attached to date/time cells.
pub const STR_NUM_FORMAT_DATETIME: &str = "yyyy-mm-dd hh:mm:ss";

/// Days between the Excel 1900 epoch (1899-12-30) and the Unix epoch.
pub const N_DAYS_EXCEL_EPOCH_TO_UNIX: f64 = 25_569.0;
/// Milliseconds per day.
pub const N_MS_PER_DAY: f64 = 86_400_000.0;

/// Header fill color.
pub const STR_COLOR_HEADER_FILL: &str = "#366092";
/// Header font color.
pub const STR_COLOR_HEADER_FONT: &str = "#FFFFFF";
/// Font family for header and body cells.
pub const STR_FONT_NAME_DEFAULT: &str = "Calibri";

/// Column width padding in characters before scaling.
pub const N_WIDTH_COLUMN_PADDING: usize = 2;
/// Scale factor from character count to column width units.
pub const N_WIDTH_COLUMN_FACTOR: f64 = 1.2;
/// Column width upper clamp.
pub const N_WIDTH_COLUMN_MAX: f64 = 50.0;
/// Length a blank cell contributes to width inference (`"None"`).
pub const N_LEN_CELL_BLANK: usize = 4;

/// Build the default header cell format.
pub fn derive_default_header_format() -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some(STR_FONT_NAME_DEFAULT.to_string()),
        font_size: Some(11),
        bold: Some(true),
        font_color: Some(STR_COLOR_HEADER_FONT.to_string()),
        bg_color: Some(STR_COLOR_HEADER_FILL.to_string()),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        border: Some(true),
        ..Default::default()
    }
}

/// Build the default body cell format (alignment is decided per cell).
pub fn derive_default_body_format() -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some(STR_FONT_NAME_DEFAULT.to_string()),
        font_size: Some(10),
        border: Some(true),
        ..Default::default()
    }
}

/// Build default presentation preset used by [`crate::formatter::format_xlsx_file`].
pub fn derive_default_xlsx_presentation() -> SpecXlsxPresentation {
    SpecXlsxPresentation {
        fmt_header: derive_default_header_format(),
        fmt_body: derive_default_body_format(),
        policy_width: SpecColumnWidthPolicy::default(),
        row_freeze: 1,
    }
}
