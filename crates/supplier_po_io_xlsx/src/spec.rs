//! Shared XLSX specification models.

use crate::conf::{N_WIDTH_COLUMN_FACTOR, N_WIDTH_COLUMN_MAX, N_WIDTH_COLUMN_PADDING};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
///
/// Every field is optional so that presets can be layered with [`SpecCellFormat::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Thin border on all sides.
    pub border: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Normalized cell value shared by the reader, writer and formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Date/time as an Excel serial number (1900 date system).
    DateTime(f64),
    /// Spreadsheet error value kept as its display text (`#N/A`, `#DIV/0!`, ...).
    Error(String),
}

impl EnumCellValue {
    /// Whether the value is right-aligned as a number; booleans count as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, EnumCellValue::Number(_) | EnumCellValue::Boolean(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PresentationSpecification

/// Column width policy: `min((max_len + padding) * factor, width_max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnWidthPolicy {
    /// Characters added to the longest entry before scaling.
    pub padding: usize,
    /// Scale factor from characters to width units.
    pub factor: f64,
    /// Maximum final width.
    pub width_max: f64,
}

impl Default for SpecColumnWidthPolicy {
    fn default() -> Self {
        Self {
            padding: N_WIDTH_COLUMN_PADDING,
            factor: N_WIDTH_COLUMN_FACTOR,
            width_max: N_WIDTH_COLUMN_MAX,
        }
    }
}

/// Presentation rules applied by the formatter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecXlsxPresentation {
    /// Format for every header cell.
    pub fmt_header: SpecCellFormat,
    /// Base format for every body cell; horizontal alignment is set per value.
    pub fmt_body: SpecCellFormat,
    /// Column width inference policy.
    pub policy_width: SpecColumnWidthPolicy,
    /// Number of rows frozen at the top (`1` freezes the header row).
    pub row_freeze: usize,
}

impl Default for SpecXlsxPresentation {
    fn default() -> Self {
        crate::conf::derive_default_xlsx_presentation()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetModels

/// Cell grid of one worksheet, anchored at `A1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Worksheet name.
    pub sheet_name: String,
    /// Rows of cells; every row has the same length.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecSheetGrid {
    /// Number of rows including the header row.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-file write/format report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecXlsxReport {
    /// Worksheet written.
    pub sheet_name: String,
    /// Rows written, header included.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Final column widths (formatter only).
    pub widths: Vec<f64>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
