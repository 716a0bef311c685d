//! Run options, error taxonomy and run report.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use supplier_po_io_xlsx::SpecXlsxPresentation;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Input options for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPoReportOptions {
    /// Input workbook.
    pub path_input: PathBuf,
    /// Root under which `Supplier_PO_Reports/PO_Reports_<ts>/` is created.
    pub dir_output_root: PathBuf,
    /// Presentation rules for the formatter pass.
    pub presentation: SpecXlsxPresentation,
    /// Suffix `_2`, `_3`, ... onto stems already used in this run instead of
    /// overwriting the earlier report.
    pub if_unique_file_names: bool,
}

impl Default for SpecPoReportOptions {
    fn default() -> Self {
        crate::conf::derive_default_po_report_options()
    }
}

/// Pipeline position of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRunStage {
    /// Nothing read yet.
    Init,
    /// Input table loaded.
    Loaded,
    /// Table typed, sorted and filtered.
    Preprocessed,
    /// Processing the supplier at this zero-based position.
    PerSupplier(usize),
    /// All suppliers visited.
    Done,
}

impl fmt::Display for EnumRunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Loaded => write!(f, "loaded"),
            Self::Preprocessed => write!(f, "preprocessed"),
            Self::PerSupplier(idx) => write!(f, "supplier#{}", idx + 1),
            Self::Done => write!(f, "done"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by the report pipeline.
///
/// `Load`, `Schema` and `Directory` abort the run. `Write` and `Format` are
/// scoped to one supplier and collected in [`ReportRun::failures`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoReportError {
    /// Input file missing, unreadable or malformed.
    #[error("Failed to load {}: {message}", path.display())]
    Load {
        /// Input path.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },
    /// Required column missing or a value of the wrong type.
    #[error("Schema error: {0}")]
    Schema(String),
    /// Raw report for one supplier could not be written.
    #[error("Failed to write report for {supplier:?} at {}: {message}", path.display())]
    Write {
        /// Supplier name as found in the input.
        supplier: String,
        /// Target report path.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },
    /// Report was written but could not be formatted; the raw file stays on disk.
    #[error("Failed to format report for {supplier:?} at {}: {message}", path.display())]
    Format {
        /// Supplier name as found in the input.
        supplier: String,
        /// Report path.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },
    /// Run output directory could not be created.
    #[error("Failed to create output directory {}: {message}", path.display())]
    Directory {
        /// Directory path.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },
}

impl PoReportError {
    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::Schema(_) | Self::Directory { .. }
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Outcome of one completed run.
#[derive(Debug, Default, Clone)]
pub struct ReportRun {
    /// Directory holding this run's reports.
    pub dir_run: PathBuf,
    /// Rows read from the input.
    pub cnt_rows_loaded: u64,
    /// Rows left after dropping zero-quantity lines.
    pub cnt_rows_kept: u64,
    /// Distinct suppliers.
    pub cnt_suppliers: u64,
    /// Reports written and formatted.
    pub reports: Vec<PathBuf>,
    /// Per-supplier failures (write or format).
    pub failures: Vec<PoReportError>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportRun {
    /// Number of reports written and formatted.
    pub fn created_count(&self) -> usize {
        self.reports.len()
    }

    /// Number of suppliers whose report failed.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_loaded".to_string(), self.cnt_rows_loaded);
        dict_counts.insert("cnt_rows_kept".to_string(), self.cnt_rows_kept);
        dict_counts.insert("cnt_suppliers".to_string(), self.cnt_suppliers);
        dict_counts.insert("cnt_created".to_string(), self.created_count() as u64);
        dict_counts.insert("cnt_failed".to_string(), self.failure_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} rows_loaded={} rows_kept={} suppliers={} created={} failed={} warnings={}",
            dict_counts["cnt_rows_loaded"],
            dict_counts["cnt_rows_kept"],
            dict_counts["cnt_suppliers"],
            dict_counts["cnt_created"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PO]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
