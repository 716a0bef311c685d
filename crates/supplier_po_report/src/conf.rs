//! PO report constants and default preset factories.

use std::path::PathBuf;

use supplier_po_io_xlsx::derive_default_xlsx_presentation;

use crate::spec::SpecPoReportOptions;

/// Creation date column.
pub const COL_PO_CREATION_DATE: &str = "Po Creation Date";
/// Outstanding quantity column.
pub const COL_PO_QTY_DUE: &str = "PO Qty Due";
/// Supplier identity column.
pub const COL_SUPPLIER_NAME: &str = "Supplier Name";
/// Hidden column holding each loaded row's position; never written to reports.
pub const COL_ROW_ID: &str = "__po_row_id";
/// Columns every input must carry.
pub const TUP_COLS_REQUIRED: [&str; 3] =
    [COL_PO_CREATION_DATE, COL_PO_QTY_DUE, COL_SUPPLIER_NAME];

/// Default input workbook.
pub const STR_PATH_INPUT_DEFAULT: &str = "Input Data/PO_Report.xlsx";
/// Default output root.
pub const STR_DIR_OUTPUT_ROOT_DEFAULT: &str = "Output Data";
/// Folder under the output root that collects runs.
pub const STR_DIR_REPORTS: &str = "Supplier_PO_Reports";
/// Prefix of the per-run folder.
pub const STR_DIR_RUN_PREFIX: &str = "PO_Reports_";
/// Infix between the safe stem and the timestamp in report names.
pub const STR_FILE_REPORT_INFIX: &str = "_PO_Report_";
/// Report file extension.
pub const STR_FILE_REPORT_EXT: &str = "xlsx";
/// Run timestamp layout (second resolution).
pub const STR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Layouts accepted for text dates, tried in order.
pub const TUP_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];
/// Date-only layouts accepted for text dates, tried after [`TUP_DATETIME_FORMATS`].
pub const TUP_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Build default run options.
pub fn derive_default_po_report_options() -> SpecPoReportOptions {
    SpecPoReportOptions {
        path_input: PathBuf::from(STR_PATH_INPUT_DEFAULT),
        dir_output_root: PathBuf::from(STR_DIR_OUTPUT_ROOT_DEFAULT),
        presentation: derive_default_xlsx_presentation(),
        if_unique_file_names: false,
    }
}
