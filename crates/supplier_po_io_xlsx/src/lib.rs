//! `supplier_po_io_xlsx`:
//! XLSX kernel used by the supplier PO report pipeline.
//!
//! - `conf`      : constants and default presets
//! - `spec`      : value/format/report models
//! - `util`      : pure helper functions
//! - `reader`    : first-sheet reader (`calamine`)
//! - `writer`    : raw table writer (`rust_xlsxwriter`)
//! - `formatter` : reopen-and-style pass
pub mod conf;
pub mod formatter;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, STR_SHEET_NAME_DEFAULT,
    derive_default_xlsx_presentation,
};
pub use formatter::{format_xlsx_file, plan_column_widths};
pub use reader::read_first_sheet;
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecColumnWidthPolicy, SpecSheetGrid, SpecXlsxPresentation,
    SpecXlsxReport,
};
pub use util::{
    convert_epoch_ms_to_excel_serial, convert_excel_serial_to_datetime,
    convert_excel_serial_to_epoch_ms, render_cell_text,
};
pub use writer::{
    derive_cell_value_from_any_value, derive_sheet_grid_from_dataframe, write_dataframe_to_xlsx,
    write_sheet_grid_to_xlsx,
};
