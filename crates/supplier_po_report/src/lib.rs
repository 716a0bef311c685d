//! `supplier_po_report`:
//! Split a purchase-order workbook into one formatted report per supplier.
//!
//! - `conf`       : column names, paths and default presets
//! - `spec`       : options, errors and run report
//! - `loader`     : input workbook to `DataFrame`
//! - `preprocess` : typing, sort by creation date, drop zero-quantity rows
//! - `partition`  : one sub-table per supplier
//! - `naming`     : filesystem-safe report names
//! - `run`        : per-run context and orchestration

pub mod conf;
pub mod loader;
pub mod naming;
pub mod partition;
pub mod preprocess;
pub mod run;
pub mod spec;

#[cfg(test)]
mod test_support;

pub use loader::{SpecPoTable, load_po_table};
pub use naming::{SpecStemRegistry, derive_report_path, derive_safe_stem};
pub use partition::{SupplierPartition, partition_by_supplier};
pub use preprocess::preprocess_po_table;
pub use run::{
    ReportStages, RunContext, XlsxReportStages, create_run_directory, run_po_report,
    run_with_stages,
};
pub use spec::{EnumRunStage, PoReportError, ReportRun, SpecPoReportOptions};
