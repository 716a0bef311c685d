//! Run orchestrator: load, preprocess, partition, then write and format one
//! report per supplier.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use supplier_po_io_xlsx::{
    SpecSheetGrid, SpecXlsxPresentation, SpecXlsxReport, format_xlsx_file,
    write_sheet_grid_to_xlsx,
};
use tracing::{error, info, warn};

use crate::conf::{STR_DIR_REPORTS, STR_DIR_RUN_PREFIX, STR_TIMESTAMP_FORMAT};
use crate::loader::{SpecPoTable, load_po_table};
use crate::naming::{SpecStemRegistry, derive_report_file_name, derive_safe_stem};
use crate::partition::{SupplierPartition, partition_by_supplier};
use crate::preprocess::preprocess_po_table;
use crate::spec::{EnumRunStage, PoReportError, ReportRun, SpecPoReportOptions};

////////////////////////////////////////////////////////////////////////////////
// #region RunContext

/// Per-run values shared read-only by every supplier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Run timestamp, `YYYYMMDD_HHMMSS`.
    pub timestamp: String,
    /// `<root>/Supplier_PO_Reports/PO_Reports_<timestamp>`.
    pub dir_run: PathBuf,
}

impl RunContext {
    /// Build a context for `timestamp` under `dir_output_root`.
    pub fn new(dir_output_root: &Path, timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            dir_run: dir_output_root
                .join(STR_DIR_REPORTS)
                .join(format!("{STR_DIR_RUN_PREFIX}{timestamp}")),
        }
    }

    /// Build a context stamped with the current local time.
    pub fn capture(dir_output_root: &Path) -> Self {
        let timestamp = Local::now().format(STR_TIMESTAMP_FORMAT).to_string();
        Self::new(dir_output_root, &timestamp)
    }
}

/// Create the run directory; its parent is created if missing, the run
/// directory itself must not exist yet.
pub fn create_run_directory(ctx: &RunContext) -> Result<(), PoReportError> {
    let derive_err = |path: &Path, message: String| PoReportError::Directory {
        path: path.to_path_buf(),
        message,
    };

    if let Some(dir_parent) = ctx.dir_run.parent()
        && !dir_parent.as_os_str().is_empty()
    {
        if !dir_parent.is_dir() {
            info!(path = %dir_parent.display(), "creating output directory");
        }
        fs::create_dir_all(dir_parent).map_err(|err| derive_err(dir_parent, err.to_string()))?;
    }

    fs::create_dir(&ctx.dir_run).map_err(|err| {
        if err.kind() == ErrorKind::AlreadyExists {
            derive_err(&ctx.dir_run, "directory already exists".to_string())
        } else {
            derive_err(&ctx.dir_run, err.to_string())
        }
    })?;
    info!(path = %ctx.dir_run.display(), "created run directory");
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Stages

/// Per-supplier write and format steps.
pub trait ReportStages {
    /// Write the raw report `grid` of `supplier_name` to `path`.
    fn write(&self, supplier_name: &str, grid: &SpecSheetGrid, path: &Path) -> Result<(), String>;

    /// Apply presentation to the report already written at `path`.
    fn format(&self, path: &Path) -> Result<SpecXlsxReport, String>;
}

/// XLSX implementation: `rust_xlsxwriter` write, then reopen-and-style.
#[derive(Debug, Clone, Default)]
pub struct XlsxReportStages {
    presentation: SpecXlsxPresentation,
}

impl XlsxReportStages {
    /// Stages applying `presentation` in the format step.
    pub fn new(presentation: SpecXlsxPresentation) -> Self {
        Self { presentation }
    }
}

impl ReportStages for XlsxReportStages {
    fn write(&self, _: &str, grid: &SpecSheetGrid, path: &Path) -> Result<(), String> {
        write_sheet_grid_to_xlsx(grid, path).map(|_| ())
    }

    fn format(&self, path: &Path) -> Result<SpecXlsxReport, String> {
        format_xlsx_file(path, &self.presentation)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Orchestration

/// Run the whole pipeline with the XLSX stages and a fresh run timestamp.
pub fn run_po_report(options: &SpecPoReportOptions) -> Result<ReportRun, PoReportError> {
    let ctx = RunContext::capture(&options.dir_output_root);
    let stages = XlsxReportStages::new(options.presentation.clone());
    run_with_stages(options, &ctx, &stages)
}

/// Run the pipeline for `ctx` with the given supplier stages.
///
/// Load, schema and directory failures are returned. Write and format
/// failures are logged, collected in [`ReportRun::failures`] and the next
/// supplier is processed.
pub fn run_with_stages(
    options: &SpecPoReportOptions,
    ctx: &RunContext,
    stages: &dyn ReportStages,
) -> Result<ReportRun, PoReportError> {
    let mut stage = EnumRunStage::Init;
    info!(%stage, path = %options.path_input.display(), "starting PO report run");

    let table = load_po_table(&options.path_input)?;
    stage = EnumRunStage::Loaded;
    info!(%stage, "input loaded");

    let df_clean = preprocess_po_table(&table.df)?;
    stage = EnumRunStage::Preprocessed;
    info!(%stage, "input preprocessed");

    let l_partitions = partition_by_supplier(&df_clean)?;
    info!(suppliers = l_partitions.len(), "unique suppliers found");

    create_run_directory(ctx)?;

    let mut report = ReportRun {
        dir_run: ctx.dir_run.clone(),
        cnt_rows_loaded: table.height() as u64,
        cnt_rows_kept: df_clean.height() as u64,
        cnt_suppliers: l_partitions.len() as u64,
        ..Default::default()
    };

    let mut registry = SpecStemRegistry::default();
    for (n_idx, partition) in l_partitions.iter().enumerate() {
        stage = EnumRunStage::PerSupplier(n_idx);

        let stem = derive_safe_stem(&partition.supplier_name);
        let stem = if options.if_unique_file_names {
            registry.derive_unique_stem(&stem)
        } else {
            if registry.register(&stem) > 0 {
                let msg = format!(
                    "Supplier {:?} reuses file stem {stem:?}; the earlier report is overwritten.",
                    partition.supplier_name
                );
                warn!(%stage, "{msg}");
                report.warnings.push(msg);
            }
            stem
        };
        let path_report = ctx
            .dir_run
            .join(derive_report_file_name(&stem, &ctx.timestamp));

        match process_supplier(&table, partition, &path_report, stages) {
            Ok(report_fmt) => {
                for msg in report_fmt.warnings {
                    warn!(%stage, supplier = %partition.supplier_name, "{msg}");
                    report.warnings.push(msg);
                }
                info!(
                    %stage,
                    supplier = %partition.supplier_name,
                    rows = partition.df.height(),
                    file = %path_report.display(),
                    "created and formatted PO report"
                );
                report.reports.push(path_report);
            }
            Err(err) => {
                error!(%stage, supplier = %partition.supplier_name, "{err}");
                report.failures.push(err);
            }
        }
    }

    stage = EnumRunStage::Done;
    info!(%stage, dir = %ctx.dir_run.display(), "{report}");
    Ok(report)
}

fn process_supplier(
    table: &SpecPoTable,
    partition: &SupplierPartition,
    path: &Path,
    stages: &dyn ReportStages,
) -> Result<SpecXlsxReport, PoReportError> {
    let derive_write_err = |message: String| PoReportError::Write {
        supplier: partition.supplier_name.clone(),
        path: path.to_path_buf(),
        message,
    };
    let grid = table
        .derive_report_grid(&partition.df)
        .map_err(&derive_write_err)?;
    stages
        .write(&partition.supplier_name, &grid, path)
        .map_err(derive_write_err)?;
    stages.format(path).map_err(|message| PoReportError::Format {
        supplier: partition.supplier_name.clone(),
        path: path.to_path_buf(),
        message,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::test_support::{SpecPoRow, write_po_fixture};

    /// Records calls and fails the format step for one supplier.
    struct FailingFormatStages {
        inner: XlsxReportStages,
        path_fail_fragment: String,
        l_calls: RefCell<Vec<String>>,
    }

    impl ReportStages for FailingFormatStages {
        fn write(
            &self,
            supplier_name: &str,
            grid: &SpecSheetGrid,
            path: &Path,
        ) -> Result<(), String> {
            self.l_calls.borrow_mut().push(format!("write:{supplier_name}"));
            self.inner.write(supplier_name, grid, path)
        }

        fn format(&self, path: &Path) -> Result<SpecXlsxReport, String> {
            let c_path = path.to_string_lossy().to_string();
            self.l_calls.borrow_mut().push(format!("format:{c_path}"));
            if c_path.contains(&self.path_fail_fragment) {
                return Err("file is locked".to_string());
            }
            self.inner.format(path)
        }
    }

    fn create_options(dir: &Path) -> SpecPoReportOptions {
        let path_input = dir.join("PO_Report.xlsx");
        write_po_fixture(
            &path_input,
            &[
                SpecPoRow::new("2024-01-02", 5.0, "Acme"),
                SpecPoRow::new("2024-01-01", 0.0, "Acme"),
                SpecPoRow::new("2024-01-03", 2.0, "Beta/Co"),
                SpecPoRow::new("2024-01-04", 1.0, "Gamma"),
            ],
        );
        SpecPoReportOptions {
            path_input,
            dir_output_root: dir.join("Output Data"),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_context_paths() {
        let ctx = RunContext::new(Path::new("root"), "20240101_120000");
        assert_eq!(ctx.timestamp, "20240101_120000");
        assert_eq!(
            ctx.dir_run,
            Path::new("root/Supplier_PO_Reports/PO_Reports_20240101_120000")
        );
        assert_eq!(RunContext::capture(Path::new("root")).timestamp.len(), 15);
    }

    #[test]
    fn test_create_run_directory_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), "20240101_120000");
        create_run_directory(&ctx).unwrap();
        assert!(ctx.dir_run.is_dir());

        let err = create_run_directory(&ctx).unwrap_err();
        assert!(matches!(err, PoReportError::Directory { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_format_failure_does_not_stop_next_supplier() {
        let dir = tempfile::tempdir().unwrap();
        let options = create_options(dir.path());
        let ctx = RunContext::new(&options.dir_output_root, "20240101_120000");
        let stages = FailingFormatStages {
            inner: XlsxReportStages::default(),
            path_fail_fragment: "BetaCo_PO_Report".to_string(),
            l_calls: RefCell::new(Vec::new()),
        };

        let report = run_with_stages(&options, &ctx, &stages).unwrap();

        assert_eq!(report.cnt_suppliers, 3);
        assert_eq!(report.created_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            &report.failures[0],
            PoReportError::Format { supplier, .. } if supplier == "Beta/Co"
        ));
        // the unformatted file stays on disk
        let path_beta = ctx.dir_run.join("BetaCo_PO_Report_20240101_120000.xlsx");
        assert!(path_beta.is_file());

        let l_calls = stages.l_calls.borrow();
        assert_eq!(l_calls.len(), 6);
        assert_eq!(l_calls[4], "write:Gamma");
    }

    #[test]
    fn test_write_failure_is_recorded_as_write_error() {
        struct FailingWriteStages;
        impl ReportStages for FailingWriteStages {
            fn write(&self, _: &str, _: &SpecSheetGrid, _: &Path) -> Result<(), String> {
                Err("disk full".to_string())
            }
            fn format(&self, _: &Path) -> Result<SpecXlsxReport, String> {
                panic!("format must not run after a failed write");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let options = create_options(dir.path());
        let ctx = RunContext::new(&options.dir_output_root, "20240101_120000");

        let report = run_with_stages(&options, &ctx, &FailingWriteStages).unwrap();
        assert_eq!(report.created_count(), 0);
        assert_eq!(report.failure_count(), 3);
        assert!(
            report
                .failures
                .iter()
                .all(|err| matches!(err, PoReportError::Write { .. }))
        );
    }

    #[test]
    fn test_missing_input_aborts_before_creating_directory() {
        let dir = tempfile::tempdir().unwrap();
        let options = SpecPoReportOptions {
            path_input: dir.path().join("absent.xlsx"),
            dir_output_root: dir.path().join("Output Data"),
            ..Default::default()
        };
        let ctx = RunContext::new(&options.dir_output_root, "20240101_120000");

        let err = run_with_stages(&options, &ctx, &XlsxReportStages::default()).unwrap_err();
        assert!(matches!(err, PoReportError::Load { .. }));
        assert!(!options.dir_output_root.exists());
    }

    #[test]
    fn test_unique_file_names_keeps_both_colliding_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path_input = dir.path().join("PO_Report.xlsx");
        write_po_fixture(
            &path_input,
            &[
                SpecPoRow::new("2024-01-01", 1.0, "A/B"),
                SpecPoRow::new("2024-01-02", 2.0, "AB"),
            ],
        );
        let ctx = RunContext::new(&dir.path().join("out"), "20240101_120000");

        let options_default = SpecPoReportOptions {
            path_input: path_input.clone(),
            dir_output_root: dir.path().join("out"),
            ..Default::default()
        };
        let report = run_with_stages(&options_default, &ctx, &XlsxReportStages::default()).unwrap();
        assert_eq!(report.created_count(), 2);
        assert_eq!(report.reports[0], report.reports[1]);
        assert_eq!(report.warnings.len(), 1);

        let ctx_unique = RunContext::new(&dir.path().join("out"), "20240101_120001");
        let options_unique = SpecPoReportOptions {
            if_unique_file_names: true,
            ..options_default
        };
        let report = run_with_stages(&options_unique, &ctx_unique, &XlsxReportStages::default())
            .unwrap();
        assert_eq!(
            report.reports,
            vec![
                ctx_unique.dir_run.join("AB_PO_Report_20240101_120001.xlsx"),
                ctx_unique.dir_run.join("AB_2_PO_Report_20240101_120001.xlsx"),
            ]
        );
    }
}
