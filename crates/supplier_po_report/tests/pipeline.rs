use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use supplier_po_io_xlsx::{
    EnumCellValue, SpecSheetGrid, SpecXlsxReport, convert_epoch_ms_to_excel_serial,
    read_first_sheet,
};
use supplier_po_report::{
    PoReportError, ReportStages, RunContext, SpecPoReportOptions, XlsxReportStages,
    run_po_report, run_with_stages,
};

const TS: &str = "20240105_101500";

fn derive_serial(date: &str) -> f64 {
    let ms = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    convert_epoch_ms_to_excel_serial(ms)
}

fn write_input(path: &Path, rows: &[(&str, f64, &str)]) {
    let fmt_date = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_idx_col, c_name) in ["PO Number", "Po Creation Date", "PO Qty Due", "Supplier Name"]
        .iter()
        .enumerate()
    {
        worksheet.write_string(0, n_idx_col as u16, *c_name).unwrap();
    }
    for (n_idx, (date, qty, supplier)) in rows.iter().enumerate() {
        let n_row = n_idx as u32 + 1;
        worksheet
            .write_string(n_row, 0, format!("PO-{}", n_idx + 1))
            .unwrap();
        worksheet
            .write_number_with_format(n_row, 1, derive_serial(date), &fmt_date)
            .unwrap();
        worksheet.write_number(n_row, 2, *qty).unwrap();
        worksheet.write_string(n_row, 3, *supplier).unwrap();
    }
    workbook.save(path).unwrap();
}

fn create_options(dir: &Path, rows: &[(&str, f64, &str)]) -> SpecPoReportOptions {
    let path_input = dir.join("Input Data").join("PO_Report.xlsx");
    fs::create_dir_all(path_input.parent().unwrap()).unwrap();
    write_input(&path_input, rows);
    SpecPoReportOptions {
        path_input,
        dir_output_root: dir.join("Output Data"),
        ..Default::default()
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut l_names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    l_names.sort();
    l_names
}

fn read_column(path: &Path, name: &str) -> Vec<EnumCellValue> {
    let grid = read_first_sheet(path).unwrap();
    let n_idx = grid.rows[0]
        .iter()
        .position(|cell| *cell == EnumCellValue::String(name.to_string()))
        .unwrap();
    grid.rows[1..].iter().map(|row| row[n_idx].clone()).collect()
}

#[test]
fn acme_and_beta_produce_one_report_each() {
    let dir = tempfile::tempdir().unwrap();
    let options = create_options(
        dir.path(),
        &[
            ("2024-01-02", 5.0, "Acme"),
            ("2024-01-01", 0.0, "Acme"),
            ("2024-01-03", 2.0, "Beta/Co"),
        ],
    );
    let ctx = RunContext::new(&options.dir_output_root, TS);

    let report = run_with_stages(&options, &ctx, &XlsxReportStages::default()).unwrap();

    assert_eq!(
        ctx.dir_run,
        dir.path()
            .join("Output Data")
            .join("Supplier_PO_Reports")
            .join(format!("PO_Reports_{TS}"))
    );
    assert_eq!(
        list_files(&ctx.dir_run),
        vec![
            format!("Acme_PO_Report_{TS}.xlsx"),
            format!("BetaCo_PO_Report_{TS}.xlsx"),
        ]
    );
    assert_eq!(report.cnt_rows_loaded, 3);
    assert_eq!(report.cnt_rows_kept, 2);
    assert_eq!(report.created_count(), 2);
    assert_eq!(report.failure_count(), 0);

    let path_acme = ctx.dir_run.join(format!("Acme_PO_Report_{TS}.xlsx"));
    let grid = read_first_sheet(&path_acme).unwrap();
    assert_eq!(grid.height(), 2);
    assert_eq!(
        grid.rows[0],
        ["PO Number", "Po Creation Date", "PO Qty Due", "Supplier Name"]
            .iter()
            .map(|c| EnumCellValue::String(c.to_string()))
            .collect::<Vec<_>>()
    );
    assert_eq!(grid.rows[1][0], EnumCellValue::String("PO-1".to_string()));
    assert_eq!(
        grid.rows[1][1],
        EnumCellValue::DateTime(derive_serial("2024-01-02"))
    );
    assert_eq!(grid.rows[1][2], EnumCellValue::Number(5.0));
}

#[test]
fn reports_are_pure_sorted_and_conserve_kept_rows() {
    let dir = tempfile::tempdir().unwrap();
    let options = create_options(
        dir.path(),
        &[
            ("2024-03-01", 1.0, "Acme"),
            ("2024-01-15", 4.0, "Gamma"),
            ("2024-02-01", 0.0, "Acme"),
            ("2024-01-10", 2.5, "Acme"),
            ("2024-02-20", 3.0, "Gamma"),
            ("2024-01-10", 7.0, "Acme"),
            ("2024-01-01", 0.0, "Delta"),
        ],
    );
    let ctx = RunContext::new(&options.dir_output_root, TS);

    let report = run_with_stages(&options, &ctx, &XlsxReportStages::default()).unwrap();

    // Delta only has a zero-quantity row
    assert_eq!(report.cnt_suppliers, 2);
    assert_eq!(report.cnt_rows_kept, 5);

    let mut n_rows_total = 0;
    for path in &report.reports {
        let l_suppliers = read_column(path, "Supplier Name");
        let c_first = l_suppliers[0].clone();
        assert!(l_suppliers.iter().all(|v| *v == c_first));

        let l_dates: Vec<f64> = read_column(path, "Po Creation Date")
            .into_iter()
            .map(|v| match v {
                EnumCellValue::DateTime(serial) => serial,
                other => panic!("unexpected date cell {other:?}"),
            })
            .collect();
        assert!(l_dates.windows(2).all(|w| w[0] <= w[1]));

        assert!(
            read_column(path, "PO Qty Due")
                .iter()
                .all(|v| *v != EnumCellValue::Number(0.0))
        );
        n_rows_total += l_suppliers.len();
    }
    assert_eq!(n_rows_total, 5);

    // equal dates keep input order
    let path_acme = ctx.dir_run.join(format!("Acme_PO_Report_{TS}.xlsx"));
    assert_eq!(
        read_column(&path_acme, "PO Number"),
        ["PO-4", "PO-6", "PO-1"]
            .iter()
            .map(|c| EnumCellValue::String(c.to_string()))
            .collect::<Vec<_>>()
    );
}

#[test]
fn mixed_type_column_keeps_each_cell_type() {
    let dir = tempfile::tempdir().unwrap();
    let path_input = dir.path().join("PO_Report.xlsx");
    let fmt_date = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_idx_col, c_name) in ["Po Creation Date", "PO Qty Due", "Supplier Name", "PO Number"]
        .iter()
        .enumerate()
    {
        worksheet.write_string(0, n_idx_col as u16, *c_name).unwrap();
    }
    worksheet
        .write_number_with_format(1, 0, derive_serial("2024-01-02"), &fmt_date)
        .unwrap();
    worksheet.write_number(1, 1, 3.0).unwrap();
    worksheet.write_string(1, 2, "Acme").unwrap();
    worksheet.write_number(1, 3, 1001.0).unwrap();
    worksheet
        .write_number_with_format(2, 0, derive_serial("2024-01-01"), &fmt_date)
        .unwrap();
    worksheet.write_number(2, 1, 4.0).unwrap();
    worksheet.write_string(2, 2, "Acme").unwrap();
    worksheet.write_string(2, 3, "A-1").unwrap();
    workbook.save(&path_input).unwrap();

    let options = SpecPoReportOptions {
        path_input,
        dir_output_root: dir.path().join("Output Data"),
        ..Default::default()
    };
    let ctx = RunContext::new(&options.dir_output_root, TS);

    let report = run_with_stages(&options, &ctx, &XlsxReportStages::default()).unwrap();
    assert_eq!(report.created_count(), 1);

    let grid = read_first_sheet(&report.reports[0]).unwrap();
    assert_eq!(grid.width(), 4);
    // sorted by date: the text PO comes first
    assert_eq!(grid.rows[1][3], EnumCellValue::String("A-1".to_string()));
    assert_eq!(grid.rows[2][3], EnumCellValue::Number(1001.0));
}

#[test]
fn missing_input_fails_without_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let options = SpecPoReportOptions {
        path_input: dir.path().join("Input Data").join("PO_Report.xlsx"),
        dir_output_root: dir.path().join("Output Data"),
        ..Default::default()
    };

    let err = run_po_report(&options).unwrap_err();

    assert!(matches!(err, PoReportError::Load { .. }));
    assert!(err.is_fatal());
    assert!(!options.dir_output_root.exists());
}

#[test]
fn missing_required_column_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path_input = dir.path().join("PO_Report.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Supplier Name").unwrap();
    worksheet.write_string(1, 0, "Acme").unwrap();
    workbook.save(&path_input).unwrap();

    let options = SpecPoReportOptions {
        path_input,
        dir_output_root: dir.path().join("Output Data"),
        ..Default::default()
    };
    let err = run_po_report(&options).unwrap_err();

    assert!(matches!(err, PoReportError::Schema(_)));
    assert!(!options.dir_output_root.exists());
}

struct LockedFileStages {
    inner: XlsxReportStages,
    supplier_locked: &'static str,
    path_locked: std::cell::RefCell<Option<PathBuf>>,
}

impl ReportStages for LockedFileStages {
    fn write(
        &self,
        supplier_name: &str,
        grid: &SpecSheetGrid,
        path: &Path,
    ) -> Result<(), String> {
        if supplier_name == self.supplier_locked {
            *self.path_locked.borrow_mut() = Some(path.to_path_buf());
        }
        self.inner.write(supplier_name, grid, path)
    }

    fn format(&self, path: &Path) -> Result<SpecXlsxReport, String> {
        if self.path_locked.borrow().as_deref() == Some(path) {
            return Err("Permission denied".to_string());
        }
        self.inner.format(path)
    }
}

#[test]
fn format_failure_keeps_going_with_remaining_suppliers() {
    let dir = tempfile::tempdir().unwrap();
    let options = create_options(
        dir.path(),
        &[
            ("2024-01-01", 1.0, "Acme"),
            ("2024-01-02", 2.0, "Beta"),
            ("2024-01-03", 3.0, "Gamma"),
        ],
    );
    let ctx = RunContext::new(&options.dir_output_root, TS);
    let stages = LockedFileStages {
        inner: XlsxReportStages::default(),
        supplier_locked: "Acme",
        path_locked: std::cell::RefCell::new(None),
    };

    let report = run_with_stages(&options, &ctx, &stages).unwrap();

    assert_eq!(report.created_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert!(!report.failures[0].is_fatal());
    assert_eq!(
        report.reports,
        vec![
            ctx.dir_run.join(format!("Beta_PO_Report_{TS}.xlsx")),
            ctx.dir_run.join(format!("Gamma_PO_Report_{TS}.xlsx")),
        ]
    );
    // raw report for the failed supplier is left in place
    assert_eq!(list_files(&ctx.dir_run).len(), 3);
    assert!(report.to_string().contains("created=2 failed=1"));
}

#[test]
fn header_only_input_creates_empty_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    let options = create_options(dir.path(), &[]);
    let ctx = RunContext::new(&options.dir_output_root, TS);

    let report = run_with_stages(&options, &ctx, &XlsxReportStages::default()).unwrap();

    assert_eq!(report.cnt_suppliers, 0);
    assert!(ctx.dir_run.is_dir());
    assert!(list_files(&ctx.dir_run).is_empty());
}
