//! Workbook fixtures shared by unit tests.

use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use supplier_po_io_xlsx::convert_epoch_ms_to_excel_serial;

use crate::conf::{COL_PO_CREATION_DATE, COL_PO_QTY_DUE, COL_SUPPLIER_NAME};

/// One input row: date (`YYYY-MM-DD`), due quantity, supplier.
pub struct SpecPoRow {
    pub date: String,
    pub qty: f64,
    pub supplier: String,
}

impl SpecPoRow {
    pub fn new(date: &str, qty: f64, supplier: &str) -> Self {
        Self {
            date: date.to_string(),
            qty,
            supplier: supplier.to_string(),
        }
    }
}

pub fn derive_serial(date: &str) -> f64 {
    let ms = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    convert_epoch_ms_to_excel_serial(ms)
}

/// Write an input workbook with the three required columns plus `PO Number`.
pub fn write_po_fixture(path: &Path, rows: &[SpecPoRow]) {
    let fmt_date = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let l_colnames = [COL_PO_CREATION_DATE, COL_PO_QTY_DUE, COL_SUPPLIER_NAME, "PO Number"];
    for (n_idx_col, c_name) in l_colnames.iter().enumerate() {
        worksheet.write_string(0, n_idx_col as u16, *c_name).unwrap();
    }
    for (n_idx, row) in rows.iter().enumerate() {
        let n_row = n_idx as u32 + 1;
        worksheet
            .write_number_with_format(n_row, 0, derive_serial(&row.date), &fmt_date)
            .unwrap();
        worksheet.write_number(n_row, 1, row.qty).unwrap();
        worksheet.write_string(n_row, 2, &row.supplier).unwrap();
        worksheet
            .write_string(n_row, 3, format!("PO-{}", n_idx + 1))
            .unwrap();
    }
    workbook.save(path).unwrap();
}
