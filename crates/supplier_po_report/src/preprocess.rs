//! Preprocessor: type the date column, stable-sort by it, drop zero-quantity rows.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataFrame, DataType, IdxCa, IdxSize, NamedFrom, TimeUnit};
use supplier_po_io_xlsx::convert_excel_serial_to_epoch_ms;
use tracing::info;

use crate::conf::{
    COL_PO_CREATION_DATE, COL_PO_QTY_DUE, COL_SUPPLIER_NAME, TUP_COLS_REQUIRED, TUP_DATE_FORMATS,
    TUP_DATETIME_FORMATS,
};
use crate::spec::PoReportError;

/// Return a new table with `Po Creation Date` as `Datetime(ms)`, rows ordered
/// by it (stable for equal dates) and rows with `PO Qty Due == 0` removed.
///
/// `df` is left untouched; columns other than the date and supplier columns
/// keep their values and types.
pub fn preprocess_po_table(df: &DataFrame) -> Result<DataFrame, PoReportError> {
    validate_required_columns(df)?;

    let l_date_ms = derive_creation_date_ms(
        df.column(COL_PO_CREATION_DATE)
            .map_err(derive_schema_error)?,
    )?;
    let l_qty_due = derive_qty_due(df.column(COL_PO_QTY_DUE).map_err(derive_schema_error)?)?;
    let col_supplier = derive_supplier_column(
        df.column(COL_SUPPLIER_NAME)
            .map_err(derive_schema_error)?,
    )?;

    let col_date = Column::new(COL_PO_CREATION_DATE.into(), l_date_ms.clone())
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(derive_schema_error)?;

    let mut df_typed = df.clone();
    df_typed.with_column(col_date).map_err(derive_schema_error)?;
    df_typed
        .with_column(col_supplier)
        .map_err(derive_schema_error)?;

    let l_idx_kept = plan_sorted_kept_rows(&l_date_ms, &l_qty_due);
    let df_out = df_typed
        .take(&IdxCa::from_vec("idx".into(), l_idx_kept))
        .map_err(derive_schema_error)?;

    info!(
        rows_in = df.height(),
        rows_kept = df_out.height(),
        rows_dropped = df.height() - df_out.height(),
        "preprocessed PO table"
    );
    Ok(df_out)
}

/// Row order after sorting by date (stable) and dropping zero quantities.
///
/// A missing quantity is not zero and is kept.
pub fn plan_sorted_kept_rows(date_ms: &[i64], qty_due: &[Option<f64>]) -> Vec<IdxSize> {
    let mut l_idx: Vec<usize> = (0..date_ms.len()).collect();
    l_idx.sort_by_key(|n_idx| date_ms[*n_idx]);
    l_idx
        .into_iter()
        .filter(|n_idx| qty_due[*n_idx] != Some(0.0))
        .map(|n_idx| n_idx as IdxSize)
        .collect()
}

/// Parse one text date with the accepted layouts.
pub fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for c_fmt in TUP_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, c_fmt) {
            return Some(dt);
        }
    }
    for c_fmt in TUP_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, c_fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn validate_required_columns(df: &DataFrame) -> Result<(), PoReportError> {
    let l_colnames = df.get_column_names_str();
    let l_missing: Vec<&str> = TUP_COLS_REQUIRED
        .iter()
        .copied()
        .filter(|c_name| !l_colnames.contains(c_name))
        .collect();
    if l_missing.is_empty() {
        return Ok(());
    }
    Err(PoReportError::Schema(format!(
        "missing required column(s): {l_missing:?}"
    )))
}

fn derive_creation_date_ms(col: &Column) -> Result<Vec<i64>, PoReportError> {
    let l_values: Vec<Option<i64>> = match col.dtype() {
        DataType::Datetime(time_unit, _) => {
            let n_divisor = match time_unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            derive_i64_values(col)?
                .into_iter()
                .map(|v| v.map(|n| n.div_euclid(n_divisor)))
                .collect()
        }
        DataType::Date => {
            let col_days = col.cast(&DataType::Int32).map_err(derive_schema_error)?;
            col_days
                .as_materialized_series()
                .i32()
                .map_err(derive_schema_error)?
                .into_iter()
                .map(|v| v.map(|days| days as i64 * 86_400_000))
                .collect()
        }
        dtype if dtype.is_numeric() => {
            let col_serial = col.cast(&DataType::Float64).map_err(derive_schema_error)?;
            col_serial
                .as_materialized_series()
                .f64()
                .map_err(derive_schema_error)?
                .into_iter()
                .map(|v| v.map(convert_excel_serial_to_epoch_ms))
                .collect()
        }
        DataType::String => {
            let ca = col.as_materialized_series().str().map_err(derive_schema_error)?;
            let mut l_ms = Vec::with_capacity(ca.len());
            for (n_idx, value) in ca.into_iter().enumerate() {
                let Some(text) = value else {
                    l_ms.push(None);
                    continue;
                };
                let Some(dt) = parse_datetime_text(text) else {
                    return Err(PoReportError::Schema(format!(
                        "{COL_PO_CREATION_DATE:?} at row {}: cannot parse {text:?} as a date",
                        n_idx + 1
                    )));
                };
                l_ms.push(Some(dt.and_utc().timestamp_millis()));
            }
            l_ms
        }
        dtype => {
            return Err(PoReportError::Schema(format!(
                "{COL_PO_CREATION_DATE:?} has unsupported type {dtype}"
            )));
        }
    };

    l_values
        .into_iter()
        .enumerate()
        .map(|(n_idx, value)| {
            value.ok_or_else(|| {
                PoReportError::Schema(format!(
                    "{COL_PO_CREATION_DATE:?} at row {}: missing date",
                    n_idx + 1
                ))
            })
        })
        .collect()
}

fn derive_i64_values(col: &Column) -> Result<Vec<Option<i64>>, PoReportError> {
    let col_i64 = col.cast(&DataType::Int64).map_err(derive_schema_error)?;
    Ok(col_i64
        .as_materialized_series()
        .i64()
        .map_err(derive_schema_error)?
        .into_iter()
        .collect())
}

fn derive_qty_due(col: &Column) -> Result<Vec<Option<f64>>, PoReportError> {
    let col_f64 = match col.dtype() {
        dtype if dtype.is_numeric() => col.cast(&DataType::Float64),
        DataType::String => col.strict_cast(&DataType::Float64),
        dtype => {
            return Err(PoReportError::Schema(format!(
                "{COL_PO_QTY_DUE:?} has unsupported type {dtype}"
            )));
        }
    }
    .map_err(|err| {
        PoReportError::Schema(format!("{COL_PO_QTY_DUE:?} is not numeric: {err}"))
    })?;

    Ok(col_f64
        .as_materialized_series()
        .f64()
        .map_err(derive_schema_error)?
        .into_iter()
        .collect())
}

fn derive_supplier_column(col: &Column) -> Result<Column, PoReportError> {
    let col_str = match col.dtype() {
        DataType::String => col.clone(),
        _ => col.cast(&DataType::String).map_err(derive_schema_error)?,
    };
    let ca = col_str
        .as_materialized_series()
        .str()
        .map_err(derive_schema_error)?;
    if let Some(n_idx) = ca.into_iter().position(|value| value.is_none()) {
        return Err(PoReportError::Schema(format!(
            "{COL_SUPPLIER_NAME:?} at row {}: missing supplier",
            n_idx + 1
        )));
    }
    Ok(col_str)
}

fn derive_schema_error(err: impl std::fmt::Display) -> PoReportError {
    PoReportError::Schema(err.to_string())
}
