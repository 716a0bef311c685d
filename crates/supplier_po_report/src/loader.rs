//! Tabular loader: input workbook into a `DataFrame`.

use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, TimeUnit};
use supplier_po_io_xlsx::util::validate_unique_columns;
use supplier_po_io_xlsx::{
    EnumCellValue, STR_SHEET_NAME_DEFAULT, SpecSheetGrid, convert_excel_serial_to_epoch_ms,
    derive_sheet_grid_from_dataframe, read_first_sheet, render_cell_text,
};
use tracing::{debug, info};

use crate::conf::COL_ROW_ID;
use crate::spec::PoReportError;

/// Largest integer an `f64` holds exactly.
const N_F64_INT_EXACT_MAX: f64 = 9_007_199_254_740_992.0;
const N_ROWS_PREVIEW: usize = 5;

/// Column type inferred from the non-empty cells of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnKind {
    Empty,
    Integer,
    Float,
    DateTime,
    Boolean,
    Text,
    /// Cells of different types; typed as text, loaded cells kept aside.
    Mixed,
}

/// Loaded input table.
#[derive(Debug, Clone)]
pub struct SpecPoTable {
    /// Typed table, with [`COL_ROW_ID`] as its last column.
    pub df: DataFrame,
    /// Loaded cells of mixed-type columns by column name, indexed by row id.
    pub dict_cells_mixed: BTreeMap<String, Vec<EnumCellValue>>,
}

impl SpecPoTable {
    /// Rows loaded.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Report grid for `df`, a selection of this table's rows.
    ///
    /// [`COL_ROW_ID`] is dropped. Cells of a mixed-type column that is still
    /// text in `df` are restored to the loaded cells, so numbers stay numbers.
    pub fn derive_report_grid(&self, df: &DataFrame) -> Result<SpecSheetGrid, String> {
        let df_visible = df
            .drop(COL_ROW_ID)
            .map_err(|err| format!("Failed to drop row ids: {err}"))?;
        let mut grid = derive_sheet_grid_from_dataframe(&df_visible, STR_SHEET_NAME_DEFAULT)?;
        if self.dict_cells_mixed.is_empty() {
            return Ok(grid);
        }

        let col_row_id = df
            .column(COL_ROW_ID)
            .map_err(|err| format!("Failed to read row ids: {err}"))?;
        let l_row_ids: Vec<Option<u32>> = col_row_id
            .as_materialized_series()
            .u32()
            .map_err(|err| format!("Failed to read row ids: {err}"))?
            .into_iter()
            .collect();

        for (n_idx_col, col) in df_visible.get_columns().iter().enumerate() {
            if col.dtype() != &DataType::String {
                continue;
            }
            let Some(l_cells) = self.dict_cells_mixed.get(col.name().as_str()) else {
                continue;
            };
            for (n_idx_row, row_id) in l_row_ids.iter().enumerate() {
                let Some(value) = row_id.and_then(|n_id| l_cells.get(n_id as usize)) else {
                    return Err(format!("row id {row_id:?} is not a loaded row"));
                };
                grid.rows[n_idx_row + 1][n_idx_col] = value.clone();
            }
        }
        Ok(grid)
    }
}

/// Load the first worksheet of `path` as a PO table.
///
/// Every column of the sheet is kept. Column types come from the cells:
/// all-integral numbers become `Int64`, other numbers `Float64`, dates
/// `Datetime(ms)`, booleans `Boolean`. A column whose cells disagree is typed
/// as text and its loaded cells are kept in [`SpecPoTable::dict_cells_mixed`].
pub fn load_po_table(path: &Path) -> Result<SpecPoTable, PoReportError> {
    let derive_err = |message: String| PoReportError::Load {
        path: path.to_path_buf(),
        message,
    };

    if !path.is_file() {
        return Err(derive_err("input file does not exist".to_string()));
    }

    let grid = read_first_sheet(path).map_err(derive_err)?;
    let table = derive_po_table_from_grid(&grid).map_err(derive_err)?;

    info!(
        path = %path.display(),
        rows = table.height(),
        cols = table.df.width() - 1,
        cols_mixed = table.dict_cells_mixed.len(),
        "loaded input file"
    );
    debug!("first rows:\n{}", table.df.head(Some(N_ROWS_PREVIEW)));
    Ok(table)
}

/// Convert a cell grid (header in row 0) into a PO table.
///
/// Body rows with no value in any column are skipped.
pub fn derive_po_table_from_grid(grid: &SpecSheetGrid) -> Result<SpecPoTable, String> {
    let Some(header) = grid.rows.first() else {
        return Err("worksheet has no header row".to_string());
    };

    let mut l_colnames: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(n_idx, value)| match value {
            EnumCellValue::None => format!("Unnamed: {n_idx}"),
            _ => render_cell_text(value),
        })
        .collect();
    l_colnames.push(COL_ROW_ID.to_string());
    validate_unique_columns(&l_colnames)?;
    l_colnames.pop();

    let l_rows_body: Vec<&Vec<EnumCellValue>> = grid.rows[1..]
        .iter()
        .filter(|row| row.iter().any(|value| *value != EnumCellValue::None))
        .collect();

    let mut l_columns = Vec::with_capacity(l_colnames.len() + 1);
    let mut dict_cells_mixed = BTreeMap::new();
    for (n_idx_col, c_name) in l_colnames.iter().enumerate() {
        let l_values: Vec<&EnumCellValue> =
            l_rows_body.iter().map(|row| &row[n_idx_col]).collect();
        let kind = derive_column_kind(&l_values);
        if kind == EnumColumnKind::Mixed {
            dict_cells_mixed.insert(
                c_name.clone(),
                l_values.iter().map(|value| (*value).clone()).collect(),
            );
        }
        l_columns.push(derive_column(c_name, kind, &l_values)?);
    }
    let n_rows = u32::try_from(l_rows_body.len())
        .map_err(|_| format!("row count overflow: {}", l_rows_body.len()))?;
    l_columns.push(Column::new(
        COL_ROW_ID.into(),
        (0..n_rows).collect::<Vec<u32>>(),
    ));

    let df = DataFrame::new(l_columns).map_err(|err| format!("Failed to build table: {err}"))?;
    Ok(SpecPoTable {
        df,
        dict_cells_mixed,
    })
}

fn derive_column_kind(values: &[&EnumCellValue]) -> EnumColumnKind {
    let mut kind = EnumColumnKind::Empty;
    for value in values {
        let kind_cell = match value {
            EnumCellValue::None => continue,
            EnumCellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= N_F64_INT_EXACT_MAX {
                    EnumColumnKind::Integer
                } else {
                    EnumColumnKind::Float
                }
            }
            EnumCellValue::DateTime(_) => EnumColumnKind::DateTime,
            EnumCellValue::Boolean(_) => EnumColumnKind::Boolean,
            EnumCellValue::String(_) | EnumCellValue::Error(_) => EnumColumnKind::Text,
        };
        kind = match (kind, kind_cell) {
            (EnumColumnKind::Empty, other) => other,
            (a, b) if a == b => a,
            (EnumColumnKind::Integer, EnumColumnKind::Float)
            | (EnumColumnKind::Float, EnumColumnKind::Integer) => EnumColumnKind::Float,
            _ => return EnumColumnKind::Mixed,
        };
    }
    kind
}

fn derive_column(
    name: &str,
    kind: EnumColumnKind,
    values: &[&EnumCellValue],
) -> Result<Column, String> {
    let column = match kind {
        EnumColumnKind::Integer => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| match value {
                    EnumCellValue::Number(n) => Some(*n as i64),
                    _ => None,
                })
                .collect::<Vec<Option<i64>>>(),
        ),
        EnumColumnKind::Float => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| match value {
                    EnumCellValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect::<Vec<Option<f64>>>(),
        ),
        EnumColumnKind::DateTime => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| match value {
                    EnumCellValue::DateTime(serial) => {
                        Some(convert_excel_serial_to_epoch_ms(*serial))
                    }
                    _ => None,
                })
                .collect::<Vec<Option<i64>>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|err| format!("Failed to type column {name:?} as datetime: {err}"))?,
        EnumColumnKind::Boolean => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| match value {
                    EnumCellValue::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<Option<bool>>>(),
        ),
        EnumColumnKind::Empty | EnumColumnKind::Text | EnumColumnKind::Mixed => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| match value {
                    EnumCellValue::None => None,
                    _ => Some(render_cell_text(value)),
                })
                .collect::<Vec<Option<String>>>(),
        ),
    };
    Ok(column)
}
