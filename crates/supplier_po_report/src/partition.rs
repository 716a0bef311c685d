//! Partitioner: one sub-table per distinct supplier.

use std::collections::HashMap;

use polars::prelude::{DataFrame, IdxCa, IdxSize};
use tracing::info;

use crate::conf::COL_SUPPLIER_NAME;
use crate::spec::PoReportError;

/// Rows of the preprocessed table that belong to one supplier.
#[derive(Debug, Clone)]
pub struct SupplierPartition {
    /// Supplier name exactly as in the input (no trimming).
    pub supplier_name: String,
    /// Matching rows in preprocessed order.
    pub df: DataFrame,
}

/// Map every supplier to its row indices in one pass, in order of first appearance.
///
/// Names are compared exactly: `"Acme"` and `"Acme "` are different suppliers.
pub fn plan_supplier_rows<'a>(
    suppliers: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, Vec<IdxSize>)> {
    let mut l_groups: Vec<(String, Vec<IdxSize>)> = Vec::new();
    let mut dict_pos: HashMap<&'a str, usize> = HashMap::new();

    for (n_idx_row, c_supplier) in suppliers.into_iter().enumerate() {
        let n_pos = *dict_pos.entry(c_supplier).or_insert_with(|| {
            l_groups.push((c_supplier.to_string(), Vec::new()));
            l_groups.len() - 1
        });
        l_groups[n_pos].1.push(n_idx_row as IdxSize);
    }
    l_groups
}

/// Split a preprocessed table into supplier partitions.
///
/// Expects a non-null `String` supplier column, as produced by
/// [`crate::preprocess::preprocess_po_table`].
pub fn partition_by_supplier(df: &DataFrame) -> Result<Vec<SupplierPartition>, PoReportError> {
    let col_supplier = df
        .column(COL_SUPPLIER_NAME)
        .map_err(|err| PoReportError::Schema(err.to_string()))?;
    let ca_supplier = col_supplier
        .as_materialized_series()
        .str()
        .map_err(|err| PoReportError::Schema(err.to_string()))?;

    let mut l_suppliers = Vec::with_capacity(ca_supplier.len());
    for (n_idx, value) in ca_supplier.into_iter().enumerate() {
        let Some(c_supplier) = value else {
            return Err(PoReportError::Schema(format!(
                "{COL_SUPPLIER_NAME:?} at row {}: missing supplier",
                n_idx + 1
            )));
        };
        l_suppliers.push(c_supplier);
    }

    let l_partitions = plan_supplier_rows(l_suppliers)
        .into_iter()
        .map(|(supplier_name, l_idx)| {
            let df_part = df
                .take(&IdxCa::from_vec("idx".into(), l_idx))
                .map_err(|err| PoReportError::Schema(err.to_string()))?;
            Ok(SupplierPartition {
                supplier_name,
                df: df_part,
            })
        })
        .collect::<Result<Vec<_>, PoReportError>>()?;

    info!(suppliers = l_partitions.len(), "partitioned PO table by supplier");
    Ok(l_partitions)
}
