//! Output namer: filesystem-safe report names under the run directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::conf::{STR_FILE_REPORT_EXT, STR_FILE_REPORT_INFIX};
use crate::run::RunContext;

/// Keep alphanumerics, spaces, hyphens and underscores; drop everything else.
///
/// Idempotent. A name made only of dropped characters yields `""`.
pub fn derive_safe_stem(supplier_name: &str) -> String {
    supplier_name
        .chars()
        .filter(|chr| chr.is_alphanumeric() || matches!(chr, ' ' | '-' | '_'))
        .collect()
}

/// `<stem>_PO_Report_<timestamp>.xlsx`
pub fn derive_report_file_name(stem: &str, timestamp: &str) -> String {
    format!("{stem}{STR_FILE_REPORT_INFIX}{timestamp}.{STR_FILE_REPORT_EXT}")
}

/// Full report path for `supplier_name` in this run.
///
/// Two suppliers with the same safe stem map to the same path; the later
/// report replaces the earlier one. See [`SpecStemRegistry`] for the opt-in
/// alternative.
pub fn derive_report_path(supplier_name: &str, ctx: &RunContext) -> PathBuf {
    ctx.dir_run.join(derive_report_file_name(
        &derive_safe_stem(supplier_name),
        &ctx.timestamp,
    ))
}

/// Stems already handed out during one run.
#[derive(Debug, Default, Clone)]
pub struct SpecStemRegistry {
    dict_stem_counts: BTreeMap<String, usize>,
}

impl SpecStemRegistry {
    /// Register `stem`; returns how many times it had been seen before.
    pub fn register(&mut self, stem: &str) -> usize {
        let n_seen = self.dict_stem_counts.entry(stem.to_string()).or_insert(0);
        *n_seen += 1;
        *n_seen - 1
    }

    /// Register `stem` and return it, suffixed `_2`, `_3`, ... on repeats.
    ///
    /// A suffixed stem is itself registered so that it cannot be handed out twice.
    pub fn derive_unique_stem(&mut self, stem: &str) -> String {
        let n_seen = self.register(stem);
        if n_seen == 0 {
            return stem.to_string();
        }
        let mut n_idx = n_seen + 1;
        loop {
            let candidate = format!("{stem}_{n_idx}");
            if self.register(&candidate) == 0 {
                return candidate;
            }
            n_idx += 1;
        }
    }
}
