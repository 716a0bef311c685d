use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use supplier_po_report::conf::{STR_DIR_OUTPUT_ROOT_DEFAULT, STR_PATH_INPUT_DEFAULT};
use supplier_po_report::{SpecPoReportOptions, run_po_report};
use tracing::{error, info, warn};

/// Generate one formatted PO report per supplier.
#[derive(Parser, Debug)]
#[command(name = "supplier-po-report", version, about)]
struct CliArgs {
    /// Input workbook (first sheet is read)
    #[arg(long, short = 'i', value_name = "PATH", default_value = STR_PATH_INPUT_DEFAULT)]
    input: PathBuf,

    /// Output root; reports go to <ROOT>/Supplier_PO_Reports/PO_Reports_<timestamp>/
    #[arg(long, short = 'o', value_name = "DIR", default_value = STR_DIR_OUTPUT_ROOT_DEFAULT)]
    output_root: PathBuf,

    /// Upper bound on column width
    #[arg(long, value_name = "WIDTH")]
    width_max: Option<f64>,

    /// Suffix colliding file names with _2, _3, ... instead of overwriting
    #[arg(long)]
    unique_file_names: bool,

    /// Log filter, e.g. "info" or "supplier_po_report=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl CliArgs {
    fn to_options(&self) -> SpecPoReportOptions {
        let mut options = SpecPoReportOptions {
            path_input: self.input.clone(),
            dir_output_root: self.output_root.clone(),
            if_unique_file_names: self.unique_file_names,
            ..Default::default()
        };
        if let Some(width_max) = self.width_max {
            options.presentation.policy_width.width_max = width_max;
        }
        options
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .try_init();
}

fn run(args: &CliArgs) -> Result<()> {
    let report = run_po_report(&args.to_options())?;
    for path in &report.reports {
        info!(file = %path.display(), "report");
    }
    for err in &report.failures {
        warn!("{err}");
    }
    info!(dir = %report.dir_run.display(), "{report}");
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
