use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::fits::{collect_exposure_paths, read_exposure};
use crate::plot::{frames_outside_sky_window, render_charts};
use crate::report::{format_summary, format_table, to_json, write_csv, write_csv_file};
use crate::session::{aggregate_session, DriftReport, Exposure};

pub struct AnalyzeOptions {
    pub output: PathBuf,
    pub format: String,
    pub plate_scale: f64,
    pub reference_pixel: (f64, f64),
    pub plot_dir: Option<PathBuf>,
    pub no_plots: bool,
}

/// Read every exposure, aggregate, then write the CSV and charts.
///
/// Nothing is written unless every exposure was read and aggregated.
pub fn analyze(paths: &[PathBuf], options: &AnalyzeOptions) -> Result<DriftReport> {
    if options.plate_scale <= 0.0 || !options.plate_scale.is_finite() {
        anyhow::bail!("Plate scale must be positive, got {}", options.plate_scale);
    }

    let files = collect_exposure_paths(paths)?;
    info!("Reading {} FITS files", files.len());

    let exposures = files
        .iter()
        .map(|path| read_exposure(path, options.reference_pixel))
        .collect::<Result<Vec<Exposure>>>()?;

    let report = aggregate_session(&exposures, options.plate_scale)?;
    let rows = report.table.rows();

    write_csv_file(&options.output, &rows)?;
    println!("Results are written to {}", options.output.display());

    match options.format.to_lowercase().as_str() {
        "json" => println!("{}", to_json(&report)?),
        "csv" => {
            let mut stdout = std::io::stdout().lock();
            write_csv(&mut stdout, &rows)?;
        }
        "table" => print!("{}", format_table(&rows)),
        "none" => {}
        other => warn!("Unknown output format '{}', printing nothing", other),
    }

    print!("{}", format_summary(&report.summary));

    if !options.no_plots {
        let outside = frames_outside_sky_window(report.table.records());
        if outside > 0 {
            warn!("{} frames fall outside the sky chart window", outside);
        }

        let dir = plot_directory(options);
        let prefix = options
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("drift");
        let charts = render_charts(&report, &dir, prefix)
            .with_context(|| format!("Failed to render charts into {}", dir.display()))?;
        println!("Charts written to {} and {}", charts.position.display(), charts.timeline.display());
    }

    Ok(report)
}

fn plot_directory(options: &AnalyzeOptions) -> PathBuf {
    options.plot_dir.clone().unwrap_or_else(|| {
        options
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}
