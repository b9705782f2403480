//! Machine-readable exports and the combined artifact writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{markdown_report, svg_chart, ReportError};
use crate::bench::BenchmarkReport;

pub const MARKDOWN_FILE: &str = "report.md";
pub const JSON_FILE: &str = "cv_results.json";
pub const CSV_FILE: &str = "cv_results.csv";
pub const SVG_FILE: &str = "comparison.svg";

/// One CSV line: a grid candidate of one model.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    model: &'a str,
    param: &'a str,
    value: String,
    mean_fit_time: f64,
    std_fit_time: f64,
    mean_score_time: f64,
    std_score_time: f64,
    mean_test_score: f64,
    std_test_score: f64,
    rank_test_score: usize,
    mean_train_score: Option<f64>,
    std_train_score: Option<f64>,
}

fn create(path: &Path) -> Result<BufWriter<File>, ReportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_text(path: &Path, text: &str) -> Result<(), ReportError> {
    fs::write(path, text).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the full report as pretty-printed JSON.
pub fn write_json(report: &BenchmarkReport, path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write one flat row per (model, candidate).
pub fn write_csv(report: &BenchmarkReport, path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(create(path)?);
    for result in &report.models {
        for (i, c) in result.cv_results.iter().enumerate() {
            writer.serialize(CsvRow {
                model: &result.model,
                param: &result.param_name,
                value: result.candidate_label(i),
                mean_fit_time: c.mean_fit_time,
                std_fit_time: c.std_fit_time,
                mean_score_time: c.mean_score_time,
                std_score_time: c.std_score_time,
                mean_test_score: c.mean_test_score,
                std_test_score: c.std_test_score,
                rank_test_score: c.rank_test_score,
                mean_train_score: c.mean_train_score,
                std_train_score: c.std_train_score,
            })?;
        }
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every artifact into `out_dir`, creating it if needed.
///
/// Returns the written paths in the order markdown, JSON, CSV, SVG.
pub fn write_all(report: &BenchmarkReport, out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ReportError> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let markdown = out_dir.join(MARKDOWN_FILE);
    write_text(&markdown, &markdown_report(report))?;
    let json = out_dir.join(JSON_FILE);
    write_json(report, &json)?;
    let csv = out_dir.join(CSV_FILE);
    write_csv(report, &csv)?;
    let svg = out_dir.join(SVG_FILE);
    write_text(&svg, &svg_chart(report))?;

    tracing::info!(out_dir = %out_dir.display(), "report written");
    Ok(vec![markdown, json, csv, svg])
}
