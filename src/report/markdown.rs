//! Markdown summary tables.

use std::fmt::Write;

use crate::bench::{BenchmarkReport, ModelResult};
use crate::model_selection::CandidateResult;

fn format_seconds(value: f64) -> String {
    if value < 0.01 {
        format!("{value:.5}")
    } else {
        format!("{value:.3}")
    }
}

fn format_row(label: &str, c: &CandidateResult, is_best: bool) -> String {
    let cells = [
        label.to_string(),
        format_seconds(c.mean_fit_time),
        format_seconds(c.std_fit_time),
        format_seconds(c.mean_score_time),
        format_seconds(c.std_score_time),
        format!("{:.4}", c.mean_test_score),
        format!("{:.4}", c.std_test_score),
        c.rank_test_score.to_string(),
    ];
    let cells: Vec<String> = if is_best {
        cells.into_iter().map(|cell| format!("**{cell}**")).collect()
    } else {
        cells.into_iter().collect()
    };
    format!("| {} |\n", cells.join(" | "))
}

fn model_section(out: &mut String, result: &ModelResult) {
    let _ = writeln!(out, "## {}\n", result.model);
    let _ = writeln!(
        out,
        "Swept `{}` with {} worker thread(s). Best mean test R²: **{:.4}**.\n",
        result.param_name, result.n_jobs, result.best_score
    );
    let _ = writeln!(
        out,
        "| {} | Fit time (s) | Std | Score time (s) | Std | Test R² | Std | Rank |",
        result.param_name
    );
    out.push_str("|---|---|---|---|---|---|---|---|\n");

    let best = result.cv_results.best_index();
    for (i, candidate) in result.cv_results.iter().enumerate() {
        out.push_str(&format_row(&result.candidate_label(i), candidate, best == Some(i)));
    }
    out.push('\n');
}

/// Render the benchmark as a markdown document.
///
/// One table per model with a row per grid candidate; the best-ranked row is
/// bolded.
pub fn markdown_report(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    out.push_str("# Ensemble Regressor Benchmark\n\n");

    let d = &report.dataset;
    let _ = writeln!(out, "**Dataset**: {}\n", d.source);
    out.push_str("| Samples | Features | Target mean | Target std | CV folds | Shuffled | Cores |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    let _ = writeln!(
        out,
        "| {} | {} | {:.4} | {:.4} | {} | {} | {} |\n",
        d.n_samples, d.n_features, d.target_mean, d.target_std, report.n_splits, report.shuffle, report.n_cores
    );
    if report.quick {
        out.push_str("_Quick mode: reduced rows and grids._\n\n");
    }

    for result in &report.models {
        model_section(&mut out, result);
    }

    let _ = writeln!(out, "Total time: {:.1} s", report.total_time);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_one_table_per_model() {
        let report = sample_report();
        let md = markdown_report(&report);
        assert!(md.starts_with("# Ensemble Regressor Benchmark"));
        assert!(md.contains("## Random Forest"));
        assert!(md.contains("## Hist Gradient Boosting"));
        assert!(md.contains("| n_estimators | Fit time (s) |"));
        assert!(md.contains("| max_iter | Fit time (s) |"));
    }

    #[test]
    fn test_best_row_is_bold() {
        let md = markdown_report(&sample_report());
        // Candidate 20 has the higher score in the sample forest.
        assert!(md.contains("| **20** |"));
        assert!(md.contains("| 10 |"));
        assert!(md.contains("**1** |"));
    }

    #[test]
    fn test_seconds_precision() {
        assert_eq!(format_seconds(0.001234), "0.00123");
        assert_eq!(format_seconds(1.23456), "1.235");
    }
}
