//! Runner and report artifacts without the CLI.

use std::fs;

use ensemble_bench::bench::{run_benchmark, BenchmarkConfig, DatasetConfig};
use ensemble_bench::model_selection::ParamGrid;
use ensemble_bench::report::{markdown_report, write_all, CSV_FILE, JSON_FILE, MARKDOWN_FILE, SVG_FILE};
use ensemble_bench::Error;

fn small_config() -> BenchmarkConfig {
    let mut config = BenchmarkConfig::default();
    config.dataset = DatasetConfig::Synthetic { rows: 400, seed: 7 };
    config.cv.refit = false;
    config.n_jobs = 2;
    config.models[0].grid = ParamGrid::new().with("n_estimators", [2, 5]);
    config.models[1].grid = ParamGrid::new().with("max_iter", [5, 20]);
    config
}

#[test]
fn benchmark_writes_all_artifacts() {
    let report = run_benchmark(&small_config()).unwrap();
    assert_eq!(report.dataset.n_samples, 400);
    assert_eq!(report.n_splits, 4);
    assert!(report.n_cores >= 1);
    assert_eq!(report.models.len(), 2);
    assert!(report.models.iter().all(|m| m.n_jobs == 2));

    let dir = tempfile::tempdir().unwrap();
    write_all(&report, dir.path()).unwrap();

    let markdown = fs::read_to_string(dir.path().join(MARKDOWN_FILE)).unwrap();
    assert_eq!(markdown, markdown_report(&report));
    assert!(markdown.contains("## Hist Gradient Boosting"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(JSON_FILE)).unwrap()).unwrap();
    assert_eq!(json["models"].as_array().unwrap().len(), 2);
    assert_eq!(json["models"][0]["cv_results"].as_array().unwrap().len(), 2);

    let csv = fs::read_to_string(dir.path().join(CSV_FILE)).unwrap();
    // Header plus one row per candidate.
    assert_eq!(csv.lines().count(), 5);

    let svg = fs::read_to_string(dir.path().join(SVG_FILE)).unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn quick_mode_shrinks_the_experiment() {
    let mut config = small_config();
    config.dataset = DatasetConfig::Synthetic { rows: 1_000, seed: 7 };
    config.models[1].grid = ParamGrid::new().with("max_iter", [5, 10, 15, 20]);
    let report = run_benchmark(&config.quick()).unwrap();
    assert!(report.quick);
    assert_eq!(report.dataset.n_samples, 100);
    assert_eq!(report.models[1].cv_results.len(), 3);
}

#[test]
fn missing_dataset_file_fails() {
    let mut config = small_config();
    config.dataset = DatasetConfig::California {
        path: "does/not/exist/cal_housing.data".into(),
    };
    assert!(matches!(run_benchmark(&config), Err(Error::Load(_))));
}

#[test]
fn csv_dataset_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let mut text = String::from("a,b,y\n");
    for i in 0..60 {
        let a = i as f32 / 10.0;
        let b = (i % 7) as f32;
        text.push_str(&format!("{a},{b},{}\n", 2.0 * a - b));
    }
    fs::write(&path, text).unwrap();

    let mut config = small_config();
    config.dataset = DatasetConfig::from_path(&path, Some("y"));
    config.cv.n_splits = 3;
    let report = run_benchmark(&config).unwrap();
    assert_eq!(report.dataset.n_samples, 60);
    assert_eq!(report.dataset.feature_names, vec!["a".to_string(), "b".to_string()]);
}
