//! Comma-separated dataset loaders.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord};

use super::error::DatasetLoadError;
use super::parse_cell;
use crate::data::Dataset;

/// Feature names of the California housing dataset, in column order.
pub const CALIFORNIA_FEATURES: [&str; 8] = [
    "MedInc",
    "HouseAge",
    "AveRooms",
    "AveBedrms",
    "Population",
    "AveOccup",
    "Latitude",
    "Longitude",
];

/// Columns of the raw `cal_housing.data` file.
const RAW_COLUMNS: [&str; 9] = [
    "longitude",
    "latitude",
    "housingMedianAge",
    "totalRooms",
    "totalBedrooms",
    "population",
    "households",
    "medianIncome",
    "medianHouseValue",
];

/// Index of `medianHouseValue` in [`RAW_COLUMNS`].
const TARGET_COLUMN: usize = 8;

/// Target scale: house values are reported in units of $100,000.
const TARGET_SCALE: f32 = 100_000.0;

// =============================================================================
// California housing
// =============================================================================

/// Load the California housing dataset from the raw `cal_housing.data` file.
///
/// The file has nine comma-separated columns (longitude, latitude,
/// housingMedianAge, totalRooms, totalBedrooms, population, households,
/// medianIncome, medianHouseValue). A header row, if present, is skipped.
///
/// Derived features follow the usual convention: rooms, bedrooms and
/// occupants are averaged per household, and the target is the median house
/// value in units of $100,000.
pub fn load_california_housing(path: impl AsRef<Path>) -> Result<Dataset, DatasetLoadError> {
    let path = path.as_ref();
    let file = open(path)?;
    let dataset = read_california_housing(file)?;
    if dataset.is_empty() {
        return Err(DatasetLoadError::Empty(path.to_path_buf()));
    }
    Ok(dataset)
}

fn read_california_housing(reader: impl Read) -> Result<Dataset, DatasetLoadError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<f32> = Vec::new();
    let mut targets: Vec<f32> = Vec::new();
    let mut raw = [0.0f32; 9];

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        if record.len() != RAW_COLUMNS.len() {
            return Err(DatasetLoadError::ColumnCount {
                row: i,
                expected: RAW_COLUMNS.len(),
                got: record.len(),
            });
        }
        if i == 0 && is_header(&record) {
            continue;
        }
        for (c, cell) in record.iter().enumerate() {
            raw[c] = parse_cell(cell)
                .filter(|v| c != TARGET_COLUMN || v.is_finite())
                .ok_or_else(|| DatasetLoadError::Parse {
                    row: i,
                    column: RAW_COLUMNS[c].to_string(),
                    value: cell.to_string(),
                })?;
        }

        let [longitude, latitude, age, rooms, bedrooms, population, households, income, value] = raw;
        rows.extend_from_slice(&[
            income,
            age,
            rooms / households,
            bedrooms / households,
            population,
            population / households,
            latitude,
            longitude,
        ]);
        targets.push(value / TARGET_SCALE);
    }

    let n_rows = targets.len();
    let names = CALIFORNIA_FEATURES.iter().map(|s| s.to_string()).collect();
    Ok(Dataset::from_rows(rows, n_rows, CALIFORNIA_FEATURES.len(), targets, Some(names))?)
}

fn is_header(record: &StringRecord) -> bool {
    record.iter().any(|cell| parse_cell(cell).is_none())
}

// =============================================================================
// Generic CSV
// =============================================================================

/// Load a headered CSV file of numeric columns.
///
/// `target_column` names the regression target; every other column becomes a
/// feature. Empty, `NA` and `nan` feature cells are read as missing values;
/// the target must be a finite number in every row.
pub fn load_csv(path: impl AsRef<Path>, target_column: &str) -> Result<Dataset, DatasetLoadError> {
    let path = path.as_ref();
    let file = open(path)?;
    let dataset = read_csv(file, target_column)?;
    if dataset.is_empty() {
        return Err(DatasetLoadError::Empty(path.to_path_buf()));
    }
    Ok(dataset)
}

fn read_csv(reader: impl Read, target_column: &str) -> Result<Dataset, DatasetLoadError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(|h| h.to_string()).collect();
    let target_idx = headers
        .iter()
        .position(|h| h == target_column)
        .ok_or_else(|| DatasetLoadError::MissingColumn(target_column.to_string()))?;

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(c, _)| c != target_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut rows: Vec<f32> = Vec::new();
    let mut targets: Vec<f32> = Vec::new();

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DatasetLoadError::ColumnCount {
                row: i,
                expected: headers.len(),
                got: record.len(),
            });
        }
        for (c, cell) in record.iter().enumerate() {
            let value = parse_cell(cell)
                .filter(|v| c != target_idx || v.is_finite())
                .ok_or_else(|| DatasetLoadError::Parse {
                    row: i,
                    column: headers[c].clone(),
                    value: cell.to_string(),
                })?;
            if c == target_idx {
                targets.push(value);
            } else {
                rows.push(value);
            }
        }
    }

    let n_rows = targets.len();
    let n_cols = feature_names.len();
    Ok(Dataset::from_rows(rows, n_rows, n_cols, targets, Some(feature_names))?)
}

fn open(path: &Path) -> Result<File, DatasetLoadError> {
    File::open(path).map_err(|source| DatasetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
