//! Parquet dataset loader.
//!
//! Every numeric column other than the target becomes a feature, in schema
//! order. Integer and floating columns are cast to `Float32`; nulls in
//! feature columns become missing values, nulls in the target are an error.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, Float32Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::DatasetLoadError;
use crate::data::{Dataset, DatasetError};

/// Load a Parquet file with a named target column.
pub fn load_parquet(path: impl AsRef<Path>, target_column: &str) -> Result<Dataset, DatasetLoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;

    if schema.field_with_name(target_column).is_err() {
        return Err(DatasetLoadError::MissingColumn(target_column.to_string()));
    }

    let feature_names: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|name| name != target_column)
        .collect();

    let n_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    if n_rows == 0 {
        return Err(DatasetLoadError::Empty(path.to_path_buf()));
    }

    let targets = column_f32(&batches, target_column)?;
    let mut features = Vec::with_capacity(n_rows * feature_names.len());
    for name in &feature_names {
        features.extend(column_f32(&batches, name)?);
    }

    let len = features.len();
    let n_cols = feature_names.len();
    let features = Array2::from_shape_vec((n_cols, n_rows), features).map_err(|_| DatasetError::Shape {
        len,
        rows: n_rows,
        cols: n_cols,
    })?;
    Ok(Dataset::new(features, targets, Some(feature_names))?)
}

fn column_f32(batches: &[RecordBatch], name: &str) -> Result<Vec<f32>, DatasetLoadError> {
    let mut values = Vec::new();
    for batch in batches {
        let col = batch
            .column_by_name(name)
            .ok_or_else(|| DatasetLoadError::MissingColumn(name.to_string()))?;
        if !is_numeric(col.data_type()) {
            return Err(DatasetLoadError::UnsupportedType {
                column: name.to_string(),
                got: format!("{:?}", col.data_type()),
            });
        }
        let col = cast(col, &DataType::Float32)?;
        let arr = col
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| DatasetLoadError::UnsupportedType {
                column: name.to_string(),
                got: format!("{:?}", col.data_type()),
            })?;
        values.extend(arr.iter().map(|v| v.unwrap_or(f32::NAN)));
    }
    Ok(values)
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}
