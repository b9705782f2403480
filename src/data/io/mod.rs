//! Dataset loaders for tabular data files.
//!
//! - [`load_california_housing`]: the raw `cal_housing.data` file
//! - [`load_csv`]: headered CSV with a named target column
//! - `load_parquet` (feature `io-parquet`): Parquet with a named target column

mod delimited;
mod error;

#[cfg(feature = "io-parquet")]
pub mod parquet;

pub use delimited::{load_california_housing, load_csv, CALIFORNIA_FEATURES};
pub use error::DatasetLoadError;

#[cfg(feature = "io-parquet")]
pub use self::parquet::load_parquet;

/// Parse one numeric cell. Empty and NA-like cells are missing values.
pub(crate) fn parse_cell(raw: &str) -> Option<f32> {
    let cell = raw.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Some(f32::NAN);
    }
    cell.parse::<f32>().ok()
}
