//! # Startup Table Loading
//!
//! This module is the exclusive entry point for the two tabular inputs
//! read at process start: the training feature table (whose header row
//! defines the runtime schema) and the target table (whose values belong
//! to training and are only shape-checked here).
//!
//! - Strict layout: the feature table's headers must reproduce the
//!   declared field-table expansion exactly, in order. A diverging table
//!   would silently mis-position every feature the model receives, so it
//!   is rejected before the process can serve a single prediction.
//! - User-centric errors: failures are assumed to be input mistakes, and
//!   `SchemaLoadError` names the file, the position, and what was
//!   expected.

use crate::schema::FeatureSchema;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// The validated feature table: the schema its headers define, plus its
/// row count for cross-checking the target table.
#[derive(Debug)]
pub struct FeatureTable {
    pub schema: FeatureSchema,
    pub rows: usize,
}

/// All the ways startup table loading can fail. Every variant is fatal to
/// process initialization.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("The feature table '{0}' has a header row but no data rows.")]
    NoRows(String),
    #[error(
        "The feature table has {found} columns, but the training layout declares {expected}."
    )]
    WidthMismatch { expected: usize, found: usize },
    #[error(
        "Feature table column {position} is '{found}', but the training layout declares '{expected}' there. The table and the declared field layout must agree exactly."
    )]
    LayoutMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("The target table '{0}' has no columns.")]
    TargetEmpty(String),
    #[error(
        "The target table has {target} rows, but the feature table has {features}; the two tables describe the same samples and must line up."
    )]
    TargetRowMismatch { features: usize, target: usize },
}

/// Loads the feature table and derives the runtime schema from its
/// headers, enforcing agreement with the declared field layout.
pub fn load_feature_table(path: &Path) -> Result<FeatureTable, SchemaLoadError> {
    let df = read_csv(path)?;

    let declared = FeatureSchema::declared();
    let headers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    if headers.len() != declared.len() {
        return Err(SchemaLoadError::WidthMismatch {
            expected: declared.len(),
            found: headers.len(),
        });
    }
    for (position, (found, expected)) in headers.iter().zip(declared.order()).enumerate() {
        if found != expected {
            return Err(SchemaLoadError::LayoutMismatch {
                position,
                expected: expected.clone(),
                found: found.clone(),
            });
        }
    }

    if df.height() == 0 {
        return Err(SchemaLoadError::NoRows(path.display().to_string()));
    }

    log::info!(
        "Loaded feature table '{}': {} columns, {} rows",
        path.display(),
        headers.len(),
        df.height()
    );

    Ok(FeatureTable {
        schema: declared,
        rows: df.height(),
    })
}

/// Shape-checks the target table against the feature table. Its values
/// are training concerns and are not consumed at prediction time.
pub fn validate_target_table(path: &Path, expected_rows: usize) -> Result<(), SchemaLoadError> {
    let df = read_csv(path)?;

    if df.width() == 0 {
        return Err(SchemaLoadError::TargetEmpty(path.display().to_string()));
    }
    if df.height() != expected_rows {
        return Err(SchemaLoadError::TargetRowMismatch {
            features: expected_rows,
            target: df.height(),
        });
    }

    log::info!(
        "Target table '{}' lines up with the feature table ({} rows)",
        path.display(),
        df.height()
    );
    Ok(())
}

fn read_csv(path: &Path) -> Result<DataFrame, SchemaLoadError> {
    let df = CsvReader::new(File::open(path)?)
        .with_options(CsvReadOptions::default().with_has_header(true))
        .finish()?;
    Ok(df)
}
