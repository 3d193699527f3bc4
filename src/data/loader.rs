use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{PatientRecord, Registry, UNKNOWN};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Loading failures, separated so the UI can word its message by cause
/// instead of collapsing everything into one string.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("registry source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("could not read {}: {source:#}", .path.display())]
    Parse {
        path: PathBuf,
        source: anyhow::Error,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a clinical registry table from a file. Dispatch by extension.
///
/// Supported formats, all flat tables with the columns
/// `race, ethnicity, gender, age, site, stage`:
/// * `.csv` / `.tsv` – header row; empty cells mean "Unknown" / missing age
/// * `.json`         – records-oriented array of objects
/// * `.parquet`      – Utf8 categorical columns, numeric age column
pub fn load_file(path: &Path) -> Result<Registry, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let result = match ext.as_str() {
        "csv" => load_delimited(path, b','),
        "tsv" => load_delimited(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    result.map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Empty and placeholder cells become the `Unknown` sentinel.
fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("n/a")
    {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ages that fail to parse degrade to missing rather than failing the load;
/// a single bad cell should not take down the whole registry.
fn parse_age(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|a| a.is_finite())
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<Registry> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let col = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing '{name}' column"))
    };
    let race_idx = col("race")?;
    let ethnicity_idx = col("ethnicity")?;
    let gender_idx = col("gender")?;
    let age_idx = col("age")?;
    let site_idx = col("site")?;
    let stage_idx = col("stage")?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        records.push(PatientRecord {
            race: normalize_category(cell(race_idx)),
            ethnicity: normalize_category(cell(ethnicity_idx)),
            gender: normalize_category(cell(gender_idx)),
            age: parse_age(cell(age_idx)),
            site: normalize_category(cell(site_idx)),
            stage: normalize_category(cell(stage_idx)),
        });
    }

    Ok(Registry::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented schema (the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "race": "White", "ethnicity": "Hispanic", "gender": "Female",
///     "age": 41.0, "site": "Breast", "stage": "II" },
///   ...
/// ]
/// ```
#[derive(Debug, Deserialize)]
struct RawJsonRecord {
    race: Option<String>,
    ethnicity: Option<String>,
    gender: Option<String>,
    age: Option<f64>,
    site: Option<String>,
    stage: Option<String>,
}

fn load_json(path: &Path) -> Result<Registry> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let raw: Vec<RawJsonRecord> =
        serde_json::from_str(&text).context("parsing records-oriented JSON")?;

    let records = raw
        .into_iter()
        .map(|r| PatientRecord {
            race: normalize_category(r.race.as_deref().unwrap_or("")),
            ethnicity: normalize_category(r.ethnicity.as_deref().unwrap_or("")),
            gender: normalize_category(r.gender.as_deref().unwrap_or("")),
            age: r.age.filter(|a| a.is_finite()),
            site: normalize_category(r.site.as_deref().unwrap_or("")),
            stage: normalize_category(r.stage.as_deref().unwrap_or("")),
        })
        .collect();

    Ok(Registry::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both Pandas (`df.to_parquet()`) and Polars
/// (`df.write_parquet()`): Utf8/LargeUtf8 categoricals, numeric age.
fn load_parquet(path: &Path) -> Result<Registry> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let col = |name: &str| -> Result<Arc<dyn Array>> {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("parquet file missing '{name}' column"))?;
            Ok(batch.column(idx).clone())
        };
        let race_col = col("race")?;
        let ethnicity_col = col("ethnicity")?;
        let gender_col = col("gender")?;
        let age_col = col("age")?;
        let site_col = col("site")?;
        let stage_col = col("stage")?;

        for row in 0..batch.num_rows() {
            records.push(PatientRecord {
                race: extract_category(&race_col, row),
                ethnicity: extract_category(&ethnicity_col, row),
                gender: extract_category(&gender_col, row),
                age: extract_age(&age_col, row)
                    .with_context(|| format!("row {row}: unreadable 'age'"))?,
                site: extract_category(&site_col, row),
                stage: extract_category(&stage_col, row),
            });
        }
    }

    Ok(Registry::from_records(records))
}

/// Read one categorical cell; nulls and non-string columns become `Unknown`.
fn extract_category(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return UNKNOWN.to_string();
    }
    match col.data_type() {
        DataType::Utf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                normalize_category(s.value(row))
            } else {
                UNKNOWN.to_string()
            }
        }
        DataType::LargeUtf8 => {
            let s = col.as_string::<i64>();
            normalize_category(s.value(row))
        }
        _ => UNKNOWN.to_string(),
    }
}

/// Read one age cell from any common numeric column type.
fn extract_age(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let age = match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            arr.value(row)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            arr.value(row) as f64
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            arr.value(row) as f64
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            arr.value(row) as f64
        }
        other => bail!("age column has non-numeric type {other:?}"),
    };
    Ok(Some(age).filter(|a| a.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_source_is_a_distinct_error() {
        let err = load_file(Path::new("/nonexistent/clinical.tsv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let path = write_temp("oncodash_registry.xlsx", "not a real workbook");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn loads_tsv_with_sentinels() {
        let path = write_temp(
            "oncodash_clinical.tsv",
            "race\tethnicity\tgender\tage\tsite\tstage\n\
             White\tHispanic\tFemale\t40\tBreast\tI\n\
             \tNon-Hispanic\tMale\t\tLung\tUnknown\n",
        );
        let registry = load_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.records[0].age, Some(40.0));
        assert_eq!(registry.records[1].race, UNKNOWN);
        assert_eq!(registry.records[1].age, None);
        assert_eq!(registry.records[1].stage, UNKNOWN);
    }

    #[test]
    fn csv_missing_column_is_a_parse_error() {
        let path = write_temp(
            "oncodash_missing_col.csv",
            "race,ethnicity,gender,age,site\nWhite,Hispanic,Female,40,Breast\n",
        );
        let err = load_file(&path).unwrap_err();
        match err {
            LoadError::Parse { source, .. } => {
                assert!(format!("{source:#}").contains("stage"));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn loads_records_oriented_json() {
        let path = write_temp(
            "oncodash_clinical.json",
            r#"[
                {"race":"White","ethnicity":"Hispanic","gender":"Female",
                 "age":41.5,"site":"Breast","stage":"II"},
                {"race":null,"ethnicity":"Non-Hispanic","gender":"Male",
                 "age":null,"site":"Lung","stage":"III"}
            ]"#,
        );
        let registry = load_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.records[0].age, Some(41.5));
        assert_eq!(registry.records[1].race, UNKNOWN);
        assert_eq!(registry.records[1].age, None);
    }

    #[test]
    fn unparseable_age_degrades_to_missing() {
        let path = write_temp(
            "oncodash_bad_age.csv",
            "race,ethnicity,gender,age,site,stage\nWhite,Hispanic,Female,forty,Breast,I\n",
        );
        let registry = load_file(&path).unwrap();
        assert_eq!(registry.records[0].age, None);
    }
}
