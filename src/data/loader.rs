use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{AirQualityDataset, Column};

/// Columns the dashboard reads from every station file.
pub const REQUIRED_COLUMNS: [&str; 8] =
    ["year", "month", "day", "hour", "TEMP", "O3", "SO2", "NO2"];

/// Cell texts treated as missing, as written by pandas and the PRSA files.
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an air-quality table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column per field (PRSA layout)
/// * `.parquet` – flat numeric / string columns
pub fn load_file(path: &Path) -> Result<AirQualityDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names,
        path.display()
    );
    Ok(dataset)
}

/// Fail unless every name in `names` is a numeric column of `dataset`.
pub fn require_columns(dataset: &AirQualityDataset, names: &[&str]) -> Result<()> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| !matches!(dataset.column(n), Some(Column::Numeric(_))))
        .collect();
    if !missing.is_empty() {
        bail!("Dataset lacks numeric column(s): {}", missing.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<AirQualityDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV text. A column is numeric when every non-missing cell parses
/// as a float; otherwise it is kept as text.
pub fn read_csv<R: Read>(input: R) -> Result<AirQualityDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, found {}",
                headers.len(),
                record.len()
            );
        }
        for (cells, value) in raw.iter_mut().zip(record.iter()) {
            let value = value.trim();
            cells.push((!MISSING_MARKERS.contains(&value)).then(|| value.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| (name, infer_column(cells)))
        .collect();
    Ok(AirQualityDataset::from_columns(columns))
}

fn infer_column(cells: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|c| match c {
            Some(s) => s.parse::<f64>().ok().map(|v| (!v.is_nan()).then_some(v)),
            None => Some(None),
        })
        .collect();
    match parsed {
        Some(values) => Column::Numeric(values),
        None => Column::Text(cells),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Integer and float columns become numeric, string columns become text.
/// Nulls are missing cells.
fn load_parquet(path: &Path) -> Result<AirQualityDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<(String, Column)> = schema
        .fields()
        .iter()
        .map(|f| {
            let empty = match f.data_type() {
                DataType::Utf8 | DataType::LargeUtf8 => Column::Text(Vec::new()),
                _ => Column::Numeric(Vec::new()),
            };
            (f.name().clone(), empty)
        })
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, (name, column)) in columns.iter_mut().enumerate() {
            let array = batch.column(idx);
            append_array(column, array).with_context(|| format!("column '{name}'"))?;
        }
    }

    Ok(AirQualityDataset::from_columns(columns))
}

// -- Arrow helpers --

fn append_array(column: &mut Column, array: &ArrayRef) -> Result<()> {
    match column {
        Column::Numeric(cells) => {
            let values = numeric_values(array)?;
            cells.extend(values);
        }
        Column::Text(cells) => {
            let values: Vec<Option<String>> = match array.data_type() {
                DataType::Utf8 => array
                    .as_string::<i32>()
                    .iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
                DataType::LargeUtf8 => array
                    .as_string::<i64>()
                    .iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
                other => bail!("Expected a string column, got {other:?}"),
            };
            cells.extend(values);
        }
    }
    Ok(())
}

/// NaN floats are read as missing cells.
fn numeric_values(array: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = match array.data_type() {
        DataType::Float64 => downcast::<Float64Array>(array)?.iter().collect(),
        DataType::Float32 => downcast::<Float32Array>(array)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => downcast::<Int64Array>(array)?
            .iter()
            .map(|v| v.map(|i| i as f64))
            .collect(),
        DataType::Int32 => downcast::<Int32Array>(array)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        other => bail!("Unsupported column type {other:?}"),
    };
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn downcast<T: Array + 'static>(array: &ArrayRef) -> Result<&T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", array.data_type()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use arrow::array::{BooleanArray, LargeStringArray, StringArray};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;

    const PRSA_SNIPPET: &str = "\
No,year,month,day,hour,PM2.5,SO2,NO2,O3,TEMP,wd,station
1,2013,3,1,0,3,13,NA,85,-2.3,E,Changping
2,2013,3,1,1,3,6,9,NA,-2.5,ENE,Changping
3,2013,3,1,2,NA,22,13,74,-3,,Changping
";

    #[test]
    fn reads_prsa_layout_with_missing_markers() {
        let ds = read_csv(PRSA_SNIPPET.as_bytes()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names.first().map(String::as_str), Some("No"));
        assert_eq!(ds.numeric("NO2").unwrap(), &[None, Some(9.0), Some(13.0)]);
        assert_eq!(ds.numeric("TEMP").unwrap(), &[Some(-2.3), Some(-2.5), Some(-3.0)]);
        assert_eq!(
            ds.column("wd"),
            Some(&Column::Text(vec![Some("E".into()), Some("ENE".into()), None]))
        );
    }

    #[test]
    fn required_columns_are_checked() {
        let ds = read_csv(PRSA_SNIPPET.as_bytes()).unwrap();
        assert!(require_columns(&ds, &REQUIRED_COLUMNS).is_ok());

        let err = require_columns(&ds, &["hour", "CO", "wd"]).unwrap_err();
        assert_eq!(err.to_string(), "Dataset lacks numeric column(s): CO, wd");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "a,b\n1,2\n3\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("readings.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn nan_text_reads_as_missing() {
        let ds = read_csv("O3\n1\nNAN\ninf\n".as_bytes()).unwrap();
        assert_eq!(ds.numeric("O3").unwrap(), &[Some(1.0), None, Some(f64::INFINITY)]);
    }

    fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn reads_parquet_columns_of_every_supported_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.parquet");
        write_parquet(
            &path,
            vec![
                ("year", Arc::new(Int32Array::from(vec![2013, 2013, 2014])) as ArrayRef),
                ("No", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
                (
                    "TEMP",
                    Arc::new(Float32Array::from(vec![Some(-2.5), None, Some(4.0)])) as ArrayRef,
                ),
                (
                    "O3",
                    Arc::new(Float64Array::from(vec![Some(85.0), Some(f64::NAN), None]))
                        as ArrayRef,
                ),
                (
                    "wd",
                    Arc::new(StringArray::from(vec![Some("E"), None, Some("NW")])) as ArrayRef,
                ),
                (
                    "station",
                    Arc::new(LargeStringArray::from(vec!["Changping"; 3])) as ArrayRef,
                ),
            ],
        );

        let ds = load_file(&path).unwrap();

        assert_eq!(ds.column_names, vec!["year", "No", "TEMP", "O3", "wd", "station"]);
        assert_eq!(ds.numeric("year").unwrap(), &[Some(2013.0), Some(2013.0), Some(2014.0)]);
        assert_eq!(ds.numeric("No").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(ds.numeric("TEMP").unwrap(), &[Some(-2.5), None, Some(4.0)]);
        assert_eq!(ds.numeric("O3").unwrap(), &[Some(85.0), None, None]);
        assert_eq!(
            ds.column("wd"),
            Some(&Column::Text(vec![Some("E".into()), None, Some("NW".into())]))
        );
        assert_eq!(
            ds.column("station"),
            Some(&Column::Text(vec![Some("Changping".into()); 3]))
        );
    }

    #[test]
    fn unsupported_parquet_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.pq");
        write_parquet(
            &path,
            vec![("calm", Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef)],
        );

        let err = load_file(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("column 'calm'"), "{message}");
        assert!(message.contains("Unsupported column type Boolean"), "{message}");
    }
}
