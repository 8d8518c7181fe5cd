use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use parquet::errors::ParquetError;
use thiserror::Error;

use super::model::{TransactionRecord, TransactionTable, COLUMNS, COLUMN_COUNT};

/// Rows read per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 300_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a yearly file could not be turned into a [`TransactionTable`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed Parquet in {}: {source}", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("cannot decode record batch in {}: {source}", .path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("{} lacks required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a yearly transaction file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated, header row, extra columns ignored
/// * `.parquet` – any column types; every kept column is read as text
///
/// The file is consumed `chunk_size` rows at a time and the chunks are
/// concatenated, so only the recognized columns of each chunk are retained.
pub fn load_file(path: &Path, chunk_size: usize) -> Result<TransactionTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let chunk_size = chunk_size.max(1);

    let table = match ext.as_str() {
        "csv" => load_csv(path, chunk_size)?,
        "parquet" | "pq" => load_parquet(path, chunk_size)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!("Loaded {} transactions from {}", table.len(), path.display());
    Ok(table)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::Missing(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

// ---------------------------------------------------------------------------
// Column layout: recognized column → position in the file
// ---------------------------------------------------------------------------

struct ColumnLayout {
    positions: [usize; COLUMN_COUNT],
}

impl ColumnLayout {
    fn resolve<'h>(
        path: &Path,
        headers: impl IntoIterator<Item = &'h str>,
    ) -> Result<Self, LoadError> {
        // A UTF-8 BOM sticks to the first header when files come from Excel.
        let headers: Vec<&str> = headers
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();

        let mut positions = [0; COLUMN_COUNT];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| *h == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })?;
        }
        Ok(ColumnLayout { positions })
    }

    /// The file columns to read, in file order, and the layout of a batch
    /// holding only those columns.
    fn projected(&self) -> (Vec<usize>, ColumnLayout) {
        let mut order: Vec<usize> = (0..COLUMN_COUNT).collect();
        order.sort_by_key(|&i| self.positions[i]);

        let mut positions = [0; COLUMN_COUNT];
        for (rank, &i) in order.iter().enumerate() {
            positions[i] = rank;
        }
        let roots = order.iter().map(|&i| self.positions[i]).collect();
        (roots, ColumnLayout { positions })
    }
}

/// Collects per-chunk results into one table.
struct Chunks<'p> {
    path: &'p Path,
    records: Vec<TransactionRecord>,
    count: usize,
}

impl<'p> Chunks<'p> {
    fn new(path: &'p Path) -> Self {
        Chunks {
            path,
            records: Vec::new(),
            count: 0,
        }
    }

    fn push(&mut self, mut chunk: Vec<TransactionRecord>) {
        if chunk.is_empty() {
            return;
        }
        self.count += 1;
        log::debug!(
            "{}: chunk {} with {} rows",
            self.path.display(),
            self.count,
            chunk.len()
        );
        self.records.append(&mut chunk);
    }

    fn finish(self) -> TransactionTable {
        TransactionTable::new(self.path, self.records)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, chunk_size: usize) -> Result<TransactionTable, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().from_reader(open(path)?);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let layout = ColumnLayout::resolve(path, headers.iter())?;

    let mut chunks = Chunks::new(path);
    let mut chunk = Vec::with_capacity(chunk_size.min(8192));
    let mut row = csv::StringRecord::new();

    while reader.read_record(&mut row).map_err(csv_error)? {
        chunk.push(TransactionRecord::from_cells(|i| {
            row.get(layout.positions[i])
        }));
        if chunk.len() == chunk_size {
            chunks.push(std::mem::take(&mut chunk));
        }
    }
    chunks.push(chunk);

    Ok(chunks.finish())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Read a Parquet file as record batches of `chunk_size` rows.
///
/// Only the recognized columns are decoded. Columns written by Pandas or
/// Polars may be strings, integers, floats, dates or timestamps; each one is
/// cast to `Utf8` so record construction (and numeric coercion) is identical
/// to the CSV path.
fn load_parquet(path: &Path, chunk_size: usize) -> Result<TransactionTable, LoadError> {
    let arrow_error = |source| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    };
    let parquet_error = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?).map_err(parquet_error)?;
    let (roots, layout) = ColumnLayout::resolve(
        path,
        builder.schema().fields().iter().map(|f| f.name().as_str()),
    )?
    .projected();
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
    let reader = builder
        .with_projection(mask)
        .with_batch_size(chunk_size)
        .build()
        .map_err(parquet_error)?;

    let mut chunks = Chunks::new(path);

    for batch_result in reader {
        let batch = batch_result.map_err(arrow_error)?;

        let text_columns: Vec<ArrayRef> = layout
            .positions
            .iter()
            .map(|&p| as_text(batch.column(p)))
            .collect::<Result<_, _>>()
            .map_err(arrow_error)?;
        let strings: Vec<_> = text_columns.iter().map(|c| c.as_string::<i32>()).collect();

        let chunk = (0..batch.num_rows())
            .map(|row| {
                TransactionRecord::from_cells(|i| {
                    let column = strings[i];
                    (!column.is_null(row)).then(|| column.value(row))
                })
            })
            .collect();
        chunks.push(chunk);
    }

    Ok(chunks.finish())
}

/// Cast a column to `Utf8`. Timestamps are reduced to their day first, so a
/// `date_mutation` timestamp reads like the ISO date of a CSV export.
fn as_text(column: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    match column.data_type() {
        DataType::Timestamp(..) | DataType::Date64 => {
            cast(&cast(column, &DataType::Date32)?, &DataType::Utf8)
        }
        _ => cast(column, &DataType::Utf8),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
    use chrono::NaiveDate;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::fixtures::{write_csv, write_year_csv};

    #[test]
    fn csv_keeps_recognized_columns_in_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_year_csv(
            dir.path(),
            "full_2020.csv",
            &[
                &[("type_local", "Maison"), ("valeur_fonciere", "150000")],
                &[("type_local", "Appartement"), ("valeur_fonciere", "90000")],
            ],
        );

        let table = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.source(), path.as_path());
        let rec = &table.records()[0];
        assert_eq!(rec.type_local.as_deref(), Some("Maison"));
        assert_eq!(rec.valeur_fonciere, Some(150000.0));
        assert_eq!(table.records()[1].valeur_fonciere, Some(90000.0));
    }

    #[test]
    fn extra_columns_and_column_order_do_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let mut header: Vec<&str> = COLUMNS.iter().rev().copied().collect();
        header.insert(3, "lot1_numero");
        let mut row = vec![""; header.len()];
        row[header.iter().position(|h| *h == "nom_commune").unwrap()] = "Bourg-en-Bresse";
        row[3] = "12";
        let path = write_csv(dir.path(), "full_2018.csv", &header, &[row]);

        let table = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(
            table.records()[0].nom_commune.as_deref(),
            Some("Bourg-en-Bresse")
        );
    }

    #[test]
    fn chunk_size_does_not_change_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Vec<(&str, &str)>> = ["1", "2", "3", "4", "5"]
            .iter()
            .map(|id| vec![("id_mutation", *id), ("type_local", "Maison")])
            .collect();
        let rows: Vec<&[(&str, &str)]> = rows.iter().map(|r| r.as_slice()).collect();
        let path = write_year_csv(dir.path(), "full_2017.csv", &rows);

        let whole = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        let chunked = load_file(&path, 2).unwrap();
        let degenerate = load_file(&path, 0).unwrap();

        assert_eq!(whole, chunked);
        assert_eq!(whole, degenerate);
        let ids: Vec<&str> = chunked
            .records()
            .iter()
            .map(|r| r.id_mutation.as_str())
            .collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn loading_twice_yields_identical_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_year_csv(
            dir.path(),
            "full_2019.csv",
            &[&[("latitude", "45.1"), ("longitude", "oops")]],
        );
        let first = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        let second = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let header: Vec<&str> = COLUMNS.iter().copied().filter(|c| *c != "latitude").collect();
        let path = write_csv(dir.path(), "full_2016.csv", &header, &[]);

        match load_file(&path, DEFAULT_CHUNK_SIZE) {
            Err(LoadError::MissingColumn { column, .. }) => assert_eq!(column, "latitude"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("full_2016.csv"), DEFAULT_CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
    }

    #[test]
    fn ragged_csv_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2020.csv");
        std::fs::write(&path, format!("{}\na,b\n", COLUMNS.join(","))).unwrap();

        let err = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("full_2020.xlsx"), DEFAULT_CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    fn write_batch(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    /// Two rows; numeric columns stored as floats, the rest as strings.
    fn write_parquet(path: &Path, columns: &[&str]) {
        let columns = columns
            .iter()
            .map(|name| -> (&str, ArrayRef) {
                let array: ArrayRef = match *name {
                    "valeur_fonciere" => Arc::new(Float64Array::from(vec![Some(150000.0), None])),
                    "latitude" => Arc::new(Float64Array::from(vec![Some(46.2), Some(45.9)])),
                    "type_local" => Arc::new(StringArray::from(vec!["Maison", "Appartement"])),
                    _ => Arc::new(StringArray::from(vec![None::<&str>, None])),
                };
                (*name, array)
            })
            .collect();
        write_batch(path, columns);
    }

    #[test]
    fn parquet_columns_of_any_type_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2020.parquet");
        write_parquet(&path, &COLUMNS);

        let table = load_file(&path, 1).unwrap();

        assert_eq!(table.len(), 2);
        let [maison, appartement] = table.records() else {
            panic!("expected two rows");
        };
        assert_eq!(maison.type_local.as_deref(), Some("Maison"));
        assert_eq!(maison.valeur_fonciere, Some(150000.0));
        assert_eq!(maison.latitude, Some(46.2));
        assert_eq!(appartement.valeur_fonciere, None);
        assert_eq!(appartement.code_commune, None);
    }

    #[test]
    fn parquet_missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2020.parquet");
        let columns: Vec<&str> = COLUMNS.iter().copied().filter(|c| *c != "type_local").collect();
        write_parquet(&path, &columns);

        let err = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "type_local", .. }));
    }

    #[test]
    fn parquet_timestamp_dates_read_as_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2020.parquet");
        let nanos = |h| {
            NaiveDate::from_ymd_opt(2020, 1, 7)
                .and_then(|d| d.and_hms_opt(h, 0, 0))
                .and_then(|t| t.and_utc().timestamp_nanos_opt())
        };
        let columns = COLUMNS
            .iter()
            .map(|name| -> (&str, ArrayRef) {
                let array: ArrayRef = match *name {
                    "date_mutation" => Arc::new(TimestampNanosecondArray::from(vec![
                        nanos(0),
                        nanos(15),
                    ])),
                    _ => Arc::new(StringArray::from(vec![None::<&str>, None])),
                };
                (*name, array)
            })
            .collect();
        write_batch(&path, columns);

        let table = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        let dates: Vec<&str> = table.records().iter().map(|r| r.date_mutation.as_str()).collect();
        assert_eq!(dates, ["2020-01-07", "2020-01-07"]);

        let spec = crate::charts::builders::time_series(table.records());
        let crate::charts::ChartData::TimeSeries { dates, counts } = &spec.data else {
            panic!("expected time-series data");
        };
        assert_eq!(dates, &[NaiveDate::from_ymd_opt(2020, 1, 7).unwrap()]);
        assert_eq!(counts, &[2.0]);
    }

    #[test]
    fn parquet_reads_only_recognized_columns_in_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_2019.parquet");
        let mut columns: Vec<(&str, ArrayRef)> = COLUMNS
            .iter()
            .rev()
            .map(|name| -> (&str, ArrayRef) {
                let array: ArrayRef = match *name {
                    "nom_commune" => Arc::new(StringArray::from(vec!["Oyonnax"])),
                    "valeur_fonciere" => Arc::new(Int64Array::from(vec![98_000])),
                    "longitude" => Arc::new(Float64Array::from(vec![5.6556])),
                    _ => Arc::new(StringArray::from(vec![None::<&str>])),
                };
                (*name, array)
            })
            .collect();
        columns.insert(0, ("lot1_numero", Arc::new(Int64Array::from(vec![12]))));
        columns.insert(7, ("nature_culture_speciale", Arc::new(StringArray::from(vec!["x"]))));
        write_batch(&path, columns);

        let table = load_file(&path, DEFAULT_CHUNK_SIZE).unwrap();
        let [rec] = table.records() else {
            panic!("expected one row");
        };
        assert_eq!(rec.nom_commune.as_deref(), Some("Oyonnax"));
        assert_eq!(rec.valeur_fonciere, Some(98_000.0));
        assert_eq!(rec.longitude, Some(5.6556));
        assert_eq!(rec.latitude, None);
    }

    #[test]
    fn projection_keeps_columns_in_file_order() {
        let mut positions = [0; COLUMN_COUNT];
        for (i, slot) in positions.iter_mut().enumerate() {
            // Recognized columns sit at odd positions, reversed.
            *slot = 2 * (COLUMN_COUNT - 1 - i) + 1;
        }
        let (roots, projected) = ColumnLayout { positions }.projected();

        assert!(roots.windows(2).all(|w| w[0] < w[1]));
        for (i, &p) in projected.positions.iter().enumerate() {
            assert_eq!(roots[p], positions[i]);
        }
        assert_eq!(projected.positions[0], COLUMN_COUNT - 1);
    }
}
