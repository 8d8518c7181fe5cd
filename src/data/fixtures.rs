//! Helpers shared by the unit tests: small yearly files and records.

use std::path::{Path, PathBuf};

use super::model::{TransactionRecord, COLUMNS};

/// Write a CSV file with an arbitrary header.
pub fn write_csv(dir: &Path, name: &str, header: &[&str], rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(header).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Write a yearly CSV with the full column set; unnamed cells stay empty.
pub fn write_year_csv(dir: &Path, name: &str, rows: &[&[(&str, &str)]]) -> PathBuf {
    let rows: Vec<Vec<&str>> = rows
        .iter()
        .map(|pairs| {
            COLUMNS
                .iter()
                .map(|col| {
                    pairs
                        .iter()
                        .find(|(c, _)| c == col)
                        .map_or("", |(_, v)| *v)
                })
                .collect()
        })
        .collect();
    write_csv(dir, name, &COLUMNS, &rows)
}

/// Build a record from `(column, value)` pairs.
pub fn record(pairs: &[(&str, &str)]) -> TransactionRecord {
    TransactionRecord::from_cells(|i| {
        pairs
            .iter()
            .find(|(c, _)| *c == COLUMNS[i])
            .map(|(_, v)| *v)
    })
}
