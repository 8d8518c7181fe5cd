use std::path::{Path, PathBuf};

use serde::Serialize;

use super::coerce::{lenient_count, lenient_f64};

// ---------------------------------------------------------------------------
// Recognized columns
// ---------------------------------------------------------------------------

/// Number of columns kept from a yearly file.
pub const COLUMN_COUNT: usize = 21;

/// The fixed column set read from every yearly file, in record order.
/// Any other column present in the file is ignored.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "id_mutation",
    "date_mutation",
    "numero_disposition",
    "nature_mutation",
    "valeur_fonciere",
    "adresse_numero",
    "adresse_nom_voie",
    "adresse_code_voie",
    "code_postal",
    "code_commune",
    "nom_commune",
    "code_departement",
    "id_parcelle",
    "type_local",
    "surface_reelle_bati",
    "nombre_pieces_principales",
    "code_nature_culture",
    "nature_culture",
    "surface_terrain",
    "longitude",
    "latitude",
];

// ---------------------------------------------------------------------------
// TransactionRecord – one row of a yearly file
// ---------------------------------------------------------------------------

/// One property transfer. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub id_mutation: String,
    /// Raw date text; coerced to a calendar date by the time-series builder.
    pub date_mutation: String,
    pub numero_disposition: Option<String>,
    pub nature_mutation: Option<String>,
    /// Declared value in euros.
    pub valeur_fonciere: Option<f64>,
    pub adresse_numero: Option<String>,
    pub adresse_nom_voie: Option<String>,
    pub adresse_code_voie: Option<String>,
    pub code_postal: Option<String>,
    pub code_commune: Option<String>,
    pub nom_commune: Option<String>,
    pub code_departement: Option<String>,
    pub id_parcelle: Option<String>,
    /// Property-type classification, e.g. `"Maison"`.
    pub type_local: Option<String>,
    pub surface_reelle_bati: Option<f64>,
    pub nombre_pieces_principales: Option<u32>,
    pub code_nature_culture: Option<String>,
    pub nature_culture: Option<String>,
    pub surface_terrain: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl TransactionRecord {
    /// Build a record from its cells.
    ///
    /// `cell(i)` returns the raw text of column `COLUMNS[i]`, or `None` for a
    /// null cell. Numeric columns are coerced leniently: a value that does not
    /// parse becomes `None` instead of failing the whole load.
    pub fn from_cells<'a>(cell: impl Fn(usize) -> Option<&'a str>) -> Self {
        let text = |i: usize| {
            cell(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |i: usize| lenient_f64(cell(i));

        TransactionRecord {
            id_mutation: text(0).unwrap_or_default(),
            date_mutation: text(1).unwrap_or_default(),
            numero_disposition: text(2),
            nature_mutation: text(3),
            valeur_fonciere: number(4),
            adresse_numero: text(5),
            adresse_nom_voie: text(6),
            adresse_code_voie: text(7),
            code_postal: text(8),
            code_commune: text(9),
            nom_commune: text(10),
            code_departement: text(11),
            id_parcelle: text(12),
            type_local: text(13),
            surface_reelle_bati: number(14),
            nombre_pieces_principales: lenient_count(cell(15)),
            code_nature_culture: text(16),
            nature_culture: text(17),
            surface_terrain: number(18),
            longitude: number(19),
            latitude: number(20),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionTable – one loaded year
// ---------------------------------------------------------------------------

/// All records of one yearly file, in file order. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    source: PathBuf,
    records: Vec<TransactionRecord>,
}

impl TransactionTable {
    pub fn new(source: impl Into<PathBuf>, records: Vec<TransactionRecord>) -> Self {
        TransactionTable {
            source: source.into(),
            records,
        }
    }

    /// A table with no rows, used when a file could not be loaded.
    pub fn empty(source: impl Into<PathBuf>) -> Self {
        Self::new(source, Vec::new())
    }

    /// Path the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, &'static str)]) -> Vec<Option<&'static str>> {
        COLUMNS
            .iter()
            .map(|col| pairs.iter().find(|(c, _)| c == col).map(|(_, v)| *v))
            .collect()
    }

    #[test]
    fn record_from_cells_maps_every_column() {
        let row = cells(&[
            ("id_mutation", "2020-1"),
            ("date_mutation", "2020-01-07"),
            ("valeur_fonciere", "150000"),
            ("type_local", "Maison"),
            ("nombre_pieces_principales", "4"),
            ("longitude", "5.12"),
            ("latitude", "46.2"),
        ]);
        let rec = TransactionRecord::from_cells(|i| row[i]);

        assert_eq!(rec.id_mutation, "2020-1");
        assert_eq!(rec.date_mutation, "2020-01-07");
        assert_eq!(rec.valeur_fonciere, Some(150000.0));
        assert_eq!(rec.type_local.as_deref(), Some("Maison"));
        assert_eq!(rec.nombre_pieces_principales, Some(4));
        assert_eq!(rec.longitude, Some(5.12));
        assert_eq!(rec.latitude, Some(46.2));
        assert_eq!(rec.code_commune, None);
    }

    #[test]
    fn blank_and_invalid_cells_become_missing() {
        let row = cells(&[
            ("nature_culture", "   "),
            ("valeur_fonciere", "unknown"),
            ("latitude", "north"),
        ]);
        let rec = TransactionRecord::from_cells(|i| row[i]);

        assert_eq!(rec.nature_culture, None);
        assert_eq!(rec.valeur_fonciere, None);
        assert_eq!(rec.latitude, None);
    }

    #[test]
    fn empty_table_reports_its_source() {
        let table = TransactionTable::empty("dataset/full_2016.csv");
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.source(), Path::new("dataset/full_2016.csv"));
    }
}
