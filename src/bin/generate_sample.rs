//! Writes a synthetic `full_<year>.csv` and `full_<year>.parquet` so the
//! dashboard can be tried without downloading the real DVF files.
//!
//! Usage: `generate_sample [year] [rows] [output_dir]`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const HEADER: [&str; 21] = [
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

/// (code_commune, nom_commune, code_postal, latitude, longitude)
const COMMUNES: [(&str, &str, &str, f64, f64); 6] = [
    ("01053", "Bourg-en-Bresse", "01000", 46.2052, 5.2255),
    ("01004", "Ambérieu-en-Bugey", "01500", 45.9587, 5.3594),
    ("01283", "Oyonnax", "01100", 46.2561, 5.6556),
    ("01173", "Gex", "01170", 46.3333, 6.0578),
    ("01093", "Bellegarde-sur-Valserine", "01200", 46.1080, 5.8260),
    ("01427", "Trévoux", "01600", 45.9414, 4.7706),
];

const STREETS: [&str; 8] = [
    "RUE DE LA REPUBLIQUE",
    "AVENUE DE LYON",
    "RUE DES LILAS",
    "CHEMIN DES VIGNES",
    "ROUTE DE GENEVE",
    "PLACE DU MARCHE",
    "RUE PASTEUR",
    "IMPASSE DES SAULES",
];

/// (type_local, weight, median price)
const PROPERTY_TYPES: [(&str, u64, f64); 4] = [
    ("Appartement", 30, 140_000.0),
    ("Dépendance", 25, 15_000.0),
    ("Local industriel. commercial ou assimilé", 10, 250_000.0),
    ("Maison", 35, 210_000.0),
];

const NATURES: [(&str, u64); 4] = [
    ("Vente", 90),
    ("Vente en l'état futur d'achèvement", 5),
    ("Echange", 3),
    ("Adjudication", 2),
];

const CULTURES: [(&str, &str); 4] = [
    ("S", "sols"),
    ("J", "jardins"),
    ("T", "terres"),
    ("AG", "terrains d'agrément"),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn weighted<'a, T>(&mut self, items: &'a [(T, u64)]) -> &'a T {
        let total: u64 = items.iter().map(|(_, w)| w).sum();
        let mut pick = self.next_u64() % total;
        for (item, w) in items {
            if pick < *w {
                return item;
            }
            pick -= w;
        }
        &items[items.len() - 1].0
    }
}

fn generate_rows(year: i32, n: usize, rng: &mut SimpleRng) -> Result<Vec<Vec<String>>> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).context("invalid year")?;
    let weights: Vec<((&str, f64), u64)> = PROPERTY_TYPES
        .iter()
        .map(|&(name, w, price)| ((name, price), w))
        .collect();

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let &(type_local, median) = rng.weighted(&weights);
        let &nature = rng.weighted(&NATURES);
        let (code_commune, nom_commune, code_postal, lat, lon) = COMMUNES[rng.below(COMMUNES.len())];
        let street = STREETS[rng.below(STREETS.len())];
        let (code_culture, culture) = CULTURES[rng.below(CULTURES.len())];
        let date = jan_first + Duration::days(rng.below(365) as i64);
        let price = (median * rng.gauss(0.0, 0.45).exp()).round();
        let surface = rng.gauss(85.0, 30.0).clamp(9.0, 400.0).round();
        let rooms = (surface / 22.0).round().max(1.0);

        // A few rows carry the defects found in real exports.
        let (latitude, longitude) = match i % 97 {
            0 => (String::new(), String::new()),
            1 => ("#N/A".to_string(), format!("{lon:.6}")),
            _ => (
                format!("{:.6}", lat + rng.gauss(0.0, 0.01)),
                format!("{:.6}", lon + rng.gauss(0.0, 0.01)),
            ),
        };
        let is_dependance = type_local == "Dépendance";

        rows.push(vec![
            format!("{year}-{}", i + 1),
            date.format("%Y-%m-%d").to_string(),
            "1".to_string(),
            nature.to_string(),
            if i % 53 == 0 { String::new() } else { format!("{price:.2}") },
            (1 + rng.below(120)).to_string(),
            street.to_string(),
            format!("{:04}", rng.below(9999)),
            code_postal.to_string(),
            code_commune.to_string(),
            nom_commune.to_string(),
            "01".to_string(),
            format!("{code_commune}000AB{:04}", rng.below(9999)),
            type_local.to_string(),
            if is_dependance { String::new() } else { format!("{surface:.0}") },
            if is_dependance { "0".to_string() } else { format!("{rooms:.0}") },
            code_culture.to_string(),
            culture.to_string(),
            format!("{:.0}", rng.gauss(600.0, 250.0).max(20.0)),
            longitude,
            latitude,
        ]);
    }
    Ok(rows)
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parquet copy with numeric columns stored as floats, like a Pandas export.
fn write_parquet(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    const NUMERIC: [&str; 3] = ["valeur_fonciere", "longitude", "latitude"];

    let mut fields = Vec::with_capacity(HEADER.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(HEADER.len());
    for (c, name) in HEADER.iter().enumerate() {
        let cells = rows.iter().map(|r| r[c].as_str());
        if NUMERIC.contains(name) {
            fields.push(Field::new(*name, DataType::Float64, true));
            let values: Float64Array = cells.map(|s| s.parse::<f64>().ok()).collect();
            columns.push(Arc::new(values));
        } else {
            fields.push(Field::new(*name, DataType::Utf8, true));
            let values: StringArray = cells.map(|s| (!s.is_empty()).then_some(s)).collect();
            columns.push(Arc::new(values));
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let year: i32 = match args.next() {
        Some(y) => y.parse().with_context(|| format!("invalid year '{y}'"))?,
        None => 2020,
    };
    let n_rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 5_000,
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "dataset".to_string()));
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(year as u64);
    let rows = generate_rows(year, n_rows, &mut rng)?;

    let csv_path = out_dir.join(format!("full_{year}.csv"));
    write_csv(&csv_path, &rows)?;
    let parquet_path = out_dir.join(format!("full_{year}.parquet"));
    write_parquet(&parquet_path, &rows)?;

    log::info!("Wrote {} and {}", csv_path.display(), parquet_path.display());
    println!("Wrote {n_rows} transactions to {} and {}", csv_path.display(), parquet_path.display());
    Ok(())
}
