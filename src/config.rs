use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::PropertyType;
use crate::data::loader::DEFAULT_CHUNK_SIZE;

/// Overrides `dataset_dir` when set.
pub const DATASET_DIR_ENV: &str = "DVF_DATASET_DIR";

// ---------------------------------------------------------------------------
// DatasetYear – the five selectable years
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetYear {
    #[serde(rename = "2016")]
    Y2016,
    #[serde(rename = "2017")]
    Y2017,
    #[serde(rename = "2018")]
    Y2018,
    #[serde(rename = "2019")]
    Y2019,
    #[serde(rename = "2020")]
    Y2020,
}

impl DatasetYear {
    /// Selector order.
    pub const ALL: [DatasetYear; 5] = [
        DatasetYear::Y2016,
        DatasetYear::Y2017,
        DatasetYear::Y2018,
        DatasetYear::Y2019,
        DatasetYear::Y2020,
    ];

    pub fn year(self) -> u16 {
        match self {
            DatasetYear::Y2016 => 2016,
            DatasetYear::Y2017 => 2017,
            DatasetYear::Y2018 => 2018,
            DatasetYear::Y2019 => 2019,
            DatasetYear::Y2020 => 2020,
        }
    }
}

impl fmt::Display for DatasetYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_data", self.year())
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }
}

/// Dashboard settings, read from an optional JSON file.
///
/// ```json
/// { "dataset_dir": "./dataset", "file_format": "csv", "chunk_size": 300000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding `full_<year>.<ext>` files.
    pub dataset_dir: PathBuf,
    pub file_format: FileFormat,
    /// Rows read per chunk by the loader.
    pub chunk_size: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
    pub initial_year: DatasetYear,
    pub initial_property_type: PropertyType,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            dataset_dir: PathBuf::from("./dataset"),
            file_format: FileFormat::Csv,
            chunk_size: DEFAULT_CHUNK_SIZE,
            window_size: [1280.0, 900.0],
            initial_year: DatasetYear::Y2016,
            initial_property_type: PropertyType::Appartement,
        }
    }
}

impl DashboardConfig {
    /// Read `path` if given (defaults otherwise), then apply
    /// [`DATASET_DIR_ENV`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => DashboardConfig::default(),
        };

        if let Some(dir) = std::env::var_os(DATASET_DIR_ENV) {
            config.dataset_dir = PathBuf::from(dir);
        }
        log::debug!("Using configuration {config:?}");
        Ok(config)
    }

    /// The file backing `year`.
    pub fn path_for(&self, year: DatasetYear) -> PathBuf {
        self.dataset_dir
            .join(format!("full_{}.{}", year.year(), self.file_format.extension()))
    }
}
