/// Data layer: records, loading, caching and filtering.
///
/// Architecture:
/// ```text
///  full_<year>.csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  chunked read, fixed columns → TransactionTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  path → Arc<TransactionTable>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  type_local == property type → FilteredView
///   └──────────┘
/// ```

pub mod cache;
pub mod coerce;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;
