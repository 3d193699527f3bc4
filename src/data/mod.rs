/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .tsv / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Registry
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Registry  │  Vec<PatientRecord>, filter option lists
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply criteria → filtered row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ aggregate │  group/count/summarize → chart-ready tables
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
