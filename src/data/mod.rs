/// Container layer: header/column model and file loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TableFile
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ TableFile  │  named extensions: header keywords + columns of cells
///   └───────────┘
///        │
///        ▼
///   ResponseMatrix / EffectiveArea / Spectrum  (decoded by their own modules)
/// ```

pub mod loader;
pub mod model;

pub use loader::{load_file, write_parquet};
pub use model::{Cell, Column, Extension, Header, HeaderValue, TableFile};
