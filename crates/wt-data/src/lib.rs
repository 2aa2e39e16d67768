//! File-facing side of the engine: dataset manifests and CSV loading.

pub mod error;
pub mod loader;
pub mod manifest;

pub use error::{DataError, Result};
pub use loader::{LoadedDataset, load_dataset};
pub use manifest::{CategorySource, DatasetManifest};
