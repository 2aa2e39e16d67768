use std::path::Path;

use wt_core::{Category, CsvTable, Engine, IngestReport, RecordStore, StoryPointIndex, StoryRowError};

use crate::error::{DataError, Result};
use crate::manifest::{DatasetManifest, read_to_string};

/// An initialized engine plus what loading it cost.
pub struct LoadedDataset {
    pub manifest: DatasetManifest,
    pub engine: Engine,
    pub reports: Vec<(Category, IngestReport)>,
    pub story_errors: Vec<StoryRowError>,
}

impl LoadedDataset {
    /// Rows rejected across every category file.
    pub fn rejected_rows(&self) -> usize {
        self.reports.iter().map(|(_, r)| r.errors.len()).sum()
    }
}

fn read_table(path: &Path) -> Result<CsvTable> {
    let text = read_to_string(path)?;
    CsvTable::parse(&text).ok_or_else(|| DataError::MissingHeader {
        path: path.to_path_buf(),
    })
}

/// Load every category file a manifest lists and initialize the engine.
///
/// Row-level problems are logged and counted; a missing file, a headerless
/// file, or an invalid date span stops the load.
pub fn load_dataset(manifest_path: &Path) -> Result<LoadedDataset> {
    let manifest = DatasetManifest::load(manifest_path)?;
    let mut store = RecordStore::new();
    let mut reports = Vec::new();

    for (category, path) in manifest.sources()? {
        let table = read_table(&path)?;
        let report = store.ingest(category, &table, manifest.locale);
        tracing::info!(
            "{}: {} rows accepted, {} rejected, {} blank ({})",
            category,
            report.accepted,
            report.errors.len(),
            report.blank,
            path.display()
        );
        reports.push((category, report));
    }

    let engine = Engine::initialise(store, manifest.clock_config())?;

    let (engine, story_errors) = match &manifest.story_points {
        Some(file) => {
            let path = manifest.resolve(file);
            let table = read_table(&path)?;
            let (index, errors) = StoryPointIndex::from_table(&table, manifest.locale);
            tracing::info!("story points: {} loaded from {}", index.len(), path.display());
            (engine.with_story_points(index), errors)
        }
        None => (engine, Vec::new()),
    };

    Ok(LoadedDataset {
        manifest,
        engine,
        reports,
        story_errors,
    })
}
