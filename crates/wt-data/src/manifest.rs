//! TOML description of a dataset: which file feeds which category, how
//! dates are written, and how fast playback runs.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use wt_core::{Category, ClockConfig, DEFAULT_SECONDS_PER_DAY, DateLocale};

use crate::error::{DataError, Result};

fn default_seconds_per_day() -> f32 {
    DEFAULT_SECONDS_PER_DAY
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CategorySource {
    /// Short code or display name, parsed with [`Category::from_str`].
    ///
    /// [`Category::from_str`]: std::str::FromStr::from_str
    pub category: String,
    pub file: PathBuf,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatasetManifest {
    #[serde(default)]
    pub locale: DateLocale,
    #[serde(default = "default_seconds_per_day")]
    pub seconds_per_day: f32,
    #[serde(default)]
    pub story_points: Option<PathBuf>,
    #[serde(default, rename = "category")]
    pub categories: Vec<CategorySource>,
    /// Directory relative paths resolve against. Set by [`Self::load`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl DatasetManifest {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| DataError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        let mut manifest = Self::parse(&text, path)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.base_dir.join(file)
        }
    }

    /// Every category source with its name parsed and its path resolved.
    pub fn sources(&self) -> Result<Vec<(Category, PathBuf)>> {
        self.categories
            .iter()
            .map(|src| -> Result<(Category, PathBuf)> {
                let category = src.category.parse::<Category>()?;
                Ok((category, self.resolve(&src.file)))
            })
            .collect()
    }

    pub fn clock_config(&self) -> ClockConfig {
        ClockConfig::new(self.seconds_per_day)
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
