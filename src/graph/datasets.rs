use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::model::GraphSnapshot;
use super::parse::parse_snapshot;

const DATASET_EXTENSION: &str = "json";

/// A directory holding one `<name>.json` snapshot per dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetCatalog {
    dir: PathBuf,
    names: Vec<String>,
}

impl DatasetCatalog {
    pub fn scan(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to list datasets in {}", dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read entry in {}", dir.display()))?
                .path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(DATASET_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();

        if names.is_empty() {
            return Err(anyhow!("no *.json datasets found in {}", dir.display()));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            names,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        if !self.contains(name) {
            return Err(anyhow!(
                "unknown dataset {name:?}; available: {}",
                self.names.join(", ")
            ));
        }
        Ok(self.dir.join(format!("{name}.{DATASET_EXTENSION}")))
    }
}

/// Where the viewer reads snapshots from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Directory(PathBuf),
    File(PathBuf),
}

#[derive(Debug)]
pub struct LoadedDataset {
    pub name: String,
    pub snapshot: GraphSnapshot,
    pub catalog: Option<DatasetCatalog>,
}

impl DataSource {
    /// Reads one snapshot. In a directory, `requested` picks the dataset and the first one is
    /// used when nothing was asked for.
    pub fn load(&self, requested: Option<&str>) -> Result<LoadedDataset> {
        match self {
            Self::File(path) => {
                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("snapshot")
                    .to_owned();
                Ok(LoadedDataset {
                    name,
                    snapshot: load_snapshot_file(path)?,
                    catalog: None,
                })
            }
            Self::Directory(dir) => {
                let catalog = DatasetCatalog::scan(dir)?;
                let name = match requested {
                    Some(name) => name.to_owned(),
                    None => catalog
                        .first()
                        .map(str::to_owned)
                        .ok_or_else(|| anyhow!("dataset catalog is empty"))?,
                };
                let snapshot = load_snapshot_file(&catalog.path_for(&name)?)?;
                Ok(LoadedDataset {
                    name,
                    snapshot,
                    catalog: Some(catalog),
                })
            }
        }
    }
}

pub fn load_snapshot_file(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph snapshot {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
