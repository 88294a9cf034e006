use super::{ScoreMetadata, ScoreSummary};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("unable to read score directory {}: {source}", .path.display())]
    ReadDirectory { path: PathBuf, source: io::Error },
}

/// A metadata file that was left out of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Outcome of a load or reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub scores: Vec<String>,
    pub skipped_files: Vec<SkippedFile>,
}

#[derive(Debug, Default)]
struct Catalog {
    scores: BTreeMap<String, ScoreMetadata>,
    skipped: Vec<SkippedFile>,
}

impl Catalog {
    fn summary(&self) -> ReloadSummary {
        ReloadSummary {
            scores: self.scores.keys().cloned().collect(),
            skipped_files: self.skipped.clone(),
        }
    }
}

/// In-memory catalogue of score metadata backed by a directory of `*.json` files.
///
/// Readers take a snapshot of the current catalogue; [`MetadataStore::reload`] parses the
/// directory into a fresh catalogue before swapping it in, so a reader never sees a partial one.
#[derive(Debug)]
pub struct MetadataStore {
    directory: PathBuf,
    catalog: RwLock<Arc<Catalog>>,
}

impl MetadataStore {
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let directory = directory.into();
        let catalog = load_catalog(&directory)?;
        info!(
            directory = %directory.display(),
            scores = catalog.scores.len(),
            skipped = catalog.skipped.len(),
            "score metadata loaded"
        );
        Ok(Self {
            directory,
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn get(&self, score_id: &str) -> Option<ScoreMetadata> {
        self.snapshot().scores.get(score_id).cloned()
    }

    pub fn contains(&self, score_id: &str) -> bool {
        self.snapshot().scores.contains_key(score_id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().scores.is_empty()
    }

    /// All scores, or those whose category equals `category` ignoring case.
    pub fn list(&self, category: Option<&str>) -> Vec<ScoreSummary> {
        self.query(category, None)
    }

    /// Scores whose title or description contains `term` ignoring case.
    pub fn search(&self, term: &str) -> Vec<ScoreSummary> {
        self.query(None, Some(term))
    }

    /// Category filter and search term applied together; either may be absent.
    pub fn query(&self, category: Option<&str>, term: Option<&str>) -> Vec<ScoreSummary> {
        let lowered_term = term.map(str::to_lowercase);
        self.snapshot()
            .scores
            .values()
            .filter(|metadata| {
                category.map_or(true, |wanted| metadata.category.eq_ignore_ascii_case(wanted))
            })
            .filter(|metadata| {
                lowered_term
                    .as_deref()
                    .map_or(true, |needle| metadata.matches_term(needle))
            })
            .map(ScoreMetadata::summary)
            .collect()
    }

    /// Score count per category, sorted by category name.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for metadata in self.snapshot().scores.values() {
            *counts.entry(metadata.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Files skipped during the most recent load.
    pub fn skipped_files(&self) -> Vec<SkippedFile> {
        self.snapshot().skipped.clone()
    }

    /// Re-reads the directory and replaces the catalogue. On failure the previous catalogue stays.
    pub fn reload(&self) -> Result<ReloadSummary, MetadataError> {
        let fresh = Arc::new(load_catalog(&self.directory)?);
        let summary = fresh.summary();
        *self
            .catalog
            .write()
            .expect("metadata catalog lock poisoned") = fresh;
        info!(
            directory = %self.directory.display(),
            scores = summary.scores.len(),
            skipped = summary.skipped_files.len(),
            "score metadata reloaded"
        );
        Ok(summary)
    }

    fn snapshot(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .expect("metadata catalog lock poisoned")
            .clone()
    }
}

fn load_catalog(directory: &Path) -> Result<Catalog, MetadataError> {
    let read_error = |source: io::Error| MetadataError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    };

    let mut paths = fs::read_dir(directory)
        .map_err(read_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;
    paths.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"));
    paths.sort();

    let mut catalog = Catalog::default();
    let mut origins: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        let metadata = match parse_file(&path) {
            Ok(metadata) => metadata,
            Err(reason) => {
                warn!(path = %path.display(), %reason, "skipping malformed score metadata");
                catalog.skipped.push(SkippedFile {
                    path: path.display().to_string(),
                    reason,
                });
                continue;
            }
        };

        if let Some(first) = origins.get(&metadata.id) {
            let reason = format!(
                "duplicate score id '{}' already loaded from {}",
                metadata.id,
                first.display()
            );
            warn!(path = %path.display(), %reason, "skipping duplicate score metadata");
            catalog.skipped.push(SkippedFile {
                path: path.display().to_string(),
                reason,
            });
            continue;
        }

        origins.insert(metadata.id.clone(), path);
        catalog.scores.insert(metadata.id.clone(), metadata);
    }

    Ok(catalog)
}

fn parse_file(path: &Path) -> Result<ScoreMetadata, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("unreadable: {err}"))?;
    let metadata: ScoreMetadata =
        serde_json::from_str(&raw).map_err(|err| format!("invalid metadata: {err}"))?;
    if metadata.id.trim().is_empty() {
        return Err("invalid metadata: empty id".to_string());
    }
    Ok(metadata)
}
