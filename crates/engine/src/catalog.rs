//! Scenario catalog: authored content, loaded once, read-only truth for
//! graph shape.
//!
//! Content files are `*.json`, one scenario per file, organized in
//! per-language subdirectories (`content/es/intro-ia.json`). A file that
//! fails to parse is logged and skipped so one bad authoring pass doesn't
//! take the whole catalog down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatling_domain::{Language, Scenario, ScenarioId};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read content directory {path}: {message}")]
    UnreadableDir { path: PathBuf, message: String },
}

/// All loaded scenarios, keyed by id.
#[derive(Default)]
pub struct ScenarioCatalog {
    scenarios: HashMap<ScenarioId, Arc<Scenario>>,
}

impl ScenarioCatalog {
    /// Load every scenario JSON under `dir` (recursing into language
    /// subdirectories).
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        catalog.load_tree(dir.as_ref())?;
        tracing::info!(count = catalog.len(), "scenario catalog loaded");
        Ok(catalog)
    }

    fn load_tree(&mut self, dir: &Path) -> Result<(), CatalogError> {
        let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::UnreadableDir {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.load_tree(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "json") {
                self.load_file(&path);
            }
        }
        Ok(())
    }

    fn load_file(&mut self, path: &Path) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), "unreadable scenario file, skipping: {}", e);
                return;
            }
        };

        let scenario: Scenario = match serde_json::from_str(&raw) {
            Ok(scenario) => scenario,
            Err(e) => {
                tracing::warn!(path = %path.display(), "malformed scenario file, skipping: {}", e);
                return;
            }
        };

        // Broken edges are warned about but still served; the walker halts
        // defensively if it actually reaches one.
        for problem in scenario.validate() {
            tracing::warn!(scenario = %scenario.id, "content problem: {}", problem);
        }

        if let Some(previous) = self
            .scenarios
            .insert(scenario.id.clone(), Arc::new(scenario))
        {
            tracing::warn!(scenario = %previous.id, "duplicate scenario id, later file wins");
        }
    }

    pub fn get(&self, id: &ScenarioId) -> Option<Arc<Scenario>> {
        self.scenarios.get(id).cloned()
    }

    /// Scenarios in one language, ordered by id for stable listings.
    pub fn by_language(&self, language: Language) -> Vec<Arc<Scenario>> {
        let mut scenarios: Vec<_> = self
            .scenarios
            .values()
            .filter(|s| s.language == language)
            .cloned()
            .collect();
        scenarios.sort_by(|a, b| a.id.cmp(&b.id));
        scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
