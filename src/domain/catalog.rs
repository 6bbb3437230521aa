/// Level catalog: the ordered list of level configurations.
///
/// ## Source format (JSON):
///   ```json
///   { "levels": [
///       { "levelNumber": 1, "objective": "Reach the flag.", "title": "THE ICY BROTHER" },
///       { "levelNumber": 2, "objective": "Climb 12 floors.", "targetFloors": 12 }
///   ] }
///   ```
///
/// Insertion order is play order; lookups are 1-indexed by position, and
/// each entry's `levelNumber` is rewritten to that position.
/// Keys other than `levelNumber`, `objective`, `disableIntro` are kept as
/// free-form parameters for the level kits.
/// Anything not shaped like this is a fatal load error; no partial catalog
/// is ever returned.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_OBJECTIVE: &str = "Reach the goal.";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("level catalog {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level catalog missing or invalid. Expected shape: {{ levels: [...] }} ({0})")]
    Shape(String),
    #[error("level catalog contains no levels")]
    Empty,
    #[error("no config for level {0}")]
    NoSuchLevel(u32),
}

/// One level's configuration. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    #[serde(default)]
    pub level_number: u32,
    #[serde(default = "default_objective")]
    pub objective: String,
    #[serde(default)]
    pub disable_intro: bool,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

fn default_objective() -> String {
    DEFAULT_OBJECTIVE.to_string()
}

impl LevelConfig {
    /// Minimal config; used by tests and standalone runs.
    pub fn new(level_number: u32, objective: &str) -> Self {
        LevelConfig {
            level_number,
            objective: objective.to_string(),
            disable_intro: false,
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param_u32(&self, key: &str) -> Option<u32> {
        self.params.get(key)?.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.as_str()
    }

    /// Objective as announced to the HUD; blank falls back to the default.
    pub fn announced_objective(&self) -> &str {
        match self.objective.trim() {
            "" => DEFAULT_OBJECTIVE,
            _ => &self.objective,
        }
    }

    /// Text of the intro title card.
    pub fn title(&self) -> String {
        match self.param_str("title") {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => format!("LEVEL {}", self.level_number),
        }
    }
}

/// Ordered, non-empty sequence of level configs.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<Rc<LevelConfig>>,
}

#[derive(Deserialize)]
struct CatalogDoc {
    levels: Vec<Value>,
}

impl LevelCatalog {
    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&text)?;
        log::info!("loaded {} levels from {}", catalog.total_levels(), path.display());
        Ok(catalog)
    }

    /// Parse catalog text.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let root: Value = serde_json::from_str(text)?;
        if !root.is_object() {
            return Err(CatalogError::Shape("root is not an object".into()));
        }
        let doc: CatalogDoc = serde_json::from_value(root)
            .map_err(|e| CatalogError::Shape(e.to_string()))?;

        let mut configs = Vec::with_capacity(doc.levels.len());
        for (idx, entry) in doc.levels.into_iter().enumerate() {
            if !entry.is_object() {
                return Err(CatalogError::Shape(format!("entry {} is not an object", idx + 1)));
            }
            let cfg: LevelConfig = serde_json::from_value(entry)
                .map_err(|e| CatalogError::Shape(format!("entry {}: {e}", idx + 1)))?;
            configs.push(cfg);
        }

        Self::from_configs(configs)
    }

    /// Build from configs in play order. Level numbers follow position.
    pub fn from_configs(configs: Vec<LevelConfig>) -> Result<Self, CatalogError> {
        if configs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let levels = configs.into_iter()
            .enumerate()
            .map(|(idx, mut cfg)| {
                let position = idx as u32 + 1;
                if cfg.level_number != 0 && cfg.level_number != position {
                    log::warn!(
                        "catalog entry {position} declares levelNumber {}, using its position",
                        cfg.level_number
                    );
                }
                cfg.level_number = position;
                Rc::new(cfg)
            })
            .collect();
        Ok(LevelCatalog { levels })
    }

    pub fn total_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    /// 1-indexed lookup.
    pub fn get(&self, level_number: u32) -> Result<Rc<LevelConfig>, CatalogError> {
        level_number.checked_sub(1)
            .and_then(|idx| self.levels.get(idx as usize))
            .cloned()
            .ok_or(CatalogError::NoSuchLevel(level_number))
    }
}
