use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};
use crate::localization::{LocalizationCatalog, Translator};
use crate::speaker::SpeakerRegistry;

pub const DEFAULT_TYPEWRITER_DELAY_MS: u64 = 10;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterfaceConfig {
    pub locale: String,
    pub catalog_path: Option<PathBuf>,
    pub typewriter_delay_ms: u64,
    /// Keeps only the most recent entries in the narrative history view.
    pub history_limit: Option<usize>,
    /// Name keys, colors and icons per speaker id.
    pub speakers: SpeakerRegistry,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            catalog_path: None,
            typewriter_delay_ms: DEFAULT_TYPEWRITER_DELAY_MS,
            history_limit: None,
            speakers: SpeakerRegistry::default(),
        }
    }
}

impl InterfaceConfig {
    pub fn from_toml_str(input: &str) -> UiResult<Self> {
        toml::from_str(input).map_err(|err| UiError::Config(err.to_string()))
    }

    /// Missing files fall back to defaults; malformed ones are errors.
    pub fn load_from(path: &Path) -> UiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn save_to(&self, path: &Path) -> UiResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload =
            toml::to_string_pretty(self).map_err(|err| UiError::Config(err.to_string()))?;
        fs::write(path, payload)?;
        Ok(())
    }

    /// Loads the configured catalog, relative paths resolved against `base`.
    pub fn translator(&self, base: &Path) -> UiResult<Translator> {
        let catalog = match &self.catalog_path {
            Some(path) if path.is_relative() => LocalizationCatalog::load_from(&base.join(path))?,
            Some(path) => LocalizationCatalog::load_from(path)?,
            None => LocalizationCatalog::new(self.locale.clone()),
        };
        Ok(Translator::new(catalog, self.locale.clone()))
    }
}
