//! Sound asset catalog.
//!
//! Decoding and playback live elsewhere; this crate only needs to know which
//! sounds exist and whether each one is streamed or held in memory.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::config::ConfigValidator;
use crate::error::{Error, Result};

/// What deferred validation needs to know about a sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundAssetInfo {
    pub streaming: bool,
}

/// Read-only lookup of registered sound assets.
pub trait SoundAssets {
    fn sound(&self, name: &str) -> Option<SoundAssetInfo>;
}

impl SoundAssets for HashMap<String, SoundAssetInfo> {
    fn sound(&self, name: &str) -> Option<SoundAssetInfo> {
        self.get(name).copied()
    }
}

/// A sound asset entry from the `sounds` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundAsset {
    pub name: String,
    pub file: String,
    pub streaming: bool,
    pub volume: f64,
}

#[derive(Deserialize)]
struct SoundSettings {
    file: Option<String>,
    streaming: bool,
    volume: f64,
}

/// Catalog of sound assets.
///
/// Written by the single asset-loading path before the init signal fires,
/// read by deferred validation afterwards.
#[derive(Debug, Default)]
pub struct SoundCatalog {
    sounds: RwLock<HashMap<String, SoundAsset>>,
}

impl SoundCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from the `sounds` config section.
    pub fn from_config(section: &Mapping, validator: &ConfigValidator) -> Result<Self> {
        let catalog = Self::new();
        catalog.register_section(section, validator)?;
        Ok(catalog)
    }

    /// Registers every sound of a `sounds` config section. Returns how many.
    pub fn register_section(&self, section: &Mapping, validator: &ConfigValidator) -> Result<usize> {
        for (key, settings) in section {
            let name = key.as_str().ok_or_else(|| {
                Error::ConfigValidation("sounds".to_string(), format!("Invalid sound name {:?}", key))
            })?;
            let settings: SoundSettings = validator
                .validate_into("assets:sounds", settings, None)
                .map_err(|e| Error::CollectionEntry {
                    collection: "sounds",
                    entry: name.to_string(),
                    source: Box::new(e),
                })?;
            self.register(SoundAsset {
                name: name.to_string(),
                // The file defaults to the asset name
                file: settings.file.unwrap_or_else(|| name.to_string()),
                streaming: settings.streaming,
                volume: settings.volume,
            })?;
        }
        Ok(section.len())
    }

    /// Registers a sound, replacing any earlier one with the same name.
    pub fn register(&self, asset: SoundAsset) -> Result<()> {
        let mut sounds = self.sounds.write().map_err(|_| Error::CacheLock)?;
        tracing::debug!(
            "Registered sound asset '{}' ({})",
            asset.name,
            if asset.streaming { "streaming" } else { "in-memory" }
        );
        sounds.insert(asset.name.clone(), asset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<SoundAsset> {
        self.sounds.read().ok()?.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.sounds.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SoundAssets for SoundCatalog {
    fn sound(&self, name: &str) -> Option<SoundAssetInfo> {
        let sounds = self.sounds.read().ok()?;
        sounds.get(name).map(|s| SoundAssetInfo {
            streaming: s.streaming,
        })
    }
}

/// Convenience for tests and hosts that build assets inline.
impl FromIterator<(String, SoundAssetInfo)> for SoundCatalog {
    fn from_iter<I: IntoIterator<Item = (String, SoundAssetInfo)>>(iter: I) -> Self {
        let sounds = iter
            .into_iter()
            .map(|(name, info)| {
                let asset = SoundAsset {
                    file: name.clone(),
                    name: name.clone(),
                    streaming: info.streaming,
                    volume: 0.5,
                };
                (name, asset)
            })
            .collect();
        Self {
            sounds: RwLock::new(sounds),
        }
    }
}

/// Parses a standalone `sounds` section, e.g. one embedded in a test or a host override.
pub fn sounds_section(yaml: &str) -> Result<Mapping> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(m)) => Ok(m),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(Error::ConfigParse(
            "sounds".to_string(),
            "Expected a mapping of sound names".to_string(),
        )),
        Err(e) => Err(Error::ConfigParse("sounds".to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        let validator = ConfigValidator::builtin().unwrap();
        let section = sounds_section(
            r#"
kick: {}
music:
  file: theme.ogg
  streaming: true
"#,
        )
        .unwrap();

        let catalog = SoundCatalog::from_config(&section, &validator).unwrap();
        assert_eq!(catalog.len(), 2);

        let kick = catalog.get("kick").unwrap();
        assert_eq!(kick.file, "kick");
        assert!(!kick.streaming);

        assert_eq!(catalog.sound("music"), Some(SoundAssetInfo { streaming: true }));
        assert_eq!(catalog.sound("missing"), None);
    }

    #[test]
    fn test_from_config_rejects_bad_entry() {
        let validator = ConfigValidator::builtin().unwrap();
        let section = sounds_section("kick: { streaming: maybe }").unwrap();

        let err = SoundCatalog::from_config(&section, &validator).unwrap_err();
        assert!(err.to_string().contains("'kick' entry in the sounds"));
    }

    #[test]
    fn test_register_section_into_shared_catalog() {
        let validator = ConfigValidator::builtin().unwrap();
        let catalog = std::sync::Arc::new(SoundCatalog::new());
        let reader = std::sync::Arc::clone(&catalog);
        assert!(reader.sound("kick").is_none());

        let registered = catalog
            .register_section(&sounds_section("{kick: {}, hat: {}}").unwrap(), &validator)
            .unwrap();
        assert_eq!(registered, 2);
        assert_eq!(reader.sound("hat"), Some(SoundAssetInfo { streaming: false }));
        assert!(sounds_section("").unwrap().is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let catalog: SoundCatalog =
            [("kick".to_string(), SoundAssetInfo { streaming: true })].into_iter().collect();
        catalog
            .register(SoundAsset {
                name: "kick".to_string(),
                file: "kick.wav".to_string(),
                streaming: false,
                volume: 0.5,
            })
            .unwrap();
        assert_eq!(catalog.sound("kick"), Some(SoundAssetInfo { streaming: false }));
    }
}
