//! YAML machine-config loader with caching and discovery.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::types::MachineConfig;
use crate::error::{Error, Result};

/// Machine config loader with caching.
/// Supports scanning multiple directories (e.g., shipped defaults + a machine folder).
/// When filenames collide, later directories override earlier ones.
pub struct ConfigLoader {
    config_dirs: Vec<PathBuf>,
    cache: Arc<RwLock<HashMap<PathBuf, MachineConfig>>>,
}

impl ConfigLoader {
    /// Creates a new config loader for a single directory.
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self::new_with_dirs(vec![config_dir.as_ref().to_path_buf()])
    }

    /// Creates a new config loader that scans multiple directories.
    /// Directories are scanned in order; files from later directories
    /// override earlier ones when filenames collide.
    pub fn new_with_dirs(config_dirs: Vec<PathBuf>) -> Self {
        Self {
            config_dirs,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Loads a single config by filename (searches all directories).
    pub fn load(&self, filename: &str) -> Result<MachineConfig> {
        // Search directories in reverse order (later dirs take priority)
        let path = self
            .config_dirs
            .iter()
            .rev()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| {
                Error::ConfigLoad(
                    filename.to_string(),
                    "File not found in any config directory".to_string(),
                )
            })?;

        self.load_cached(&path)
    }

    fn load_cached(&self, path: &Path) -> Result<MachineConfig> {
        {
            let cache = self.cache.read().map_err(|_| Error::CacheLock)?;
            if let Some(config) = cache.get(path) {
                return Ok(config.clone());
            }
        }

        let config = Self::load_from_path(path)?;

        {
            let mut cache = self.cache.write().map_err(|_| Error::CacheLock)?;
            cache.insert(path.to_path_buf(), config.clone());
        }

        Ok(config)
    }

    /// Loads config from a specific path, recording it as the source.
    fn load_from_path(path: &Path) -> Result<MachineConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(path.display().to_string(), e.to_string()))?;

        // An empty file is a valid, empty config.
        let mut config: MachineConfig = if content.trim().is_empty() {
            MachineConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::ConfigParse(path.display().to_string(), e.to_string()))?
        };

        config.source_paths = vec![path.to_path_buf()];
        Ok(config)
    }

    /// Discovers all config files across all directories.
    /// Returns (filename, full_path) pairs sorted by filename. Later directories override earlier.
    fn discover_all_with_paths(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut by_name: HashMap<String, PathBuf> = HashMap::new();

        for dir in &self.config_dirs {
            if !dir.exists() {
                tracing::debug!("Config dir {} does not exist, skipping", dir.display());
                continue;
            }
            let entries = fs::read_dir(dir)
                .map_err(|e| Error::ConfigLoad(dir.display().to_string(), e.to_string()))?;

            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml") {
                    if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                        by_name.insert(filename.to_string(), path);
                    }
                }
            }
        }

        let mut configs: Vec<(String, PathBuf)> = by_name.into_iter().collect();
        configs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(configs)
    }

    /// Discovers all config filenames across all directories.
    pub fn discover_all(&self) -> Result<Vec<String>> {
        Ok(self
            .discover_all_with_paths()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Loads every discovered file and merges them, in filename order, into one config.
    ///
    /// Unlike a per-file browse, a machine config must be complete, so any file
    /// that fails to load or parse fails the whole load.
    pub fn load_all(&self) -> Result<MachineConfig> {
        let mut merged = MachineConfig::default();

        for (filename, path) in self.discover_all_with_paths()? {
            let config = self.load_cached(&path)?;
            tracing::debug!(
                "Merged config {} ({} entries)",
                filename,
                config.entry_count()
            );
            merged.merge(config);
        }

        tracing::info!(
            "Loaded machine config from {} file(s), {} entries",
            merged.source_paths.len(),
            merged.entry_count()
        );
        Ok(merged)
    }

    /// Clears the config cache.
    pub fn clear_cache(&self) -> Result<()> {
        let mut cache = self.cache.write().map_err(|_| Error::CacheLock)?;
        cache.clear();
        Ok(())
    }

    /// Returns the primary (first) config directory path.
    pub fn config_dir(&self) -> &Path {
        self.config_dirs.first().map(|p| p.as_path()).unwrap_or(Path::new("."))
    }

    /// Returns all config directories.
    pub fn config_dirs(&self) -> &[PathBuf] {
        &self.config_dirs
    }
}
