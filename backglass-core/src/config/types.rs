//! Configuration types: schema field specs and the merged machine config.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Value type a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Str,
    Float,
    Int,
    Bool,
    List,
    Dict,
    Any,
    /// Seconds, given as a number or a string such as `"250ms"` or `"2s"`.
    Time,
    /// Hex string (`"ff8000"`, `"ff8000c0"`) or a list of 3/4 channel values.
    Color,
}

/// Spec for a single setting in a schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Item type for `list` fields.
    #[serde(default)]
    pub item: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Allowed values for `str` fields.
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// A named set of field specs, ordered by setting name.
pub type Schema = BTreeMap<String, FieldSpec>;

/// All sections this crate consumes from the machine config files.
///
/// Sections owned by other subsystems are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub animations: Mapping,
    #[serde(default)]
    pub sound_loop_sets: Mapping,
    #[serde(default)]
    pub sounds: Mapping,
    #[serde(default)]
    pub widgets: Mapping,
    #[serde(default)]
    pub sound_system: Option<Value>,
    #[serde(default)]
    pub effects: Option<Value>,
    /// Files this config was merged from, in merge order.
    #[serde(skip)]
    pub source_paths: Vec<PathBuf>,
}

impl MachineConfig {
    /// Merges a later config file into this one.
    ///
    /// Named-entry sections merge key by key, so a later file replaces
    /// same-named entries. Settings sections are replaced wholesale.
    pub fn merge(&mut self, other: MachineConfig) {
        merge_section(&mut self.animations, other.animations);
        merge_section(&mut self.sound_loop_sets, other.sound_loop_sets);
        merge_section(&mut self.sounds, other.sounds);
        merge_section(&mut self.widgets, other.widgets);
        if other.sound_system.is_some() {
            self.sound_system = other.sound_system;
        }
        if other.effects.is_some() {
            self.effects = other.effects;
        }
        self.source_paths.extend(other.source_paths);
    }

    /// Total number of named entries across all collection sections.
    pub fn entry_count(&self) -> usize {
        self.animations.len() + self.sound_loop_sets.len() + self.sounds.len() + self.widgets.len()
    }
}

fn merge_section(into: &mut Mapping, from: Mapping) {
    for (key, value) in from {
        into.insert(key, value);
    }
}

/// Validated `sound_system` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SoundSystemSettings {
    pub enabled: bool,
    pub buffer: u32,
    pub frequency: u32,
    pub channels: u8,
}

impl SoundSystemSettings {
    /// Returns the audio interface described by these settings, if audio is enabled.
    pub fn audio_interface(&self) -> Option<AudioInterface> {
        if !self.enabled {
            return None;
        }
        Some(AudioInterface {
            buffer: self.buffer,
            frequency: self.frequency,
            channels: self.channels,
        })
    }
}

/// Capability token proving the audio subsystem is present.
///
/// Sound loop sets can only be processed when one of these exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInterface {
    pub buffer: u32,
    pub frequency: u32,
    pub channels: u8,
}

/// Validated `effects` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EffectsSettings {
    /// Pluggable effect modules to enable, by module name.
    #[serde(default)]
    pub modules: Vec<String>,
}
