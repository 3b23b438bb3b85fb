//! `sound_loop_sets` collection.
//!
//! Validation happens in two phases. Structure and volumes are checked when
//! entries are created. Sound references can only be checked once every sound
//! asset is registered, so that part waits for the init-complete signal and
//! runs exactly once for the whole collection.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::assets::SoundAssets;
use crate::collections::base::{Collection, EntryProcessor};
use crate::config::{AudioInterface, ConfigValidator};
use crate::error::{Error, ReferenceProblem, Result};
use crate::lifecycle::InitListener;

/// How far a loop set has been validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    #[default]
    Unvalidated,
    /// Schema and volumes checked.
    StructurallyValid,
    /// Sound references checked against the loaded assets.
    FullyValidated,
}

/// A set of sounds played in sync as a loop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SoundLoopSet {
    pub tempo: f64,
    pub volume: f64,
    pub layers: Vec<LoopLayer>,
    pub events_when_played: Vec<String>,
    pub events_when_stopped: Vec<String>,
    pub events_when_looping: Vec<String>,
    #[serde(skip)]
    pub state: ValidationState,
}

/// One layer of a loop set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoopLayer {
    pub sound: String,
    pub volume: f64,
    pub initial_state: LayerState,
    pub fade_in: f64,
    pub fade_out: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerState {
    Play,
    Stop,
}

/// Clamps a volume into `[0, 1]`. NaN becomes 0.
pub fn clamp_volume(volume: f64) -> f64 {
    volume.max(0.0).min(1.0)
}

/// Structural processor for the `sound_loop_sets` section.
#[derive(Debug, Clone, Copy)]
pub struct SoundLoopSetProcessor {
    audio: Option<AudioInterface>,
}

impl SoundLoopSetProcessor {
    pub fn new(audio: Option<AudioInterface>) -> Self {
        Self { audio }
    }

    /// Validates a loop set and its layers, clamping every volume.
    pub fn process_loop_set(&self, raw: &Value, validator: &ConfigValidator) -> Result<SoundLoopSet> {
        let mut settings = validator.validate("sound_loop_sets", raw, None)?;

        let raw_layers = settings
            .get("layers")
            .and_then(Value::as_sequence)
            .cloned()
            .unwrap_or_default();

        let mut layers = Vec::with_capacity(raw_layers.len());
        for raw_layer in &raw_layers {
            let layer = validator.validate("sound_loop_sets:layers", raw_layer, None)?;
            layers.push(Value::Mapping(layer));
        }
        settings.insert(Value::String("layers".to_string()), Value::Sequence(layers));

        let mut set: SoundLoopSet = serde_yaml::from_value(Value::Mapping(settings))
            .map_err(|e| Error::ConfigValidation("sound_loop_sets".to_string(), e.to_string()))?;

        set.volume = clamp_volume(set.volume);
        for layer in &mut set.layers {
            let clamped = clamp_volume(layer.volume);
            if clamped != layer.volume {
                tracing::debug!(
                    "Clamped volume of layer '{}' from {} to {}",
                    layer.sound,
                    layer.volume,
                    clamped
                );
            }
            layer.volume = clamped;
        }

        set.state = ValidationState::StructurallyValid;
        Ok(set)
    }
}

impl EntryProcessor for SoundLoopSetProcessor {
    type Entry = SoundLoopSet;
    const SECTION: &'static str = "sound_loop_sets";
    const LABEL: &'static str = "SoundLoopSets";

    fn process_config(&self, raw: &Value, validator: &ConfigValidator) -> Result<SoundLoopSet> {
        if self.audio.is_none() {
            return Err(Error::FeatureDisabled(
                "Audio (cannot validate the sound_loop_sets config collection)".to_string(),
            ));
        }
        self.process_loop_set(raw, validator)
    }
}

/// Loop sets plus their pending sound-reference check.
#[derive(Debug)]
pub struct SoundLoopSetCollection {
    sets: Collection<SoundLoopSetProcessor>,
    /// Taken by the deferred check, so it can only run once.
    pending: Option<InitListener>,
}

impl SoundLoopSetCollection {
    /// Creates the collection and arms its deferred sound check on `init`.
    pub fn new(audio: Option<AudioInterface>, init: InitListener) -> Self {
        Self {
            sets: Collection::new(SoundLoopSetProcessor::new(audio)),
            pending: Some(init),
        }
    }

    /// Processes a `sound_loop_sets` section. See [`Collection::create_entries`].
    pub fn create_entries(
        &mut self,
        section: &serde_yaml::Mapping,
        validator: &ConfigValidator,
    ) -> Result<usize> {
        if !self.is_pending() && !section.is_empty() {
            tracing::warn!(
                "Adding {} sound loop set(s) after sound references were already checked; they stay structurally validated only",
                section.len()
            );
        }
        self.sets.create_entries(section, validator)
    }

    pub fn get(&self, name: &str) -> Option<&SoundLoopSet> {
        self.sets.get(name)
    }

    pub fn validation_state(&self, name: &str) -> Option<ValidationState> {
        self.sets.get(name).map(|set| set.state)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SoundLoopSet)> {
        self.sets.iter()
    }

    /// True until the deferred sound check has been started.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits for the init-complete signal, then checks every layer's sound.
    ///
    /// Returns `Ok(true)` when the check ran and passed, and `Ok(false)` when it
    /// did not run: either it already ran, or the signal was dropped without
    /// firing. A missing or streaming sound fails with [`Error::Reference`].
    pub async fn complete_validation<A>(&mut self, assets: &A) -> Result<bool>
    where
        A: SoundAssets + ?Sized,
    {
        let Some(listener) = self.pending.take() else {
            return Ok(false);
        };

        if !listener.wait().await {
            tracing::debug!("Init signal dropped before firing; sound loop set references not checked");
            return Ok(false);
        }

        self.validate_sound_assets(assets)?;
        Ok(true)
    }

    fn validate_sound_assets<A>(&mut self, assets: &A) -> Result<()>
    where
        A: SoundAssets + ?Sized,
    {
        for (name, set) in self.sets.iter() {
            for layer in &set.layers {
                let problem = match assets.sound(&layer.sound) {
                    None => Some(ReferenceProblem::Missing),
                    Some(info) if info.streaming => Some(ReferenceProblem::Streaming),
                    Some(_) => None,
                };
                if let Some(problem) = problem {
                    return Err(Error::Reference {
                        loop_set: name.to_string(),
                        sound: layer.sound.clone(),
                        problem,
                    });
                }
            }
        }

        for (_, set) in self.sets.iter_mut() {
            set.state = ValidationState::FullyValidated;
        }
        tracing::info!("Validated sound references of {} sound loop set(s)", self.sets.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{SoundAssetInfo, SoundCatalog};
    use crate::lifecycle::init_signal;
    use serde_yaml::Mapping;

    fn audio() -> Option<AudioInterface> {
        Some(AudioInterface {
            buffer: 2048,
            frequency: 44100,
            channels: 2,
        })
    }

    fn section(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn catalog(sounds: &[(&str, bool)]) -> SoundCatalog {
        sounds
            .iter()
            .map(|(name, streaming)| (name.to_string(), SoundAssetInfo { streaming: *streaming }))
            .collect()
    }

    const BASIC: &str = r#"
basic_beat:
  tempo: 90
  layers:
    - sound: kick
      volume: -0.5
    - sound: snare
      volume: 1.5
    - sound: hat
      volume: 0.4
"#;

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(-0.5), 0.0);
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(0.4), 0.4);
        assert_eq!(clamp_volume(f64::NAN), 0.0);
    }

    #[test]
    fn test_structural_validation_clamps_layers() {
        let validator = ConfigValidator::builtin().unwrap();
        let (_trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);

        sets.create_entries(&section(BASIC), &validator).unwrap();

        let set = sets.get("basic_beat").unwrap();
        let volumes: Vec<f64> = set.layers.iter().map(|l| l.volume).collect();
        assert_eq!(volumes, vec![0.0, 1.0, 0.4]);
        assert_eq!(set.tempo, 90.0);
        assert_eq!(set.layers[0].initial_state, LayerState::Play);
        assert_eq!(
            sets.validation_state("basic_beat"),
            Some(ValidationState::StructurallyValid)
        );
    }

    #[test]
    fn test_audio_disabled_stores_nothing() {
        let validator = ConfigValidator::builtin().unwrap();
        let (_trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(None, listener);

        let err = sets.create_entries(&section(BASIC), &validator).unwrap_err();
        assert!(matches!(err.root(), Error::FeatureDisabled(_)));
        assert!(sets.is_empty());
    }

    #[test]
    fn test_bad_layer_rejected() {
        let validator = ConfigValidator::builtin().unwrap();
        let (_trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);

        let err = sets
            .create_entries(&section("broken:\n  layers:\n    - volume: 0.5\n"), &validator)
            .unwrap_err();
        assert!(err.to_string().contains("'broken' entry in the sound_loop_sets"));
    }

    #[tokio::test]
    async fn test_deferred_check_passes_after_signal() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section(BASIC), &validator).unwrap();

        let assets = catalog(&[("kick", false), ("snare", false), ("hat", false)]);
        trigger.fire();

        assert!(sets.complete_validation(&assets).await.unwrap());
        assert_eq!(
            sets.validation_state("basic_beat"),
            Some(ValidationState::FullyValidated)
        );
    }

    #[tokio::test]
    async fn test_deferred_check_waits_for_signal() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section(BASIC), &validator).unwrap();

        // Assets are registered while the check is already waiting.
        let assets = std::sync::Arc::new(SoundCatalog::new());
        let check_assets = std::sync::Arc::clone(&assets);
        let check = tokio::spawn(async move {
            let result = sets.complete_validation(&*check_assets).await;
            (sets, result)
        });

        for name in ["kick", "snare", "hat"] {
            assets
                .register(crate::assets::SoundAsset {
                    name: name.to_string(),
                    file: format!("{}.wav", name),
                    streaming: false,
                    volume: 0.5,
                })
                .unwrap();
        }
        trigger.fire();

        let (sets, result) = check.await.unwrap();
        assert!(result.unwrap());
        assert!(!sets.is_pending());
    }

    #[tokio::test]
    async fn test_missing_sound_is_reference_error() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section("set_a:\n  layers:\n    - sound: X\n"), &validator)
            .unwrap();

        trigger.fire();
        let err = sets.complete_validation(&catalog(&[])).await.unwrap_err();

        match &err {
            Error::Reference { loop_set, sound, problem } => {
                assert_eq!(loop_set, "set_a");
                assert_eq!(sound, "X");
                assert_eq!(*problem, ReferenceProblem::Missing);
            }
            other => panic!("expected reference error, got {other}"),
        }
        assert!(err.to_string().contains("'X'"));
        assert_eq!(
            sets.validation_state("set_a"),
            Some(ValidationState::StructurallyValid)
        );
    }

    #[tokio::test]
    async fn test_streaming_sound_is_reference_error() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section("set_a:\n  layers:\n    - sound: X\n"), &validator)
            .unwrap();

        trigger.fire();
        let err = sets
            .complete_validation(&catalog(&[("X", true)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Reference { ref sound, problem: ReferenceProblem::Streaming, .. } if sound == "X"
        ));
    }

    #[tokio::test]
    async fn test_deferred_check_runs_once() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section("set_a:\n  layers:\n    - sound: X\n"), &validator)
            .unwrap();

        trigger.fire();
        assert!(sets.complete_validation(&catalog(&[])).await.is_err());

        // Second attempt does nothing, even though the reference is still bad.
        assert!(!sets.complete_validation(&catalog(&[])).await.unwrap());
    }

    #[tokio::test]
    async fn test_signal_never_fired_is_not_a_failure() {
        let validator = ConfigValidator::builtin().unwrap();
        let (trigger, listener) = init_signal();
        let mut sets = SoundLoopSetCollection::new(audio(), listener);
        sets.create_entries(&section("set_a:\n  layers:\n    - sound: X\n"), &validator)
            .unwrap();

        drop(trigger);
        assert!(!sets.complete_validation(&catalog(&[])).await.unwrap());
        assert_eq!(
            sets.validation_state("set_a"),
            Some(ValidationState::StructurallyValid)
        );
    }
}
