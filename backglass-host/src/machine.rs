//! Machine startup sequence.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use backglass_core::prelude::*;

/// What to start and how far to go.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Config directories, later ones overriding earlier ones.
    pub config_dirs: Vec<PathBuf>,
    /// Validate widget effects without building their pipelines.
    pub check_only: bool,
}

/// Everything loaded from a machine config.
pub struct Machine {
    pub config: MachineConfig,
    pub validator: ConfigValidator,
    pub audio: Option<AudioInterface>,
    pub registry: EffectRegistry,
    pub animations: AnimationCollection,
    pub sound_loop_sets: SoundLoopSetCollection,
    pub sounds: Arc<SoundCatalog>,
    /// Validated effect specs per widget, defaults filled.
    pub widget_effects: BTreeMap<String, Vec<Mapping>>,
    /// Whether the deferred sound-reference check ran.
    pub sound_references_checked: bool,
}

impl Machine {
    /// Runs the startup sequence.
    ///
    /// Collections are created before any sound asset is registered; the
    /// loop-set sound check waits for the init signal, which fires once every
    /// sound is in the catalog.
    pub async fn start(config_dirs: Vec<PathBuf>) -> anyhow::Result<Self> {
        let loader = ConfigLoader::new_with_dirs(config_dirs);
        let config = loader.load_all().context("Failed to load machine config")?;

        let mut validator =
            ConfigValidator::builtin().context("Failed to load built-in config schemas")?;

        let sound_system: SoundSystemSettings = validator
            .validate_into("sound_system", settings_section(&config.sound_system), None)
            .context("Invalid sound_system section")?;
        let audio = sound_system.audio_interface();
        match &audio {
            Some(a) => tracing::info!(
                "Sound system enabled: {} Hz, {} channel(s), buffer {}",
                a.frequency,
                a.channels,
                a.buffer
            ),
            None => tracing::info!("Sound system disabled"),
        }

        let effects: EffectsSettings = validator
            .validate_into("effects", settings_section(&config.effects), None)
            .context("Invalid effects section")?;
        let registry = EffectRegistry::startup(&effects, &mut validator)
            .context("Failed to register effect modules")?;

        let mut animations = AnimationCollection::default();
        animations
            .create_entries(&config.animations, &validator)
            .context("Invalid animations")?;

        let (trigger, listener) = init_signal();
        let mut sound_loop_sets = SoundLoopSetCollection::new(audio, listener);
        sound_loop_sets
            .create_entries(&config.sound_loop_sets, &validator)
            .context("Invalid sound_loop_sets")?;

        let sounds = Arc::new(SoundCatalog::new());
        let deferred = {
            let sounds = Arc::clone(&sounds);
            tokio::spawn(async move {
                let checked = sound_loop_sets.complete_validation(&*sounds).await;
                (sound_loop_sets, checked)
            })
        };

        let registered = sounds
            .register_section(&config.sounds, &validator)
            .context("Invalid sounds")?;
        tracing::info!("Registered {} sound asset(s)", registered);
        trigger.fire();

        let (sound_loop_sets, checked) = deferred
            .await
            .context("Deferred sound check did not complete")?;
        let sound_references_checked = checked.context("Sound loop set validation failed")?;

        let widget_effects = validate_widget_effects(&config.widgets, &registry, &validator)?;

        Ok(Self {
            config,
            validator,
            audio,
            registry,
            animations,
            sound_loop_sets,
            sounds,
            widget_effects,
            sound_references_checked,
        })
    }

    /// Builds the effect pipeline of every widget that declares effects.
    pub fn build_pipelines(&self) -> anyhow::Result<BTreeMap<String, Vec<Box<dyn Effect>>>> {
        let mut pipelines = BTreeMap::new();
        for (widget, specs) in &self.widget_effects {
            let specs = Value::Sequence(specs.iter().cloned().map(Value::Mapping).collect());
            let passes = self
                .registry
                .build_all(&specs)
                .with_context(|| format!("Failed to build effects for widget '{}'", widget))?;
            tracing::debug!("Widget '{}': {} effect pass(es)", widget, passes.len());
            pipelines.insert(widget.clone(), passes);
        }
        Ok(pipelines)
    }

    pub fn summary(&self, pipelines: Option<&BTreeMap<String, Vec<Box<dyn Effect>>>>) -> StartupSummary {
        StartupSummary {
            config_files: self.config.source_paths.clone(),
            audio_enabled: self.audio.is_some(),
            effect_types: self.registry.names().into_iter().map(String::from).collect(),
            animations: self.animations.names().into_iter().map(String::from).collect(),
            sound_loop_sets: self
                .sound_loop_sets
                .iter()
                .map(|(name, set)| LoopSetSummary {
                    name: name.to_string(),
                    layers: set.layers.len(),
                    state: set.state,
                })
                .collect(),
            sounds: self.sounds.len(),
            sound_references_checked: self.sound_references_checked,
            widget_effects: self
                .widget_effects
                .iter()
                .map(|(widget, specs)| (widget.clone(), specs.len()))
                .collect(),
            pipelines: pipelines.map(|pipelines| {
                pipelines
                    .iter()
                    .map(|(widget, passes)| {
                        (widget.clone(), passes.iter().map(|p| p.name().to_string()).collect())
                    })
                    .collect()
            }),
        }
    }
}

/// Starts the machine and reports what was loaded.
pub async fn run(options: &StartupOptions) -> anyhow::Result<StartupSummary> {
    let machine = Machine::start(options.config_dirs.clone()).await?;
    if options.check_only {
        return Ok(machine.summary(None));
    }
    let pipelines = machine.build_pipelines()?;
    Ok(machine.summary(Some(&pipelines)))
}

fn settings_section(section: &Option<Value>) -> &Value {
    const NONE: &Value = &Value::Null;
    section.as_ref().unwrap_or(NONE)
}

fn validate_widget_effects(
    widgets: &Mapping,
    registry: &EffectRegistry,
    validator: &ConfigValidator,
) -> anyhow::Result<BTreeMap<String, Vec<Mapping>>> {
    let mut validated = BTreeMap::new();
    for (key, widget) in widgets {
        let name = key
            .as_str()
            .with_context(|| format!("Widget names must be strings, got {:?}", key))?;
        let Some(effects) = widget.get("effects") else {
            continue;
        };
        let specs = registry
            .validate_effects(effects, validator)
            .with_context(|| format!("Invalid effects for widget '{}'", name))?;
        validated.insert(name.to_string(), specs);
    }
    Ok(validated)
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoopSetSummary {
    pub name: String,
    pub layers: usize,
    pub state: ValidationState,
}

/// Report of a completed startup.
#[derive(Debug, Clone, Serialize)]
pub struct StartupSummary {
    pub config_files: Vec<PathBuf>,
    pub audio_enabled: bool,
    pub effect_types: Vec<String>,
    pub animations: Vec<String>,
    pub sound_loop_sets: Vec<LoopSetSummary>,
    pub sounds: usize,
    pub sound_references_checked: bool,
    /// Effect spec count per widget.
    pub widget_effects: BTreeMap<String, usize>,
    /// Pass names per widget; absent when pipelines were not built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<BTreeMap<String, Vec<String>>>,
}

impl fmt::Display for StartupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config files: {}", self.config_files.len())?;
        writeln!(f, "Audio: {}", if self.audio_enabled { "enabled" } else { "disabled" })?;
        writeln!(f, "Effect types: {}", self.effect_types.join(", "))?;
        writeln!(f, "Animations: {}", self.animations.len())?;
        writeln!(f, "Sounds: {}", self.sounds)?;
        writeln!(f, "Sound loop sets: {}", self.sound_loop_sets.len())?;
        for set in &self.sound_loop_sets {
            writeln!(f, "  {} ({} layer(s), {:?})", set.name, set.layers, set.state)?;
        }
        match &self.pipelines {
            Some(pipelines) => {
                writeln!(f, "Widget pipelines: {}", pipelines.len())?;
                for (widget, passes) in pipelines {
                    writeln!(f, "  {}: {}", widget, passes.join(" -> "))?;
                }
            }
            None => writeln!(f, "Widgets with effects: {}", self.widget_effects.len())?,
        }
        Ok(())
    }
}
