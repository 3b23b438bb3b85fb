//! Backglass Core - config collections and effect pipelines for a media controller.
//!
//! This library provides:
//! - Machine config loading and schema validation for YAML files
//! - Named collections (animations, sound loop sets) with deferred validation
//! - A sound asset catalog used to check sound references
//! - An effect registry that builds shader pipelines from declarative specs
//!
//! # Example
//!
//! ```rust,no_run
//! use backglass_core::config::{ConfigLoader, ConfigValidator, EffectsSettings};
//! use backglass_core::effects::EffectRegistry;
//!
//! let loader = ConfigLoader::new("config");
//! let machine = loader.load_all().unwrap();
//!
//! let mut validator = ConfigValidator::builtin().unwrap();
//! let registry = EffectRegistry::startup(&EffectsSettings::default(), &mut validator).unwrap();
//!
//! for (name, widget) in &machine.widgets {
//!     let passes = registry.build_all(&widget["effects"]).unwrap();
//!     println!("{:?}: {} pass(es)", name, passes.len());
//! }
//! ```

pub mod assets;
pub mod collections;
pub mod config;
pub mod effects;
pub mod error;
pub mod lifecycle;

pub use error::{Error, Result};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::assets::{SoundAssetInfo, SoundAssets, SoundCatalog};
    pub use crate::collections::{
        AnimationCollection, AnimationStep, SoundLoopSet, SoundLoopSetCollection,
        ValidationState,
    };
    pub use crate::config::{
        AudioInterface, ConfigLoader, ConfigValidator, EffectsSettings, MachineConfig,
        SoundSystemSettings,
    };
    pub use crate::effects::{Effect, EffectRegistry, EffectSource};
    pub use crate::error::{Error, Result};
    pub use crate::lifecycle::{init_signal, InitListener, InitTrigger};
}
