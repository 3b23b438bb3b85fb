//! Effect type registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigValidator, EffectsSettings};
use crate::effects::builtin::register_builtin_effects;
use crate::effects::modules::find_module;
use crate::effects::EffectFactory;
use crate::error::{Error, Result};

/// Maps effect type names to their factories.
///
/// Filled at startup; later registrations replace earlier ones and nothing is
/// ever removed.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    factories: HashMap<String, Arc<dyn EffectFactory>>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the toolkit effects.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtin_effects(&mut registry);
        registry
    }

    /// Builds the startup registry: toolkit effects plus every configured module.
    ///
    /// Module schemas are installed into `validator`.
    pub fn startup(settings: &EffectsSettings, validator: &mut ConfigValidator) -> Result<Self> {
        let mut registry = Self::with_builtins();
        registry.register_modules(&settings.modules, validator)?;
        tracing::info!(
            "Effect registry ready: {} type(s) ({} module(s))",
            registry.len(),
            settings.modules.len()
        );
        Ok(registry)
    }

    /// Registers a factory under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: EffectFactory + 'static,
    {
        self.register_shared(name, Arc::new(factory));
    }

    /// Registers an already shared factory under `name`.
    pub fn register_shared(&mut self, name: impl Into<String>, factory: Arc<dyn EffectFactory>) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::debug!("Effect type '{}' re-registered, replacing the earlier factory", name);
        }
    }

    /// Resolves and registers pluggable modules by module name.
    ///
    /// An unknown module, or one exposing an empty type name or an unusable
    /// schema, is a fatal configuration error.
    pub fn register_modules(&mut self, modules: &[String], validator: &mut ConfigValidator) -> Result<usize> {
        for module_name in modules {
            let module = find_module(module_name).ok_or_else(|| {
                Error::Registration(module_name.clone(), "no such effect module".to_string())
            })?;

            if module.name.is_empty() {
                return Err(Error::Registration(
                    module_name.clone(),
                    "module does not expose an effect name".to_string(),
                ));
            }

            validator
                .load_schemas(module.schema)
                .map_err(|e| Error::Registration(module_name.clone(), e.to_string()))?;

            self.register_shared(module.name, Arc::from((module.factory)()));
            tracing::debug!("Registered effect module '{}' as '{}'", module_name, module.name);
        }
        Ok(modules.len())
    }

    pub fn factory(&self, name: &str) -> Option<&Arc<dyn EffectFactory>> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("types", &self.names())
            .finish()
    }
}
