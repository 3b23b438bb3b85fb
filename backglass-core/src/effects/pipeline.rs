//! Building effect pipelines from widget effect specs.

use serde_yaml::{Mapping, Value};

use crate::collections::as_entry_list;
use crate::config::ConfigValidator;
use crate::effects::{Effect, EffectFactory, EffectRegistry};
use crate::error::{Error, Result};

impl EffectRegistry {
    /// Builds the ordered passes for one effect spec.
    ///
    /// `None` (or a null spec) yields an empty pipeline. Spec keys that are not
    /// properties of the effect type are ignored.
    pub fn build(&self, spec: Option<&Value>) -> Result<Vec<Box<dyn Effect>>> {
        let spec = match spec {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Mapping(m)) => m,
            Some(other) => return Err(Error::MalformedEffect(format!("{:?}", other))),
        };

        let (type_name, factory) = self.resolve(spec)?;
        let source = factory.instantiate(type_name, spec)?;
        let passes = source.expand();
        tracing::trace!("Built '{}' effect into {} pass(es)", type_name, passes.len());
        Ok(passes)
    }

    /// Builds and concatenates the pipelines of a widget's effect list, in order.
    pub fn build_all(&self, specs: &Value) -> Result<Vec<Box<dyn Effect>>> {
        if specs.is_null() {
            return Ok(Vec::new());
        }
        let mut passes = Vec::new();
        for spec in as_entry_list(specs) {
            passes.extend(self.build(Some(spec))?);
        }
        Ok(passes)
    }

    /// Validates the `effects` section of a widget.
    ///
    /// A single spec is treated as a one-element list. Every entry must name a
    /// registered type and pass its `effects:<type>` schema (which extends
    /// `effects:common`). Returns the validated specs with defaults filled.
    pub fn validate_effects(&self, raw: &Value, validator: &ConfigValidator) -> Result<Vec<Mapping>> {
        if raw.is_null() {
            return Ok(Vec::new());
        }
        as_entry_list(raw)
            .into_iter()
            .map(|effect| self.process_effect(effect, validator))
            .collect()
    }

    fn process_effect(&self, raw: &Value, validator: &ConfigValidator) -> Result<Mapping> {
        let spec = raw
            .as_mapping()
            .ok_or_else(|| Error::MalformedEffect(format!("{:?}", raw)))?;
        let (type_name, _) = self.resolve(spec)?;

        let schema = format!("effects:{}", type_name).to_lowercase();
        validator.validate(&schema, raw, Some("effects:common"))
    }

    fn resolve<'s>(&self, spec: &'s Mapping) -> Result<(&'s str, &dyn EffectFactory)> {
        let type_name = spec
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedEffect(format!("{:?}", spec)))?;

        let factory = self
            .factory(type_name)
            .ok_or_else(|| Error::UnknownEffect(type_name.to_string()))?;

        Ok((type_name, factory.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectsSettings;
    use crate::effects::{
        ColorChannelMix, Dmd, EffectBlueprint, EffectParam, EffectSource, Gain, Pixelate,
    };

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn registry_with_modules(modules: &[&str]) -> (EffectRegistry, ConfigValidator) {
        let mut validator = ConfigValidator::builtin().unwrap();
        let settings = EffectsSettings {
            modules: modules.iter().map(|m| m.to_string()).collect(),
        };
        let registry = EffectRegistry::startup(&settings, &mut validator).unwrap();
        (registry, validator)
    }

    #[test]
    fn test_build_pixelate_applies_property() {
        let registry = EffectRegistry::with_builtins();
        let effects = registry
            .build(Some(&yaml("{type: pixelate, pixel_size: 4}")))
            .unwrap();

        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].downcast_ref::<Pixelate>().unwrap().pixel_size, 4);
        assert_eq!(effects[0].param("pixel_size"), Some(EffectParam::Int(4)));
    }

    #[test]
    fn test_build_ignores_unknown_properties() {
        let registry = EffectRegistry::with_builtins();
        let effects = registry
            .build(Some(&yaml("{type: pixelate, sparkle: true, pixel_size: 6}")))
            .unwrap();
        assert_eq!(effects[0].downcast_ref::<Pixelate>().unwrap().pixel_size, 6);
    }

    #[test]
    fn test_build_uses_defaults() {
        let registry = EffectRegistry::with_builtins();
        let effects = registry
            .build(Some(&yaml("{type: color_channel_mix}")))
            .unwrap();
        assert_eq!(
            effects[0].downcast_ref::<ColorChannelMix>().unwrap().order,
            vec![1, 2, 0]
        );
    }

    #[test]
    fn test_build_unknown_type() {
        let registry = EffectRegistry::with_builtins();
        let err = registry.build(Some(&yaml("{type: bogus}"))).unwrap_err();
        assert!(matches!(err, Error::UnknownEffect(ref name) if name == "bogus"));
        assert!(err.to_string().contains("bogus"));
        assert!(err.is_registration());
    }

    #[test]
    fn test_build_malformed_type() {
        let registry = EffectRegistry::with_builtins();
        for spec in ["{pixel_size: 4}", "{type: [pixelate]}", "pixelate"] {
            let result = registry.build(Some(&yaml(spec)));
            assert!(
                matches!(result, Err(Error::MalformedEffect(_))),
                "spec {} should be malformed",
                spec
            );
        }
    }

    #[test]
    fn test_build_none_is_empty_every_time() {
        let registry = EffectRegistry::with_builtins();
        for _ in 0..3 {
            assert!(registry.build(None).unwrap().is_empty());
        }
        assert!(registry.build(Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn test_reregistration_uses_latest_constructor() {
        let mut registry = EffectRegistry::new();
        registry.register("foo", EffectBlueprint::new(|| Gain { gain: 1.0 }));
        registry.register("foo", EffectBlueprint::new(|| Gain { gain: 2.0 }));

        let effects = registry.build(Some(&yaml("{type: foo}"))).unwrap();
        assert_eq!(effects[0].downcast_ref::<Gain>().unwrap().gain, 2.0);
    }

    #[test]
    fn test_chain_expands_to_members() {
        let (registry, _) = registry_with_modules(&["dmd"]);
        let effects = registry
            .build(Some(&yaml("{type: dmd, width: 192, dot_filter: false, gain: 1.5}")))
            .unwrap();

        let names: Vec<&str> = effects.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["monochrome", "reduce", "gain"]);
        assert_eq!(effects[1].param("width"), Some(EffectParam::Int(192)));
        assert_eq!(effects[2].param("gain"), Some(EffectParam::Float(1.5)));
    }

    #[test]
    fn test_source_without_passes_builds_empty() {
        #[derive(Debug, Default)]
        struct Bypass;

        impl EffectSource for Bypass {
            fn expand(self: Box<Self>) -> Vec<Box<dyn Effect>> {
                Vec::new()
            }
        }

        let mut registry = EffectRegistry::new();
        registry.register("bypass", EffectBlueprint::new(Bypass::default));
        assert!(registry.build(Some(&yaml("{type: bypass}"))).unwrap().is_empty());
    }

    #[test]
    fn test_build_all_concatenates_in_order() {
        let (registry, _) = registry_with_modules(&["dmd"]);
        let effects = registry
            .build_all(&yaml("[{type: invert_colors}, {type: dmd}, {type: anti_aliasing}]"))
            .unwrap();
        let names: Vec<&str> = effects.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["invert_colors", "monochrome", "reduce", "dot_filter", "gain", "anti_aliasing"]
        );
        assert!(registry.build_all(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_validate_effects_single_spec_becomes_list() {
        let (registry, validator) = registry_with_modules(&[]);
        let validated = registry
            .validate_effects(&yaml("{type: pixelate}"), &validator)
            .unwrap();

        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].get("pixel_size").and_then(Value::as_i64), Some(10));
    }

    #[test]
    fn test_validate_effects_rejects_unknown_setting() {
        let (registry, validator) = registry_with_modules(&["dmd"]);
        let result = registry.validate_effects(
            &yaml("[{type: dmd, width: 128}, {type: pixelate, sparkle: 1}]"),
            &validator,
        );
        assert!(matches!(result, Err(Error::ConfigValidation(ref schema, _)) if schema == "effects:pixelate"));
    }

    #[test]
    fn test_validate_effects_unknown_and_malformed() {
        let (registry, validator) = registry_with_modules(&[]);

        let unknown = registry.validate_effects(&yaml("{type: dmd}"), &validator);
        assert!(matches!(unknown, Err(Error::UnknownEffect(ref name)) if name == "dmd"));

        let malformed = registry.validate_effects(&yaml("[{pixel_size: 3}]"), &validator);
        assert!(matches!(malformed, Err(Error::MalformedEffect(_))));

        assert!(registry.validate_effects(&Value::Null, &validator).unwrap().is_empty());
    }

    #[test]
    fn test_validated_spec_builds_same_as_raw() {
        let (registry, validator) = registry_with_modules(&["dmd"]);
        let validated = registry
            .validate_effects(&yaml("{type: dmd, height: 64}"), &validator)
            .unwrap();
        let effects = registry
            .build(Some(&Value::Mapping(validated[0].clone())))
            .unwrap();
        assert_eq!(effects[1].param("height"), Some(EffectParam::Int(64)));

        let dmd_defaults = Dmd::default();
        assert_eq!(
            effects[3].param("gain"),
            Some(EffectParam::Float(dmd_defaults.gain))
        );
    }
}
