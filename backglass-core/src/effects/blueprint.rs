//! Effect constructors with explicit property tables.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::config::parse_color;
use crate::effects::EffectSource;
use crate::error::{Error, Result};

/// Applies one config value to an effect instance.
pub type PropertySetter<T> = fn(&mut T, &Value) -> std::result::Result<(), String>;

/// Type-erased constructor stored in the registry.
pub trait EffectFactory: Send + Sync {
    /// Names of the properties a spec may override.
    fn property_names(&self) -> Vec<&'static str>;

    fn has_property(&self, name: &str) -> bool;

    /// Builds a default instance and applies every override that names a known
    /// property. Unknown keys are ignored.
    fn instantiate(&self, type_name: &str, overrides: &Mapping) -> Result<Box<dyn EffectSource>>;
}

/// Constructor plus the property table for one effect type.
pub struct EffectBlueprint<T> {
    ctor: fn() -> T,
    properties: BTreeMap<&'static str, PropertySetter<T>>,
}

impl<T: EffectSource + 'static> EffectBlueprint<T> {
    pub fn new(ctor: fn() -> T) -> Self {
        Self {
            ctor,
            properties: BTreeMap::new(),
        }
    }

    /// Adds a settable property.
    pub fn property(mut self, name: &'static str, setter: PropertySetter<T>) -> Self {
        self.properties.insert(name, setter);
        self
    }
}

impl<T> fmt::Debug for EffectBlueprint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBlueprint")
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: EffectSource + 'static> EffectFactory for EffectBlueprint<T> {
    fn property_names(&self) -> Vec<&'static str> {
        self.properties.keys().copied().collect()
    }

    fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn instantiate(&self, type_name: &str, overrides: &Mapping) -> Result<Box<dyn EffectSource>> {
        let mut effect = (self.ctor)();

        for (key, value) in overrides {
            let Some(key) = key.as_str() else {
                continue;
            };
            if key == "type" {
                continue;
            }
            match self.properties.get(key) {
                Some(setter) => setter(&mut effect, value).map_err(|msg| {
                    Error::ConfigValidation(format!("effects:{}:{}", type_name, key), msg)
                })?,
                None => tracing::trace!("Effect '{}' has no property '{}', ignoring", type_name, key),
            }
        }

        Ok(Box::new(effect))
    }
}

// ============================================================================
// Value conversions for property setters
// ============================================================================

pub fn to_f32(value: &Value) -> std::result::Result<f32, String> {
    value
        .as_f64()
        .map(|f| f as f32)
        .ok_or_else(|| format!("expected a number, got {:?}", value))
}

pub fn to_u32(value: &Value) -> std::result::Result<u32, String> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("expected a non-negative integer, got {:?}", value))
}

pub fn to_bool(value: &Value) -> std::result::Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("expected true or false, got {:?}", value))
}

pub fn to_color(value: &Value) -> std::result::Result<[f32; 4], String> {
    parse_color(value).ok_or_else(|| format!("expected a color, got {:?}", value))
}

pub fn to_int_list(value: &Value) -> std::result::Result<Vec<i32>, String> {
    let items = value
        .as_sequence()
        .ok_or_else(|| format!("expected a list of integers, got {:?}", value))?;
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| format!("expected an integer, got {:?}", v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;

    #[derive(Debug, Default)]
    struct Tint {
        strength: f32,
        enabled: bool,
    }

    impl Effect for Tint {
        fn name(&self) -> &'static str {
            "tint"
        }

        fn params(&self) -> Vec<(&'static str, crate::effects::EffectParam)> {
            vec![("strength", crate::effects::EffectParam::Float(self.strength))]
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    leaf_effect!(Tint);

    fn blueprint() -> EffectBlueprint<Tint> {
        EffectBlueprint::new(Tint::default)
            .property("strength", |e, v| {
                e.strength = to_f32(v)?;
                Ok(())
            })
            .property("enabled", |e, v| {
                e.enabled = to_bool(v)?;
                Ok(())
            })
    }

    #[test]
    fn test_property_table() {
        let bp = blueprint();
        assert_eq!(bp.property_names(), vec!["enabled", "strength"]);
        assert!(bp.has_property("strength"));
        assert!(!bp.has_property("type"));
    }

    #[test]
    fn test_instantiate_applies_known_and_ignores_unknown() {
        let overrides: Mapping =
            serde_yaml::from_str("{type: tint, strength: 0.5, sparkle: 11}").unwrap();
        let effects = blueprint().instantiate("tint", &overrides).unwrap().expand();

        assert_eq!(effects.len(), 1);
        let tint = effects[0].downcast_ref::<Tint>().unwrap();
        assert_eq!(tint.strength, 0.5);
        assert!(!tint.enabled);
    }

    #[test]
    fn test_setter_rejection_names_property() {
        let overrides: Mapping = serde_yaml::from_str("{strength: lots}").unwrap();
        let err = blueprint().instantiate("tint", &overrides).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(ref path, _) if path == "effects:tint:strength"));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_u32(&Value::from(4)), Ok(4));
        assert!(to_u32(&Value::from(-4)).is_err());
        assert_eq!(to_f32(&Value::from(2)), Ok(2.0));
        assert_eq!(
            to_int_list(&serde_yaml::from_str("[2, 0, 1]").unwrap()),
            Ok(vec![2, 0, 1])
        );
        assert_eq!(
            to_color(&Value::String("00ff00".to_string())),
            Ok([0.0, 1.0, 0.0, 1.0])
        );
    }
}
