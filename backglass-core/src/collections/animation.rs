//! `animations` collection.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::collections::base::{as_entry_list, Collection, EntryProcessor};
use crate::config::ConfigValidator;
use crate::error::{Error, Result};

/// One step of an animation entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnimationStep {
    /// Reference to another named animation.
    Named(String),
    Inline(InlineAnimation),
}

/// An animation step defined in place.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InlineAnimation {
    #[serde(rename = "property")]
    pub properties: Vec<String>,
    #[serde(rename = "value")]
    pub values: Vec<Value>,
    /// Seconds.
    pub duration: f64,
    pub timing: Timing,
    pub repeat: bool,
    pub easing: String,
}

/// When a step starts relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    AfterPrevious,
    WithPrevious,
}

/// Processor for the `animations` section. An entry is an ordered list of steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationProcessor;

pub type AnimationCollection = Collection<AnimationProcessor>;

impl AnimationProcessor {
    /// Processes an entry: a single step or a list of steps.
    pub fn process(&self, raw: &Value, validator: &ConfigValidator) -> Result<Vec<AnimationStep>> {
        as_entry_list(raw)
            .into_iter()
            .map(|step| self.process_animation(step, validator))
            .collect()
    }

    /// Processes one step.
    pub fn process_animation(&self, raw: &Value, validator: &ConfigValidator) -> Result<AnimationStep> {
        match raw {
            Value::String(name) => Ok(AnimationStep::Named(name.clone())),
            Value::Mapping(_) => {
                let step: InlineAnimation = validator.validate_into("widgets:animations", raw, None)?;
                if step.properties.len() > step.values.len() {
                    return Err(Error::Structural(
                        "widgets:animations".to_string(),
                        format!(
                            "Animation must have at least the same number of settings in its \"value\" list ({}) \
                             as the number of settings in its \"property\" list ({}).",
                            literal(&step.values),
                            literal_str(&step.properties)
                        ),
                    ));
                }
                Ok(AnimationStep::Inline(step))
            }
            other => Err(Error::ConfigValidation(
                "widgets:animations".to_string(),
                format!(
                    "An animation must be a named animation or a mapping of settings, got {:?}",
                    other
                ),
            )),
        }
    }
}

impl EntryProcessor for AnimationProcessor {
    type Entry = Vec<AnimationStep>;
    const SECTION: &'static str = "animations";
    const LABEL: &'static str = "Animations";

    fn process_config(&self, raw: &Value, validator: &ConfigValidator) -> Result<Self::Entry> {
        self.process(raw, validator)
    }
}

impl Default for AnimationCollection {
    fn default() -> Self {
        Collection::new(AnimationProcessor)
    }
}

fn literal(values: &[Value]) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("'{}'", s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => format!("{:?}", other),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

fn literal_str(values: &[String]) -> String {
    let parts: Vec<String> = values.iter().map(|s| format!("'{}'", s)).collect();
    format!("[{}]", parts.join(", "))
}
