//! Widget effects: registry, property tables and pipeline building.
//!
//! An effect spec names a registered type and may override some of its
//! properties:
//!
//! ```yaml
//! effects:
//!   - type: pixelate
//!     pixel_size: 4
//!   - type: dmd
//!     width: 128
//!     height: 32
//! ```
//!
//! Each registered type has an [`EffectBlueprint`]: a constructor plus a table
//! of typed property setters. Building a spec instantiates the type, applies
//! the overrides that match a setter (other keys are ignored) and expands the
//! result into shader passes. Leaf effects expand to themselves; chains such
//! as `dmd` expand to several passes.

/// Implements [`EffectSource`] for leaf effects, which expand to themselves.
macro_rules! leaf_effect {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::effects::EffectSource for $ty {
                fn expand(self: Box<Self>) -> Vec<Box<dyn $crate::effects::Effect>> {
                    vec![self as Box<dyn $crate::effects::Effect>]
                }
            }
        )*
    };
}

mod blueprint;
mod builtin;
mod modules;
mod pipeline;
mod registry;

use std::any::Any;
use std::fmt;

pub use blueprint::{
    to_bool, to_color, to_f32, to_int_list, to_u32, EffectBlueprint, EffectFactory,
    PropertySetter,
};
pub use builtin::{
    AntiAliasing, ColorChannelMix, HorizontalBlur, InvertColors, Pixelate, Scanlines,
    VerticalBlur, BUILTIN_EFFECTS,
};
pub use modules::{
    find_module, ColorDmd, Colorize, Dmd, DotFilter, EffectModule, FlipVertical, Gain, Glow,
    Monochrome, Reduce, MODULES,
};
pub use registry::EffectRegistry;

/// A uniform value handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectParam {
    Float(f32),
    Int(i32),
    Bool(bool),
    Color([f32; 4]),
    IntList(Vec<i32>),
}

/// A single shader pass.
pub trait Effect: fmt::Debug + Send + Sync + Any {
    /// Registered type name.
    fn name(&self) -> &'static str;

    /// Uniforms the pass needs, by name.
    fn params(&self) -> Vec<(&'static str, EffectParam)>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Effect {
    pub fn downcast_ref<T: Effect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Looks up one uniform by name.
    pub fn param(&self, name: &str) -> Option<EffectParam> {
        self.params()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }
}

/// Anything the registry can construct.
pub trait EffectSource: fmt::Debug + Send {
    /// Turns this instance into the ordered passes it stands for.
    fn expand(self: Box<Self>) -> Vec<Box<dyn Effect>>;
}
