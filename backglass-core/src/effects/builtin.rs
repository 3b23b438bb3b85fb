//! Effects provided by the rendering toolkit, always registered.

use std::any::Any;

use crate::effects::{to_f32, to_int_list, to_u32, Effect, EffectBlueprint, EffectParam, EffectRegistry};

/// Names of the always-available effect types.
pub const BUILTIN_EFFECTS: &[&str] = &[
    "invert_colors",
    "scanlines",
    "color_channel_mix",
    "pixelate",
    "horizontal_blur",
    "vertical_blur",
    "anti_aliasing",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertColors;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scanlines;

/// Reorders the RGB channels: output channel `i` reads input channel `order[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorChannelMix {
    pub order: Vec<i32>,
}

impl Default for ColorChannelMix {
    fn default() -> Self {
        Self {
            order: vec![1, 2, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pixelate {
    pub pixel_size: u32,
}

impl Default for Pixelate {
    fn default() -> Self {
        Self { pixel_size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalBlur {
    pub size: f32,
}

impl Default for HorizontalBlur {
    fn default() -> Self {
        Self { size: 4.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerticalBlur {
    pub size: f32,
}

impl Default for VerticalBlur {
    fn default() -> Self {
        Self { size: 4.0 }
    }
}

/// FXAA pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AntiAliasing;

impl Effect for InvertColors {
    fn name(&self) -> &'static str {
        "invert_colors"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for Scanlines {
    fn name(&self) -> &'static str {
        "scanlines"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for ColorChannelMix {
    fn name(&self) -> &'static str {
        "color_channel_mix"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        vec![("order", EffectParam::IntList(self.order.clone()))]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for Pixelate {
    fn name(&self) -> &'static str {
        "pixelate"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        vec![("pixel_size", EffectParam::Int(self.pixel_size as i32))]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for HorizontalBlur {
    fn name(&self) -> &'static str {
        "horizontal_blur"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        vec![("size", EffectParam::Float(self.size))]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for VerticalBlur {
    fn name(&self) -> &'static str {
        "vertical_blur"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        vec![("size", EffectParam::Float(self.size))]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Effect for AntiAliasing {
    fn name(&self) -> &'static str {
        "anti_aliasing"
    }

    fn params(&self) -> Vec<(&'static str, EffectParam)> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

leaf_effect!(
    InvertColors,
    Scanlines,
    ColorChannelMix,
    Pixelate,
    HorizontalBlur,
    VerticalBlur,
    AntiAliasing,
);

/// Registers the toolkit effects.
pub(crate) fn register_builtin_effects(registry: &mut EffectRegistry) {
    registry.register("invert_colors", EffectBlueprint::new(InvertColors::default));
    registry.register("scanlines", EffectBlueprint::new(Scanlines::default));
    registry.register(
        "color_channel_mix",
        EffectBlueprint::new(ColorChannelMix::default).property("order", |e, v| {
            let order = to_int_list(v)?;
            if order.len() != 3 {
                return Err(format!("expected 3 channel indexes, got {}", order.len()));
            }
            e.order = order;
            Ok(())
        }),
    );
    registry.register(
        "pixelate",
        EffectBlueprint::new(Pixelate::default).property("pixel_size", |e, v| {
            e.pixel_size = to_u32(v)?;
            Ok(())
        }),
    );
    registry.register(
        "horizontal_blur",
        EffectBlueprint::new(HorizontalBlur::default).property("size", |e, v| {
            e.size = to_f32(v)?;
            Ok(())
        }),
    );
    registry.register(
        "vertical_blur",
        EffectBlueprint::new(VerticalBlur::default).property("size", |e, v| {
            e.size = to_f32(v)?;
            Ok(())
        }),
    );
    registry.register("anti_aliasing", EffectBlueprint::new(AntiAliasing::default));
}
