//! Pluggable effect modules.
//!
//! Modules are enabled by name from the `effects: modules:` config list and
//! resolved against the static [`MODULES`] catalog at startup. Each module
//! exposes the type name it registers, a constructor with its property table,
//! and its validation schema.

use std::any::Any;

use crate::effects::{
    to_bool, to_color, to_f32, to_u32, Effect, EffectFactory, EffectBlueprint, EffectParam,
    EffectSource,
};

/// A pluggable effect module.
pub struct EffectModule {
    /// Name used in the `effects: modules:` list.
    pub module: &'static str,
    /// Effect type name the module registers.
    pub name: &'static str,
    pub factory: fn() -> Box<dyn EffectFactory>,
    /// YAML document with the module's `effects:<name>` schema.
    pub schema: &'static str,
}

/// Every module that can be enabled.
pub static MODULES: &[EffectModule] = &[
    EffectModule {
        module: "monochrome",
        name: "monochrome",
        factory: monochrome_factory,
        schema: "\"effects:monochrome\": {}\n",
    },
    EffectModule {
        module: "gain",
        name: "gain",
        factory: gain_factory,
        schema: "\"effects:gain\":\n  gain: { type: float, default: 1.0 }\n",
    },
    EffectModule {
        module: "reduce",
        name: "reduce",
        factory: reduce_factory,
        schema: "\"effects:reduce\":\n  width: { type: int, default: 128 }\n  height: { type: int, default: 32 }\n",
    },
    EffectModule {
        module: "colorize",
        name: "colorize",
        factory: colorize_factory,
        schema: "\"effects:colorize\":\n  tint_color: { type: color, default: ffa500 }\n",
    },
    EffectModule {
        module: "flip_vertical",
        name: "flip_vertical",
        factory: flip_vertical_factory,
        schema: "\"effects:flip_vertical\": {}\n",
    },
    EffectModule {
        module: "glow",
        name: "glow",
        factory: glow_factory,
        schema: "\"effects:glow\":\n  blur_size: { type: float, default: 4.0 }\n  intensity: { type: float, default: 0.25 }\n",
    },
    EffectModule {
        module: "dot_filter",
        name: "dot_filter",
        factory: dot_filter_factory,
        schema: "\"effects:dot_filter\":\n  dots_x: { type: int, default: 128 }\n  dots_y: { type: int, default: 32 }\n  dot_size: { type: float, default: 0.5 }\n  blur: { type: float, default: 0.1 }\n  background_color: { type: color, default: 1a1a1a }\n",
    },
    EffectModule {
        module: "dmd",
        name: "dmd",
        factory: dmd_factory,
        schema: DMD_SCHEMA,
    },
    EffectModule {
        module: "color_dmd",
        name: "color_dmd",
        factory: color_dmd_factory,
        schema: COLOR_DMD_SCHEMA,
    },
];

const DMD_SCHEMA: &str = r#"
"effects:dmd":
  width: { type: int, default: 128 }
  height: { type: int, default: 32 }
  dot_filter: { type: bool, default: true }
  dot_size: { type: float, default: 0.5 }
  blur: { type: float, default: 0.1 }
  background_color: { type: color, default: 1a1a1a }
  gain: { type: float, default: 1.0 }
"#;

const COLOR_DMD_SCHEMA: &str = r#"
"effects:color_dmd":
  width: { type: int, default: 128 }
  height: { type: int, default: 32 }
  dot_filter: { type: bool, default: true }
  dot_size: { type: float, default: 0.5 }
  blur: { type: float, default: 0.1 }
  background_color: { type: color, default: 1a1a1a }
  gain: { type: float, default: 1.0 }
  tint_color: { type: color }
"#;

/// Looks up a module in the catalog by its module name.
pub fn find_module(module: &str) -> Option<&'static EffectModule> {
    MODULES.iter().find(|m| m.module == module)
}

// ============================================================================
// Leaf effects
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Monochrome;

#[derive(Debug, Clone, PartialEq)]
pub struct Gain {
    pub gain: f32,
}

impl Default for Gain {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

/// Downsamples to a fixed pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduce {
    pub width: u32,
    pub height: u32,
}

impl Default for Reduce {
    fn default() -> Self {
        Self {
            width: 128,
            height: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorize {
    pub tint_color: [f32; 4],
}

impl Default for Colorize {
    fn default() -> Self {
        // DMD orange
        Self {
            tint_color: [1.0, 165.0 / 255.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlipVertical;

#[derive(Debug, Clone, PartialEq)]
pub struct Glow {
    pub blur_size: f32,
    pub intensity: f32,
}

impl Default for Glow {
    fn default() -> Self {
        Self {
            blur_size: 4.0,
            intensity: 0.25,
        }
    }
}

/// Renders each pixel as a round dot on a background.
#[derive(Debug, Clone, PartialEq)]
pub struct DotFilter {
    pub dots_x: u32,
    pub dots_y: u32,
    pub dot_size: f32,
    pub blur: f32,
    pub background_color: [f32; 4],
}

impl Default for DotFilter {
    fn default() -> Self {
        Self {
            dots_x: 128,
            dots_y: 32,
            dot_size: 0.5,
            blur: 0.1,
            background_color: DMD_BACKGROUND,
        }
    }
}

const DMD_BACKGROUND: [f32; 4] = [26.0 / 255.0, 26.0 / 255.0, 26.0 / 255.0, 1.0];

macro_rules! effect_impl {
    ($ty:ty, $name:literal, |$s:ident| $params:expr) => {
        impl Effect for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn params(&self) -> Vec<(&'static str, EffectParam)> {
                let $s = self;
                $params
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

effect_impl!(Monochrome, "monochrome", |_s| Vec::new());
effect_impl!(Gain, "gain", |s| vec![("gain", EffectParam::Float(s.gain))]);
effect_impl!(Reduce, "reduce", |s| vec![
    ("width", EffectParam::Int(s.width as i32)),
    ("height", EffectParam::Int(s.height as i32)),
]);
effect_impl!(Colorize, "colorize", |s| vec![(
    "tint_color",
    EffectParam::Color(s.tint_color)
)]);
effect_impl!(FlipVertical, "flip_vertical", |_s| Vec::new());
effect_impl!(Glow, "glow", |s| vec![
    ("blur_size", EffectParam::Float(s.blur_size)),
    ("intensity", EffectParam::Float(s.intensity)),
]);
effect_impl!(DotFilter, "dot_filter", |s| vec![
    ("dots_x", EffectParam::Int(s.dots_x as i32)),
    ("dots_y", EffectParam::Int(s.dots_y as i32)),
    ("dot_size", EffectParam::Float(s.dot_size)),
    ("blur", EffectParam::Float(s.blur)),
    ("background_color", EffectParam::Color(s.background_color)),
]);

leaf_effect!(Monochrome, Gain, Reduce, Colorize, FlipVertical, Glow, DotFilter);

// ============================================================================
// Chains
// ============================================================================

/// Monochrome dot-matrix display look: a chain of passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dmd {
    pub width: u32,
    pub height: u32,
    pub dot_filter: bool,
    pub dot_size: f32,
    pub blur: f32,
    pub background_color: [f32; 4],
    pub gain: f32,
}

impl Default for Dmd {
    fn default() -> Self {
        Self {
            width: 128,
            height: 32,
            dot_filter: true,
            dot_size: 0.5,
            blur: 0.1,
            background_color: DMD_BACKGROUND,
            gain: 1.0,
        }
    }
}

impl Dmd {
    /// Grid, dots and gain passes shared with the color variant.
    fn display_passes(&self) -> Vec<Box<dyn Effect>> {
        let mut passes: Vec<Box<dyn Effect>> = vec![Box::new(Reduce {
            width: self.width,
            height: self.height,
        })];
        if self.dot_filter {
            passes.push(Box::new(DotFilter {
                dots_x: self.width,
                dots_y: self.height,
                dot_size: self.dot_size,
                blur: self.blur,
                background_color: self.background_color,
            }));
        }
        passes.push(Box::new(Gain { gain: self.gain }));
        passes
    }
}

impl EffectSource for Dmd {
    fn expand(self: Box<Self>) -> Vec<Box<dyn Effect>> {
        let mut passes: Vec<Box<dyn Effect>> = vec![Box::new(Monochrome)];
        passes.extend(self.display_passes());
        passes
    }
}

/// Full-color dot-matrix display look, optionally tinted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorDmd {
    pub display: Dmd,
    pub tint_color: Option<[f32; 4]>,
}

impl EffectSource for ColorDmd {
    fn expand(self: Box<Self>) -> Vec<Box<dyn Effect>> {
        let mut passes = self.display.display_passes();
        if let Some(tint_color) = self.tint_color {
            passes.insert(0, Box::new(Colorize { tint_color }));
        }
        passes
    }
}

// ============================================================================
// Factories
// ============================================================================

fn monochrome_factory() -> Box<dyn EffectFactory> {
    Box::new(EffectBlueprint::new(Monochrome::default))
}

fn gain_factory() -> Box<dyn EffectFactory> {
    Box::new(EffectBlueprint::new(Gain::default).property("gain", |e, v| {
        e.gain = to_f32(v)?;
        Ok(())
    }))
}

fn reduce_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(Reduce::default)
            .property("width", |e, v| {
                e.width = to_u32(v)?;
                Ok(())
            })
            .property("height", |e, v| {
                e.height = to_u32(v)?;
                Ok(())
            }),
    )
}

fn colorize_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(Colorize::default).property("tint_color", |e, v| {
            e.tint_color = to_color(v)?;
            Ok(())
        }),
    )
}

fn flip_vertical_factory() -> Box<dyn EffectFactory> {
    Box::new(EffectBlueprint::new(FlipVertical::default))
}

fn glow_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(Glow::default)
            .property("blur_size", |e, v| {
                e.blur_size = to_f32(v)?;
                Ok(())
            })
            .property("intensity", |e, v| {
                e.intensity = to_f32(v)?;
                Ok(())
            }),
    )
}

fn dot_filter_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(DotFilter::default)
            .property("dots_x", |e, v| {
                e.dots_x = to_u32(v)?;
                Ok(())
            })
            .property("dots_y", |e, v| {
                e.dots_y = to_u32(v)?;
                Ok(())
            })
            .property("dot_size", |e, v| {
                e.dot_size = to_f32(v)?;
                Ok(())
            })
            .property("blur", |e, v| {
                e.blur = to_f32(v)?;
                Ok(())
            })
            .property("background_color", |e, v| {
                e.background_color = to_color(v)?;
                Ok(())
            }),
    )
}

fn dmd_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(Dmd::default)
            .property("width", |e, v| {
                e.width = to_u32(v)?;
                Ok(())
            })
            .property("height", |e, v| {
                e.height = to_u32(v)?;
                Ok(())
            })
            .property("dot_filter", |e, v| {
                e.dot_filter = to_bool(v)?;
                Ok(())
            })
            .property("dot_size", |e, v| {
                e.dot_size = to_f32(v)?;
                Ok(())
            })
            .property("blur", |e, v| {
                e.blur = to_f32(v)?;
                Ok(())
            })
            .property("background_color", |e, v| {
                e.background_color = to_color(v)?;
                Ok(())
            })
            .property("gain", |e, v| {
                e.gain = to_f32(v)?;
                Ok(())
            }),
    )
}

fn color_dmd_factory() -> Box<dyn EffectFactory> {
    Box::new(
        EffectBlueprint::new(ColorDmd::default)
            .property("width", |e, v| {
                e.display.width = to_u32(v)?;
                Ok(())
            })
            .property("height", |e, v| {
                e.display.height = to_u32(v)?;
                Ok(())
            })
            .property("dot_filter", |e, v| {
                e.display.dot_filter = to_bool(v)?;
                Ok(())
            })
            .property("dot_size", |e, v| {
                e.display.dot_size = to_f32(v)?;
                Ok(())
            })
            .property("blur", |e, v| {
                e.display.blur = to_f32(v)?;
                Ok(())
            })
            .property("background_color", |e, v| {
                e.display.background_color = to_color(v)?;
                Ok(())
            })
            .property("gain", |e, v| {
                e.display.gain = to_f32(v)?;
                Ok(())
            })
            .property("tint_color", |e, v| {
                e.tint_color = Some(to_color(v)?);
                Ok(())
            }),
    )
}
