//! Named config collections built from machine config sections.

mod animation;
mod base;
mod sound_loop_set;

pub use animation::{
    AnimationCollection, AnimationProcessor, AnimationStep, InlineAnimation, Timing,
};
pub use base::{as_entry_list, Collection, EntryProcessor};
pub use sound_loop_set::{
    clamp_volume, LayerState, LoopLayer, SoundLoopSet, SoundLoopSetCollection,
    SoundLoopSetProcessor, ValidationState,
};
