mod composer;
mod options;

pub use composer::{enhance_prompt, StyleSelection, QUALITY_BOOSTER};
pub use options::{
    AspectRatio, CameraStyle, DetailLevel, LightingStyle, RealismLevel, StylePreset,
};
