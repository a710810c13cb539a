use super::options::{CameraStyle, DetailLevel, LightingStyle, RealismLevel, StylePreset};

/// Appended to every enhanced prompt.
pub const QUALITY_BOOSTER: &str = "masterpiece, best quality";

/// The dropdown selections that shape an enhanced prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleSelection {
    pub style_preset: StylePreset,
    pub realism: RealismLevel,
    pub lighting: LightingStyle,
    pub detail: DetailLevel,
    pub camera: CameraStyle,
}

impl StyleSelection {
    pub fn enhance(&self, base_prompt: &str) -> String {
        enhance_prompt(
            base_prompt,
            self.realism,
            self.lighting,
            self.detail,
            self.camera,
            self.style_preset,
        )
    }

    /// Tag stored with history entries.
    pub fn style_tag(&self) -> &'static str {
        self.style_preset.label()
    }
}

/// Builds the prompt sent to the inference API.
///
/// Phrase order is fixed: style preset, realism, lighting, detail, camera and
/// finally [`QUALITY_BOOSTER`]. The base prompt is used verbatim.
pub fn enhance_prompt(
    base_prompt: &str,
    realism: RealismLevel,
    lighting: LightingStyle,
    detail: DetailLevel,
    camera: CameraStyle,
    style: StylePreset,
) -> String {
    let mut enhancements: Vec<String> = Vec::new();

    if let Some(phrase) = style.phrase() {
        enhancements.push(phrase.to_string());
    }
    if let Some(phrase) = realism.phrase() {
        enhancements.push(phrase.to_string());
    }
    enhancements.extend(lighting.phrase());
    enhancements.extend(detail.phrase());
    enhancements.extend(camera.phrase());
    enhancements.push(QUALITY_BOOSTER.to_string());

    format!("{base_prompt}, {}", enhancements.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_add_quality_booster() {
        let prompt = enhance_prompt(
            "A cat",
            RealismLevel::Balanced,
            LightingStyle::Default,
            DetailLevel::Default,
            CameraStyle::Default,
            StylePreset::None,
        );
        assert_eq!(prompt, "A cat, masterpiece, best quality");
        assert_eq!(StyleSelection::default().enhance("A cat"), prompt);
    }

    #[test]
    fn every_selector_contributes_in_fixed_order() {
        let prompt = enhance_prompt(
            "X",
            RealismLevel::HyperRealistic,
            LightingStyle::GoldenHour,
            DetailLevel::UltraDetailed8k,
            CameraStyle::MacroShot,
            StylePreset::Gothic,
        );
        assert_eq!(
            prompt,
            "X, gothic art, dark atmosphere, dramatic shadows, mysterious, \
             hyper-realistic, ultra realistic, lifelike, 8K, golden hour, \
             8k ultra detailed, macro shot, masterpiece, best quality"
        );
    }

    #[test]
    fn realism_levels_map_to_phrases() {
        let selection = StyleSelection {
            realism: RealismLevel::Artistic,
            ..StyleSelection::default()
        };
        assert_eq!(
            selection.enhance("tree"),
            "tree, artistic interpretation, creative, masterpiece, best quality"
        );
        let selection = StyleSelection {
            realism: RealismLevel::Photorealistic,
            camera: CameraStyle::DslrPhoto,
            ..StyleSelection::default()
        };
        assert_eq!(
            selection.enhance("tree"),
            "tree, photorealistic, ultra realistic, dslr photo, masterpiece, best quality"
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let selection = StyleSelection {
            style_preset: StylePreset::Watercolor,
            realism: RealismLevel::Photorealistic,
            lighting: LightingStyle::Moonlight,
            detail: DetailLevel::HighlyDetailed,
            camera: CameraStyle::AerialView,
        };
        let first = selection.enhance("a harbor at dusk");
        let second = selection.enhance("a harbor at dusk");
        assert_eq!(first, second);
        assert_eq!(selection.style_tag(), "Watercolor");
    }

    #[test]
    fn base_prompt_is_kept_verbatim() {
        let prompt = StyleSelection::default().enhance("  spaced  ");
        assert_eq!(prompt, "  spaced  , masterpiece, best quality");
    }
}
