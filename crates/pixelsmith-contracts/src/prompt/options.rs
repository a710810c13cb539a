use std::fmt;
use std::str::FromStr;

/// Declares a closed set of dropdown options with their display labels.
///
/// Labels are the canonical spelling shown to users. Parsing is lenient:
/// case, spaces, hyphens, underscores and the parenthesised hint of a label
/// ("16:9 (Landscape)") are ignored, so `golden-hour`, `Golden Hour` and
/// `16:9` all resolve.
macro_rules! labeled_options {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $($variant:ident => $label:literal),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|option| option.label()).collect()
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let wanted = normalize_label(raw);
                if wanted.is_empty() {
                    return None;
                }
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| label_aliases(option.label()).contains(&wanted))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw).ok_or_else(|| {
                    format!(
                        "unknown {} '{}'; expected one of: {}",
                        $kind,
                        raw.trim(),
                        Self::labels().join(", ")
                    )
                })
            }
        }
    };
}

labeled_options! {
    pub enum AspectRatio ("aspect ratio") {
        Square => "1:1 (Square)",
        Landscape => "16:9 (Landscape)",
        Portrait => "9:16 (Portrait)",
        Standard => "4:3 (Standard)",
        Photo => "3:2 (Photo)",
    }
    default = Square;
}

impl AspectRatio {
    /// Pixel dimensions requested from text-to-image models.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1024, 1024),
            AspectRatio::Landscape => (1344, 768),
            AspectRatio::Portrait => (768, 1344),
            AspectRatio::Standard => (1152, 896),
            AspectRatio::Photo => (1216, 832),
        }
    }
}

labeled_options! {
    /// Quick style presets. Each one injects a fixed phrase into the prompt.
    pub enum StylePreset ("style preset") {
        None => "None",
        Cinematic => "Cinematic",
        Anime => "Anime",
        DigitalArt => "Digital Art",
        OilPainting => "Oil Painting",
        Watercolor => "Watercolor",
        Sketch => "Sketch",
        Render3d => "3D Render",
        VintagePhoto => "Vintage Photo",
        NeonCyberpunk => "Neon Cyberpunk",
        FantasyArt => "Fantasy Art",
        Minimalist => "Minimalist",
        PopArt => "Pop Art",
        Gothic => "Gothic",
        Steampunk => "Steampunk",
    }
    default = None;
}

impl StylePreset {
    pub fn phrase(self) -> Option<&'static str> {
        let phrase = match self {
            StylePreset::None => return None,
            StylePreset::Cinematic => {
                "cinematic lighting, movie still, dramatic atmosphere, film grain"
            }
            StylePreset::Anime => "anime style, studio ghibli, vibrant colors, detailed illustration",
            StylePreset::DigitalArt => {
                "digital art, trending on artstation, highly detailed, sharp focus"
            }
            StylePreset::OilPainting => {
                "oil painting, classical art style, brush strokes visible, museum quality"
            }
            StylePreset::Watercolor => "watercolor painting, soft edges, artistic, flowing colors",
            StylePreset::Sketch => "pencil sketch, black and white, detailed drawing, artistic",
            StylePreset::Render3d => {
                "3D render, octane render, unreal engine 5, highly detailed, realistic"
            }
            StylePreset::VintagePhoto => {
                "vintage photograph, 1970s aesthetic, film grain, nostalgic"
            }
            StylePreset::NeonCyberpunk => {
                "cyberpunk, neon lights, futuristic city, blade runner style"
            }
            StylePreset::FantasyArt => {
                "fantasy art, magical, ethereal lighting, epic composition"
            }
            StylePreset::Minimalist => {
                "minimalist, clean lines, simple composition, modern design"
            }
            StylePreset::PopArt => "pop art style, bold colors, andy warhol inspired",
            StylePreset::Gothic => "gothic art, dark atmosphere, dramatic shadows, mysterious",
            StylePreset::Steampunk => {
                "steampunk style, brass and copper, victorian era, mechanical elements"
            }
        };
        Some(phrase)
    }
}

labeled_options! {
    pub enum RealismLevel ("realism level") {
        Artistic => "Artistic",
        Balanced => "Balanced",
        Photorealistic => "Photorealistic",
        HyperRealistic => "Hyper-realistic",
    }
    default = Balanced;
}

impl RealismLevel {
    pub fn phrase(self) -> Option<&'static str> {
        match self {
            RealismLevel::Artistic => Some("artistic interpretation, creative"),
            RealismLevel::Balanced => None,
            RealismLevel::Photorealistic => Some("photorealistic, ultra realistic"),
            RealismLevel::HyperRealistic => Some("hyper-realistic, ultra realistic, lifelike, 8K"),
        }
    }
}

labeled_options! {
    pub enum DetailLevel ("detail level") {
        Default => "Default",
        HighlyDetailed => "Highly detailed",
        IntricateDetails => "Intricate details",
        UltraDetailed8k => "8K ultra detailed",
    }
    default = Default;
}

impl DetailLevel {
    pub fn phrase(self) -> Option<String> {
        lowercased_unless_default(self == DetailLevel::Default, self.label())
    }
}

labeled_options! {
    pub enum LightingStyle ("lighting style") {
        Default => "Default",
        SoftNaturalLight => "Soft natural light",
        GoldenHour => "Golden hour",
        DramaticLighting => "Dramatic lighting",
        StudioLighting => "Studio lighting",
        Cinematic => "Cinematic",
        NeonGlow => "Neon glow",
        Moonlight => "Moonlight",
    }
    default = Default;
}

impl LightingStyle {
    pub fn phrase(self) -> Option<String> {
        lowercased_unless_default(self == LightingStyle::Default, self.label())
    }
}

labeled_options! {
    pub enum CameraStyle ("camera style") {
        Default => "Default",
        DslrPhoto => "DSLR photo",
        Film35mm => "35mm film",
        PortraitLens => "Portrait lens",
        WideAngle => "Wide angle",
        MacroShot => "Macro shot",
        AerialView => "Aerial view",
        BokehEffect => "Bokeh effect",
    }
    default = Default;
}

impl CameraStyle {
    pub fn phrase(self) -> Option<String> {
        lowercased_unless_default(self == CameraStyle::Default, self.label())
    }
}

fn lowercased_unless_default(is_default: bool, label: &str) -> Option<String> {
    if is_default {
        return None;
    }
    Some(label.to_lowercase())
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == ':')
        .flat_map(char::to_lowercase)
        .collect()
}

fn label_aliases(label: &str) -> Vec<String> {
    let mut aliases = vec![normalize_label(label)];
    if let Some((head, tail)) = label.split_once(" (") {
        aliases.push(normalize_label(head));
        aliases.push(normalize_label(tail.trim_end_matches(')')));
    }
    aliases
}
