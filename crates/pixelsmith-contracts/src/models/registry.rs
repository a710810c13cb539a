use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

/// Offline model served by the dry-run provider.
pub const DRYRUN_MODEL: &str = "dryrun-image-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    #[default]
    TextToImage,
    ImageToImage,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::TextToImage => "text_to_image",
            GenerationMode::ImageToImage => "image_to_image",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GenerationMode::TextToImage => "Text to Image",
            GenerationMode::ImageToImage => "Image to Image",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "text" | "txt2img" | "text_to_image" => Ok(GenerationMode::TextToImage),
            "image" | "img2img" | "image_to_image" => Ok(GenerationMode::ImageToImage),
            _ => Err(format!(
                "unknown mode '{}'; expected text_to_image or image_to_image",
                raw.trim()
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Short name used on the command line.
    pub name: String,
    /// Hosted repository id passed to the inference API.
    pub repo_id: String,
    pub label: String,
    pub provider: String,
    pub capabilities: Vec<GenerationMode>,
}

impl ModelSpec {
    pub fn supports(&self, mode: GenerationMode) -> bool {
        self.capabilities.contains(&mode)
    }

    fn answers_to(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        self.name.eq_ignore_ascii_case(wanted)
            || self.repo_id.eq_ignore_ascii_case(wanted)
            || self.label.eq_ignore_ascii_case(wanted)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    /// Looks a model up by short name, repo id or label.
    pub fn get(&self, wanted: &str) -> Option<&ModelSpec> {
        self.models
            .get(wanted)
            .or_else(|| self.models.values().find(|model| model.answers_to(wanted)))
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, mode: GenerationMode) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(mode))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, wanted: &str, mode: GenerationMode) -> Option<ModelSpec> {
        let model = self.get(wanted)?;
        if model.supports(mode) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert =
        |name: &str, repo_id: &str, label: &str, provider: &str, capabilities: &[GenerationMode]| {
            map.insert(
                name.to_string(),
                ModelSpec {
                    name: name.to_string(),
                    repo_id: repo_id.to_string(),
                    label: label.to_string(),
                    provider: provider.to_string(),
                    capabilities: capabilities.to_vec(),
                },
            );
        };

    insert(
        "flux-schnell",
        "black-forest-labs/FLUX.1-schnell",
        "FLUX.1 Schnell (Fast)",
        "huggingface",
        &[GenerationMode::TextToImage],
    );
    insert(
        "sdxl",
        "stabilityai/stable-diffusion-xl-base-1.0",
        "Stable Diffusion XL",
        "huggingface",
        &[GenerationMode::TextToImage],
    );
    insert(
        "sdxl-refiner",
        "stabilityai/stable-diffusion-xl-refiner-1.0",
        "Stable Diffusion XL Refiner",
        "huggingface",
        &[GenerationMode::ImageToImage],
    );
    insert(
        DRYRUN_MODEL,
        DRYRUN_MODEL,
        "Dry run (offline)",
        "dryrun",
        &[GenerationMode::TextToImage, GenerationMode::ImageToImage],
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_put_hosted_models_first() {
        let registry = ModelRegistry::new(None);
        let text = registry.by_capability(GenerationMode::TextToImage);
        assert_eq!(text[0].repo_id, "black-forest-labs/FLUX.1-schnell");
        let image = registry.by_capability(GenerationMode::ImageToImage);
        assert_eq!(image[0].repo_id, "stabilityai/stable-diffusion-xl-refiner-1.0");
    }

    #[test]
    fn get_accepts_name_repo_or_label() {
        let registry = ModelRegistry::new(None);
        let by_repo = registry.get("stabilityai/stable-diffusion-xl-base-1.0");
        let by_label = registry.get("stable diffusion xl");
        assert_eq!(by_repo.map(|model| model.name.as_str()), Some("sdxl"));
        assert_eq!(by_label.map(|model| model.name.as_str()), Some("sdxl"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn ensure_rejects_wrong_capability() {
        let registry = ModelRegistry::new(None);
        assert!(registry
            .ensure("flux-schnell", GenerationMode::ImageToImage)
            .is_none());
        assert!(registry
            .ensure(DRYRUN_MODEL, GenerationMode::ImageToImage)
            .is_some());
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("img2img".parse::<GenerationMode>(), Ok(GenerationMode::ImageToImage));
        assert_eq!("Text to Image".parse::<GenerationMode>(), Ok(GenerationMode::TextToImage));
        assert!("video".parse::<GenerationMode>().is_err());
    }
}
