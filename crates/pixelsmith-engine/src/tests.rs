use std::fs;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{ImageFormat, Rgb, RgbImage};
use pixelsmith_contracts::errors::ErrorKind;
use pixelsmith_contracts::history::HISTORY_CAPACITY;
use pixelsmith_contracts::models::GenerationMode;
use pixelsmith_contracts::prompt::{
    AspectRatio, CameraStyle, DetailLevel, LightingStyle, RealismLevel, StylePreset,
};
use serde_json::Value;

use super::{
    api_error_message, decode_json_image, normalize_png, DryrunProvider, GenerationPhase,
    GenerationRequest, ImageBytes, ImageProvider, ImageProviderRegistry, ImageToImageRequest,
    ProviderError, Studio, StudioConfig, TextToImageRequest,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Text(TextToImageRequest),
    Image(ImageToImageRequest),
}

/// Stands in for the hosted API: records calls and replays one outcome.
#[derive(Clone)]
struct ScriptedProvider {
    calls: Arc<Mutex<Vec<Call>>>,
    outcome: Result<ImageBytes, ProviderError>,
}

impl ScriptedProvider {
    fn succeeding() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            outcome: Ok(ImageBytes {
                bytes: png_bytes(8, 4),
                mime_type: Some("image/png".to_string()),
            }),
        }
    }

    fn failing(status: Option<u16>, message: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            outcome: Err(ProviderError::new(status, message)),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) -> Result<ImageBytes, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.outcome.clone()
    }
}

impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn text_to_image(&self, request: &TextToImageRequest) -> Result<ImageBytes, ProviderError> {
        self.record(Call::Text(request.clone()))
    }

    fn image_to_image(
        &self,
        request: &ImageToImageRequest,
    ) -> Result<ImageBytes, ProviderError> {
        self.record(Call::Image(request.clone()))
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

fn hosted_config() -> StudioConfig {
    StudioConfig {
        token: Some("hf_test".to_string()),
        ..StudioConfig::default()
    }
}

fn studio_with(provider: &ScriptedProvider) -> anyhow::Result<Studio> {
    let mut providers = ImageProviderRegistry::new();
    providers.register(provider.clone());
    Studio::with_providers(hosted_config(), providers)
}

fn dryrun_studio(config: StudioConfig) -> anyhow::Result<Studio> {
    let mut providers = ImageProviderRegistry::new();
    providers.register(DryrunProvider);
    Studio::with_providers(
        StudioConfig {
            dry_run: true,
            ..config
        },
        providers,
    )
}

#[test]
fn text_to_image_calls_provider_once_with_enhanced_prompt() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;

    let mut request = GenerationRequest::text_to_image("X");
    request.aspect_ratio = AspectRatio::Landscape;
    request.style.style_preset = StylePreset::Gothic;
    request.style.realism = RealismLevel::HyperRealistic;
    request.style.lighting = LightingStyle::GoldenHour;
    request.style.detail = DetailLevel::UltraDetailed8k;
    request.style.camera = CameraStyle::MacroShot;

    let result = studio.submit(&request)?.clone();
    let expected_prompt = "X, gothic art, dark atmosphere, dramatic shadows, mysterious, \
                           hyper-realistic, ultra realistic, lifelike, 8K, golden hour, \
                           8k ultra detailed, macro shot, masterpiece, best quality";

    assert_eq!(
        provider.calls(),
        vec![Call::Text(TextToImageRequest {
            prompt: expected_prompt.to_string(),
            model: "black-forest-labs/FLUX.1-schnell".to_string(),
            width: 1344,
            height: 768,
        })]
    );
    assert_eq!(result.original_prompt, "X");
    assert_eq!(result.enhanced_prompt, expected_prompt);
    assert_eq!(result.style_tag, "Gothic");
    assert_eq!((result.width, result.height), (8, 4));
    assert!(result.image_png.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(studio.history().len(), 1);
    assert_eq!(
        studio.last_trail(),
        &[
            GenerationPhase::Validating,
            GenerationPhase::Composing,
            GenerationPhase::Calling,
            GenerationPhase::Succeeded,
            GenerationPhase::Idle,
        ]
    );
    assert_eq!(studio.phase(), GenerationPhase::Idle);
    Ok(())
}

#[test]
fn image_to_image_uses_refiner_and_strength() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;
    let reference = png_bytes(2, 2);
    let mut request = GenerationRequest::image_to_image("make it autumn", reference.clone());
    request.strength = 0.4;

    let result = studio.submit(&request)?;
    assert_eq!(result.mode, GenerationMode::ImageToImage);
    assert_eq!(
        provider.calls(),
        vec![Call::Image(ImageToImageRequest {
            image: reference,
            prompt: "make it autumn, masterpiece, best quality".to_string(),
            model: "stabilityai/stable-diffusion-xl-refiner-1.0".to_string(),
            strength: 0.4,
        })]
    );
    Ok(())
}

#[test]
fn image_mode_without_reference_fails_validation_without_calling() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;
    let mut request = GenerationRequest::text_to_image("a castle");
    request.mode = GenerationMode::ImageToImage;

    let err = studio.submit(&request).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Validation));
    assert!(provider.calls().is_empty());
    assert!(studio.history().is_empty());
    assert_eq!(
        studio.last_trail(),
        &[
            GenerationPhase::Validating,
            GenerationPhase::Failed,
            GenerationPhase::Idle,
        ]
    );
    Ok(())
}

#[test]
fn text_mode_with_reference_fails_validation_without_calling() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;
    let mut request = GenerationRequest::text_to_image("a castle");
    request.reference_image = Some(png_bytes(2, 2));

    let err = studio.submit(&request).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Validation));
    assert!(provider.calls().is_empty());
    assert!(studio.history().is_empty());
    assert_eq!(studio.last_enhanced_prompt(), None);
    assert_eq!(
        studio.last_trail(),
        &[
            GenerationPhase::Validating,
            GenerationPhase::Failed,
            GenerationPhase::Idle,
        ]
    );
    Ok(())
}

#[test]
fn blank_prompt_and_bad_strength_fail_validation() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;

    let blank = GenerationRequest::text_to_image("  \n\t");
    let err = studio.submit(&blank).err();
    assert_eq!(err.as_ref().map(|err| err.kind()), Some(ErrorKind::Validation));
    assert_eq!(
        err.map(|err| err.message().to_string()).as_deref(),
        Some("Please enter a prompt to generate an image.")
    );

    let mut strong = GenerationRequest::image_to_image("x", png_bytes(1, 1));
    strong.strength = 1.5;
    let err = studio.submit(&strong).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Validation));

    strong.strength = f64::NAN;
    let err = studio.submit(&strong).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Validation));

    assert!(provider.calls().is_empty());
    Ok(())
}

#[test]
fn provider_failures_are_classified_and_leave_history_alone() -> anyhow::Result<()> {
    let cases = [
        (Some(401), "Hugging Face request failed (401): Invalid credentials", ErrorKind::Authentication),
        (Some(429), "Hugging Face request failed (429): slow down", ErrorKind::RateLimit),
        (None, "Model black-forest-labs/FLUX.1-schnell is currently loading", ErrorKind::ModelLoading),
        (Some(500), "Internal Server Error", ErrorKind::Unknown),
    ];
    for (status, message, expected) in cases {
        let provider = ScriptedProvider::failing(status, message);
        let mut studio = studio_with(&provider)?;
        let err = studio
            .submit(&GenerationRequest::text_to_image("a lighthouse"))
            .err();
        assert_eq!(err.as_ref().map(|err| err.kind()), Some(expected), "{message}");
        assert_eq!(err.as_ref().map(|err| err.message()), Some(message));
        assert_eq!(provider.calls().len(), 1);
        assert!(studio.history().is_empty());
        assert_eq!(studio.phase(), GenerationPhase::Idle);
    }
    Ok(())
}

#[test]
fn undecodable_image_bytes_are_unknown_errors() -> anyhow::Result<()> {
    let provider = ScriptedProvider {
        calls: Arc::new(Mutex::new(Vec::new())),
        outcome: Ok(ImageBytes {
            bytes: b"not an image".to_vec(),
            mime_type: Some("image/png".to_string()),
        }),
    };
    let mut studio = studio_with(&provider)?;
    let err = studio
        .submit(&GenerationRequest::text_to_image("glitch"))
        .err()
        .map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Unknown));
    assert!(studio.history().is_empty());
    Ok(())
}

#[test]
fn eleven_generations_keep_ten_newest_first() -> anyhow::Result<()> {
    let mut studio = dryrun_studio(StudioConfig::default())?;
    for idx in 0..11 {
        let mut request = GenerationRequest::text_to_image(format!("prompt {idx}"));
        request.aspect_ratio = AspectRatio::Square;
        studio.submit(&request)?;
    }
    let prompts: Vec<&str> = studio
        .history()
        .list()
        .iter()
        .map(|entry| entry.original_prompt.as_str())
        .collect();
    assert_eq!(prompts.len(), HISTORY_CAPACITY);
    assert_eq!(prompts.first().copied(), Some("prompt 10"));
    assert_eq!(prompts.last().copied(), Some("prompt 1"));

    studio.clear_history();
    assert!(studio.history().is_empty());
    Ok(())
}

#[test]
fn dryrun_image_to_image_keeps_reference_dimensions() -> anyhow::Result<()> {
    let mut studio = dryrun_studio(StudioConfig::default())?;
    let request = GenerationRequest::image_to_image("sepia", png_bytes(5, 3));
    let result = studio.submit(&request)?;
    assert_eq!((result.width, result.height), (5, 3));
    assert_eq!(result.model, "dryrun-image-1");
    Ok(())
}

#[test]
fn dryrun_rejects_unreadable_reference() -> anyhow::Result<()> {
    let mut studio = dryrun_studio(StudioConfig::default())?;
    let request = GenerationRequest::image_to_image("sepia", b"garbage".to_vec());
    let err = studio.submit(&request).err().map(|err| err.kind());
    assert_eq!(err, Some(ErrorKind::Unknown));
    Ok(())
}

#[test]
fn requested_model_falls_back_with_reason() -> anyhow::Result<()> {
    let provider = ScriptedProvider::succeeding();
    let mut studio = studio_with(&provider)?;
    let mut request = GenerationRequest::image_to_image("x", png_bytes(1, 1));
    request.model = Some("flux-schnell".to_string());
    studio.submit(&request)?;
    assert_eq!(
        studio.last_fallback_reason(),
        Some("Requested model 'flux-schnell' unavailable for image_to_image.")
    );
    assert!(matches!(
        provider.calls().first(),
        Some(Call::Image(call)) if call.model == "stabilityai/stable-diffusion-xl-refiner-1.0"
    ));
    Ok(())
}

#[test]
fn missing_token_is_fatal_unless_dry_run() {
    assert!(Studio::new(StudioConfig::default()).is_err());
    let dry = StudioConfig {
        dry_run: true,
        ..StudioConfig::default()
    };
    assert!(!dry.missing_token());
    assert!(Studio::new(dry).is_ok());
}

#[test]
fn session_events_record_lifecycle_in_order() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let events_path = temp.path().join("session.jsonl");
    let mut studio = dryrun_studio(StudioConfig {
        events_path: Some(events_path.clone()),
        ..StudioConfig::default()
    })?;

    studio.submit(&GenerationRequest::text_to_image("boat"))?;
    let _ = studio.submit(&GenerationRequest::text_to_image(" "));
    studio.clear_history();
    studio.finish()?;

    let events: Vec<String> = fs::read_to_string(&events_path)?
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|row| row.get("event").and_then(Value::as_str).map(str::to_string))
        .collect();
    assert_eq!(
        events,
        vec![
            "session_started",
            "generation_started",
            "generation_succeeded",
            "generation_failed",
            "history_cleared",
            "session_finished",
        ]
    );
    Ok(())
}

#[test]
fn saves_use_download_file_names() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let mut studio = dryrun_studio(StudioConfig::default())?;
    assert!(studio.save_latest(temp.path()).is_err());

    studio.submit(&GenerationRequest::text_to_image("first"))?;
    studio.submit(&GenerationRequest::text_to_image("second"))?;

    let latest = studio.save_latest(temp.path())?;
    let name = latest
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or_default()
        .to_string();
    assert!(name.starts_with("ai_generated_"));
    assert!(name.ends_with(".png"));

    let older = studio.save_history_item(&temp.path().join("gallery"), 1)?;
    assert!(older.ends_with("gallery/ai_image_1.png"));
    let (_, width, height) = normalize_png(&fs::read(&older)?)?;
    assert_eq!((width, height), (1024, 1024));

    assert!(studio.save_history_item(temp.path(), 2).is_err());
    Ok(())
}

#[test]
fn saving_latest_twice_keeps_both_files() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let mut studio = dryrun_studio(StudioConfig::default())?;
    studio.submit(&GenerationRequest::text_to_image("same second"))?;

    let first = studio.save_latest(temp.path())?;
    let second = studio.save_latest(temp.path())?;
    let third = studio.save_latest(temp.path())?;
    assert_ne!(first, second);
    assert_ne!(second, third);
    assert!(second
        .to_string_lossy()
        .ends_with("_1.png"));
    assert!(third
        .to_string_lossy()
        .ends_with("_2.png"));
    assert_eq!(fs::read_dir(temp.path())?.count(), 3);
    Ok(())
}

#[test]
fn api_error_bodies_render_as_text() {
    assert_eq!(
        api_error_message(r#"{"error":"Model is currently loading","estimated_time":20.5}"#),
        "Model is currently loading (estimated_time 20.5s)"
    );
    assert_eq!(
        api_error_message(r#"{"error":["bad input","too long"]}"#),
        "bad input; too long"
    );
    assert_eq!(api_error_message("  "), "empty response body");
    assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
}

#[test]
fn json_success_bodies_decode_base64_images() {
    use base64::Engine as _;

    let encoded = super::BASE64.encode(png_bytes(3, 3));
    let body = format!(r#"{{"image":"{encoded}"}}"#);
    let image = decode_json_image(200, &body).map(|image| image.bytes.len());
    assert!(image.map(|len| len > 0).unwrap_or(false));

    let err = decode_json_image(200, r#"{"error":"Rate limit reached"}"#).err();
    assert_eq!(
        err.map(|err| err.message),
        Some("Rate limit reached".to_string())
    );
    assert!(decode_json_image(200, "<html>").is_err());
}
