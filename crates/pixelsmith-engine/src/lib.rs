use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Local;
use image::{ImageFormat, Rgb, RgbImage};
use pixelsmith_contracts::errors::{ErrorKind, GenerationError};
use pixelsmith_contracts::events::{new_session_id, EventPayload, EventWriter};
use pixelsmith_contracts::history::{history_file_name, GenerationResult, HistoryStore};
use pixelsmith_contracts::models::{
    GenerationMode, ModelSelection, ModelSelector, DRYRUN_MODEL,
};
use pixelsmith_contracts::prompt::{AspectRatio, StyleSelection};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub const TOKEN_ENV: &str = "HUGGINGFACE_TOKEN";
pub const API_BASE_ENV: &str = "HF_INFERENCE_API_BASE";
pub const TEXT_MODEL_ENV: &str = "PIXELSMITH_TEXT_MODEL";
pub const IMAGE_MODEL_ENV: &str = "PIXELSMITH_IMAGE_MODEL";

pub const DEFAULT_API_BASE: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_STRENGTH: f64 = 0.7;
pub const MIN_STRENGTH: f64 = 0.1;
pub const MAX_STRENGTH: f64 = 1.0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const ERROR_BODY_MAX_CHARS: usize = 512;

pub const SETUP_INSTRUCTIONS: &str = "\
HuggingFace API token not found!

Setup Instructions:
  1. Go to https://huggingface.co/settings/tokens
  2. Create a new token with Write permissions
  3. Create a `.env` file in the project folder
  4. Add: HUGGINGFACE_TOKEN=your_token_here
  5. Restart the application

Pass --dry-run to try pixelsmith offline without a token.";

/// Startup configuration, usually read from the environment.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub events_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: None,
            image_model: None,
            events_path: None,
            dry_run: false,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        Self {
            token: non_empty_env(TOKEN_ENV),
            api_base: non_empty_env(API_BASE_ENV)
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            text_model: non_empty_env(TEXT_MODEL_ENV),
            image_model: non_empty_env(IMAGE_MODEL_ENV),
            events_path: None,
            dry_run: false,
        }
    }

    /// The hosted API needs a token; only dry runs can go without.
    pub fn missing_token(&self) -> bool {
        !self.dry_run && self.token.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.missing_token() {
            bail!("{TOKEN_ENV} not set");
        }
        Ok(())
    }

    fn default_model(&self, mode: GenerationMode) -> Option<&str> {
        if self.dry_run {
            return Some(DRYRUN_MODEL);
        }
        match mode {
            GenerationMode::TextToImage => self.text_model.as_deref(),
            GenerationMode::ImageToImage => self.image_model.as_deref(),
        }
    }
}

/// One form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub prompt: String,
    /// Collected from the user but not sent to the inference API.
    pub negative_prompt: String,
    pub reference_image: Option<Vec<u8>>,
    pub strength: f64,
    pub style: StyleSelection,
    pub aspect_ratio: AspectRatio,
    /// Overrides the configured model for this request.
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn text_to_image(prompt: impl Into<String>) -> Self {
        Self {
            mode: GenerationMode::TextToImage,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            reference_image: None,
            strength: DEFAULT_STRENGTH,
            style: StyleSelection::default(),
            aspect_ratio: AspectRatio::default(),
            model: None,
        }
    }

    pub fn image_to_image(prompt: impl Into<String>, reference_image: Vec<u8>) -> Self {
        Self {
            mode: GenerationMode::ImageToImage,
            reference_image: Some(reference_image),
            ..Self::text_to_image(prompt)
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::validation(
                "Please enter a prompt to generate an image.",
            ));
        }
        match (self.mode, self.reference_image.as_ref()) {
            (GenerationMode::ImageToImage, None) => {
                return Err(GenerationError::validation("Please upload an image first."));
            }
            (GenerationMode::TextToImage, Some(_)) => {
                return Err(GenerationError::validation(
                    "A reference image is only used in image-to-image mode.",
                ));
            }
            _ => {}
        }
        if !self.strength.is_finite()
            || self.strength < MIN_STRENGTH
            || self.strength > MAX_STRENGTH
        {
            return Err(GenerationError::validation(format!(
                "Transformation strength must be between {MIN_STRENGTH} and {MAX_STRENGTH} (got {}).",
                self.strength
            )));
        }
        Ok(())
    }

    pub fn enhanced_prompt(&self) -> String {
        self.style.enhance(&self.prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextToImageRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageToImageRequest {
    pub image: Vec<u8>,
    pub prompt: String,
    pub model: String,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Failure reported by an image provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        GenerationError::from_provider(err.status, err.message)
    }
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn text_to_image(&self, request: &TextToImageRequest) -> Result<ImageBytes, ProviderError>;
    fn image_to_image(&self, request: &ImageToImageRequest)
        -> Result<ImageBytes, ProviderError>;
}

#[derive(Default)]
pub struct ImageProviderRegistry {
    providers: BTreeMap<String, Box<dyn ImageProvider>>,
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ImageProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ImageProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

/// Offline provider rendering deterministic images from the prompt.
pub struct DryrunProvider;

impl ImageProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn text_to_image(&self, request: &TextToImageRequest) -> Result<ImageBytes, ProviderError> {
        let color = color_from_prompt(&request.prompt);
        let image = RgbImage::from_pixel(request.width.max(1), request.height.max(1), color);
        encode_png(&image)
    }

    fn image_to_image(
        &self,
        request: &ImageToImageRequest,
    ) -> Result<ImageBytes, ProviderError> {
        let reference = image::load_from_memory(&request.image).map_err(|err| {
            ProviderError::new(None, format!("reference image could not be decoded: {err}"))
        })?;
        let Rgb(tint) = color_from_prompt(&request.prompt);
        let weight = request.strength.clamp(0.0, 1.0);
        let mut image = reference.to_rgb8();
        for pixel in image.pixels_mut() {
            for (channel, target) in pixel.0.iter_mut().zip(tint) {
                let mixed = f64::from(*channel) * (1.0 - weight) + f64::from(target) * weight;
                *channel = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
        encode_png(&image)
    }
}

/// Client for the Hugging Face serverless inference API.
pub struct HuggingFaceProvider {
    api_base: String,
    token: String,
    http: HttpClient,
}

impl HuggingFaceProvider {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    fn endpoint(&self, repo_id: &str) -> String {
        format!("{}/{}", self.api_base, repo_id.trim_start_matches('/'))
    }

    fn post(&self, repo_id: &str, payload: &Value) -> Result<ImageBytes, ProviderError> {
        let endpoint = self.endpoint(repo_id);
        debug!(%endpoint, "posting inference request");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header(ACCEPT, "image/png")
            .json(payload)
            .send()
            .map_err(|err| {
                let err = anyhow::Error::new(err)
                    .context(format!("Hugging Face request failed ({endpoint})"));
                ProviderError::new(None, error_chain_text(&err, ERROR_BODY_MAX_CHARS))
            })?;
        read_image_response(response)
    }
}

impl ImageProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn text_to_image(&self, request: &TextToImageRequest) -> Result<ImageBytes, ProviderError> {
        let payload = json!({
            "inputs": request.prompt,
            "parameters": {
                "width": request.width,
                "height": request.height,
            },
        });
        self.post(&request.model, &payload)
    }

    fn image_to_image(
        &self,
        request: &ImageToImageRequest,
    ) -> Result<ImageBytes, ProviderError> {
        let payload = json!({
            "inputs": BASE64.encode(&request.image),
            "parameters": {
                "prompt": request.prompt,
                "strength": request.strength,
            },
        });
        self.post(&request.model, &payload)
    }
}

fn read_image_response(response: HttpResponse) -> Result<ImageBytes, ProviderError> {
    let status = response.status();
    let code = status.as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ProviderError::new(
            Some(code),
            format!(
                "Hugging Face request failed ({code}): {}",
                api_error_message(&body)
            ),
        ));
    }

    if content_type.starts_with("image/") {
        let bytes = response
            .bytes()
            .map_err(|err| {
                ProviderError::new(Some(code), format!("failed reading image bytes: {err}"))
            })?
            .to_vec();
        return Ok(ImageBytes {
            bytes,
            mime_type: Some(content_type),
        });
    }

    let body = response.text().map_err(|err| {
        ProviderError::new(Some(code), format!("failed reading response body: {err}"))
    })?;
    decode_json_image(code, &body)
}

/// Some deployments answer 200 with JSON: either an error or base64 image.
fn decode_json_image(code: u16, body: &str) -> Result<ImageBytes, ProviderError> {
    let payload: Value = serde_json::from_str(body).map_err(|_| {
        ProviderError::new(
            Some(code),
            format!(
                "unexpected non-image response: {}",
                truncate_text(body, ERROR_BODY_MAX_CHARS)
            ),
        )
    })?;
    if payload.get("error").is_some() {
        return Err(ProviderError::new(Some(code), api_error_message(body)));
    }
    let encoded = payload
        .get("image")
        .or_else(|| payload.get("generated_image"))
        .or_else(|| {
            payload
                .as_array()
                .and_then(|rows| rows.first())
                .and_then(|row| row.get("image"))
        })
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProviderError::new(Some(code), "JSON response missing image bytes"))?;
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|err| ProviderError::new(Some(code), format!("image base64 decode failed: {err}")))?;
    Ok(ImageBytes {
        bytes,
        mime_type: None,
    })
}

/// Renders an API error body (`{"error": ..., "estimated_time": ...}`) as text.
fn api_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let Some(error) = parsed.as_ref().and_then(|payload| payload.get("error")) else {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return "empty response body".to_string();
        }
        return truncate_text(trimmed, ERROR_BODY_MAX_CHARS);
    };
    let mut message = match error {
        Value::String(text) => text.clone(),
        Value::Array(rows) => rows
            .iter()
            .map(|row| row.as_str().map(str::to_string).unwrap_or_else(|| row.to_string()))
            .collect::<Vec<String>>()
            .join("; "),
        other => other.to_string(),
    };
    if let Some(eta) = parsed
        .as_ref()
        .and_then(|payload| payload.get("estimated_time"))
        .and_then(Value::as_f64)
    {
        message.push_str(&format!(" (estimated_time {eta:.1}s)"));
    }
    truncate_text(&message, ERROR_BODY_MAX_CHARS)
}

pub fn default_provider_registry(config: &StudioConfig) -> Result<ImageProviderRegistry> {
    let mut providers = ImageProviderRegistry::new();
    providers.register(DryrunProvider);
    if let Some(token) = config.token.as_deref() {
        providers.register(HuggingFaceProvider::new(&config.api_base, token)?);
    }
    Ok(providers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Validating,
    Composing,
    Calling,
    Succeeded,
    Failed,
}

/// One interactive session: owns the history and drives submissions.
pub struct Studio {
    config: StudioConfig,
    events: EventWriter,
    model_selector: ModelSelector,
    providers: ImageProviderRegistry,
    history: HistoryStore,
    phase: GenerationPhase,
    trail: Vec<GenerationPhase>,
    last_enhanced_prompt: Option<String>,
    last_fallback_reason: Option<String>,
}

impl Studio {
    pub fn new(config: StudioConfig) -> Result<Self> {
        config.validate()?;
        let providers = default_provider_registry(&config)?;
        Self::with_providers(config, providers)
    }

    pub fn with_providers(config: StudioConfig, providers: ImageProviderRegistry) -> Result<Self> {
        let session_id = new_session_id();
        let events = match config.events_path.as_ref() {
            Some(path) => EventWriter::new(path, session_id),
            None => EventWriter::disabled(session_id),
        };
        events.emit(
            "session_started",
            payload(json!({
                "dry_run": config.dry_run,
                "providers": providers.names(),
                "text_model": config.default_model(GenerationMode::TextToImage),
                "image_model": config.default_model(GenerationMode::ImageToImage),
            })),
        )?;
        info!(
            session_id = events.session_id(),
            dry_run = config.dry_run,
            "studio session started"
        );

        Ok(Self {
            config,
            events,
            model_selector: ModelSelector::new(None),
            providers,
            history: HistoryStore::new(),
            phase: GenerationPhase::Idle,
            trail: Vec::new(),
            last_enhanced_prompt: None,
            last_fallback_reason: None,
        })
    }

    pub fn session_id(&self) -> &str {
        self.events.session_id()
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    /// Phases visited by the most recent submission.
    pub fn last_trail(&self) -> &[GenerationPhase] {
        &self.trail
    }

    /// Prompt composed by the latest submission, if it got that far.
    pub fn last_enhanced_prompt(&self) -> Option<&str> {
        self.last_enhanced_prompt.as_deref()
    }

    pub fn last_fallback_reason(&self) -> Option<&str> {
        self.last_fallback_reason.as_deref()
    }

    fn select_model(&self, request: &GenerationRequest) -> Result<ModelSelection, GenerationError> {
        let requested = request
            .model
            .as_deref()
            .or_else(|| self.config.default_model(request.mode));
        self.model_selector
            .select(requested, request.mode)
            .map_err(|err| GenerationError::new(ErrorKind::Unknown, err))
    }

    pub fn submit(
        &mut self,
        request: &GenerationRequest,
    ) -> Result<&GenerationResult, GenerationError> {
        self.trail.clear();
        self.last_enhanced_prompt = None;
        self.last_fallback_reason = None;
        let started = Instant::now();

        match self.run_pipeline(request) {
            Ok(result) => {
                self.enter(GenerationPhase::Succeeded);
                info!(
                    model = %result.model,
                    width = result.width,
                    height = result.height,
                    "image generated"
                );
                self.emit(
                    "generation_succeeded",
                    json!({
                        "mode": result.mode.as_str(),
                        "model": result.model,
                        "width": result.width,
                        "height": result.height,
                        "bytes": result.image_png.len(),
                        "elapsed_ms": started.elapsed().as_millis() as u64,
                    }),
                );
                self.history.insert(result);
                self.enter(GenerationPhase::Idle);
                self.history.latest().ok_or_else(|| {
                    GenerationError::new(ErrorKind::Unknown, "history rejected the new result")
                })
            }
            Err(err) => {
                self.enter(GenerationPhase::Failed);
                warn!(kind = %err.kind(), message = err.message(), "generation failed");
                self.emit(
                    "generation_failed",
                    json!({
                        "mode": request.mode.as_str(),
                        "kind": err.kind().as_str(),
                        "message": err.message(),
                        "elapsed_ms": started.elapsed().as_millis() as u64,
                    }),
                );
                self.enter(GenerationPhase::Idle);
                Err(err)
            }
        }
    }

    fn run_pipeline(&mut self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        self.enter(GenerationPhase::Validating);
        request.validate()?;
        if !request.negative_prompt.trim().is_empty() {
            warn!("negative prompt is recorded but not sent to the inference API");
        }

        self.enter(GenerationPhase::Composing);
        let enhanced = request.enhanced_prompt();
        self.last_enhanced_prompt = Some(enhanced.clone());

        self.enter(GenerationPhase::Calling);
        let selection = self.select_model(request)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            warn!(reason, model = %selection.model.name, "model fallback");
        }
        self.last_fallback_reason = selection.fallback_reason.clone();
        let model = selection.model;

        let (width, height) = request.aspect_ratio.dimensions();
        self.emit(
            "generation_started",
            json!({
                "mode": request.mode.as_str(),
                "model": model.repo_id,
                "provider": model.provider,
                "style": request.style.style_tag(),
                "prompt_sha256": prompt_fingerprint(&enhanced),
                "width": width,
                "height": height,
                "strength": request.strength,
                "fallback_reason": self.last_fallback_reason,
            }),
        );

        let Some(provider) = self.providers.get(&model.provider) else {
            return Err(GenerationError::new(
                ErrorKind::Unknown,
                format!(
                    "no provider '{}' available for model {}",
                    model.provider, model.repo_id
                ),
            ));
        };
        info!(
            mode = %request.mode,
            model = %model.repo_id,
            provider = provider.name(),
            "calling inference API"
        );

        let image = match (request.mode, request.reference_image.as_ref()) {
            (GenerationMode::TextToImage, _) => provider.text_to_image(&TextToImageRequest {
                prompt: enhanced.clone(),
                model: model.repo_id.clone(),
                width,
                height,
            }),
            (GenerationMode::ImageToImage, Some(reference)) => {
                provider.image_to_image(&ImageToImageRequest {
                    image: reference.clone(),
                    prompt: enhanced.clone(),
                    model: model.repo_id.clone(),
                    strength: request.strength,
                })
            }
            (GenerationMode::ImageToImage, None) => {
                return Err(GenerationError::validation("Please upload an image first."));
            }
        }?;
        debug!(
            bytes = image.bytes.len() as u64,
            mime_type = image.mime_type.as_deref().unwrap_or("unknown"),
            "provider returned image"
        );

        let (image_png, width, height) = normalize_png(&image.bytes).map_err(|err| {
            GenerationError::new(ErrorKind::Unknown, error_chain_text(&err, ERROR_BODY_MAX_CHARS))
        })?;

        Ok(GenerationResult {
            image_png,
            width,
            height,
            original_prompt: request.prompt.clone(),
            enhanced_prompt: enhanced,
            style_tag: request.style.style_tag().to_string(),
            mode: request.mode,
            model: model.repo_id,
            created_at: Local::now(),
        })
    }

    pub fn clear_history(&mut self) {
        let dropped = self.history.len();
        self.history.clear();
        info!(dropped = dropped as u64, "history cleared");
        self.emit("history_cleared", json!({ "dropped": dropped }));
    }

    /// Writes the newest result as `ai_generated_<timestamp>.png`, adding a
    /// numeric suffix when that name is already taken in `out_dir`.
    pub fn save_latest(&self, out_dir: &Path) -> Result<PathBuf> {
        let Some(result) = self.history.latest() else {
            bail!("nothing generated yet");
        };
        let file_name = unused_file_name(out_dir, &result.download_file_name());
        write_png(out_dir, &file_name, &result.image_png)
    }

    /// Writes history entry `index` as `ai_image_<index>.png`.
    pub fn save_history_item(&self, out_dir: &Path, index: usize) -> Result<PathBuf> {
        let Some(result) = self.history.get(index) else {
            bail!(
                "no history entry at index {index} ({} stored)",
                self.history.len()
            );
        };
        write_png(out_dir, &history_file_name(index), &result.image_png)
    }

    pub fn finish(&self) -> Result<()> {
        self.events.emit(
            "session_finished",
            payload(json!({ "history_len": self.history.len() })),
        )?;
        info!(session_id = self.session_id(), "studio session finished");
        Ok(())
    }

    fn enter(&mut self, phase: GenerationPhase) {
        debug!(from = ?self.phase, to = ?phase, "generation phase");
        self.phase = phase;
        self.trail.push(phase);
    }

    fn emit(&self, event: &str, value: Value) {
        if let Err(err) = self.events.emit(event, payload(value)) {
            warn!(event, error = %err, "failed to append session event");
        }
    }
}

pub fn write_png(out_dir: &Path, file_name: &str, png: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join(file_name);
    fs::write(&path, png).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn unused_file_name(out_dir: &Path, file_name: &str) -> String {
    if !out_dir.join(file_name).exists() {
        return file_name.to_string();
    }
    let (stem, extension) = file_name.rsplit_once('.').unwrap_or((file_name, "png"));
    (1u32..)
        .map(|suffix| format!("{stem}_{suffix}.{extension}"))
        .find(|candidate| !out_dir.join(candidate).exists())
        .unwrap_or_else(|| file_name.to_string())
}

/// Decodes whatever the API returned and re-encodes it as PNG.
pub fn normalize_png(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let image = image::load_from_memory(bytes).context("inference API returned undecodable image bytes")?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok((out.into_inner(), image.width(), image.height()))
}

fn encode_png(image: &RgbImage) -> Result<ImageBytes, ProviderError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|err| ProviderError::new(None, format!("PNG encoding failed: {err}")))?;
    Ok(ImageBytes {
        bytes: out.into_inner(),
        mime_type: Some("image/png".to_string()),
    })
}

fn color_from_prompt(prompt: &str) -> Rgb<u8> {
    let digest = Sha256::digest(prompt.as_bytes());
    Rgb([digest[0], digest[1], digest[2]])
}

fn prompt_fingerprint(prompt: &str) -> String {
    hex::encode(&Sha256::digest(prompt.as_bytes())[..8])
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn payload(value: Value) -> EventPayload {
    value.as_object().cloned().unwrap_or_default()
}

pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts.last().map(|existing| existing == trimmed).unwrap_or(false) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests;
