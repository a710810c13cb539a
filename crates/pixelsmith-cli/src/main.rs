use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pixelsmith_contracts::chat::{parse_intent, STUDIO_HELP_COMMANDS};
use pixelsmith_contracts::history::GenerationResult;
use pixelsmith_contracts::models::{GenerationMode, ModelRegistry};
use pixelsmith_contracts::prompt::{
    AspectRatio, CameraStyle, DetailLevel, LightingStyle, RealismLevel, StylePreset,
    StyleSelection,
};
use pixelsmith_engine::{
    GenerationRequest, Studio, StudioConfig, DEFAULT_STRENGTH, MAX_STRENGTH, MIN_STRENGTH,
    SETUP_INSTRUCTIONS,
};
use serde_json::{json, Value};
use tracing::{debug, info};

const EXIT_GENERATION_FAILED: i32 = 1;
const EXIT_MISSING_TOKEN: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "pixelsmith",
    version,
    about = "Prompt-enhancing image generator backed by Hugging Face Inference"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit one generation and save the image.
    Generate(GenerateArgs),
    /// Interactive session with history.
    Studio(StudioArgs),
    /// Print the enhanced prompt without calling the API.
    Enhance(EnhanceArgs),
    /// List styling options and models.
    Options(OptionsArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct StyleArgs {
    #[arg(long)]
    style: Option<StylePreset>,
    #[arg(long)]
    realism: Option<RealismLevel>,
    #[arg(long)]
    lighting: Option<LightingStyle>,
    #[arg(long)]
    detail: Option<DetailLevel>,
    #[arg(long)]
    camera: Option<CameraStyle>,
}

impl StyleArgs {
    fn selection(&self) -> StyleSelection {
        StyleSelection {
            style_preset: self.style.unwrap_or_default(),
            realism: self.realism.unwrap_or_default(),
            lighting: self.lighting.unwrap_or_default(),
            detail: self.detail.unwrap_or_default(),
            camera: self.camera.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    /// Reference image; switches to image-to-image.
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_STRENGTH)]
    strength: f64,
    #[command(flatten)]
    style: StyleArgs,
    #[arg(long)]
    aspect: Option<AspectRatio>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    negative: Option<String>,
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct StudioArgs {
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[arg(long)]
    aspect: Option<AspectRatio>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Parser)]
struct EnhanceArgs {
    #[arg(long)]
    prompt: String,
    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Debug, Parser)]
struct OptionsArgs {
    #[arg(long)]
    json: bool,
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("pixelsmith error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "pixelsmith=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Studio(args) => run_studio(args),
        Command::Enhance(args) => {
            println!("{}", args.style.selection().enhance(&args.prompt));
            Ok(0)
        }
        Command::Options(args) => {
            print_options(args.json)?;
            Ok(0)
        }
    }
}

fn studio_config(dry_run: bool, events: Option<PathBuf>) -> StudioConfig {
    StudioConfig {
        dry_run,
        events_path: events,
        ..StudioConfig::from_env()
    }
}

/// `None` when the token is missing; setup instructions were printed.
fn open_studio(config: StudioConfig) -> Result<Option<Studio>> {
    if config.missing_token() {
        eprintln!("{SETUP_INSTRUCTIONS}");
        return Ok(None);
    }
    Studio::new(config).map(Some)
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let Some(mut studio) = open_studio(studio_config(args.dry_run, args.events.clone()))? else {
        return Ok(EXIT_MISSING_TOKEN);
    };

    let settings = FormSettings {
        style: args.style.selection(),
        aspect_ratio: args.aspect.unwrap_or_default(),
        model: args.model.clone(),
        negative_prompt: args.negative.clone().unwrap_or_default(),
        strength: args.strength,
        reference_image: args.image.clone(),
        out_dir: args.out.clone(),
    };
    let request = match settings.request(&args.prompt) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("Error: {err:#}");
            studio.finish()?;
            return Ok(EXIT_GENERATION_FAILED);
        }
    };

    let outcome = studio.submit(&request).map(|_| ());
    let code = match outcome {
        Ok(()) => match studio.save_latest(&settings.out_dir) {
            Ok(path) => match report_generated(&studio, &path, args.json) {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("pixelsmith error: {err:#}");
                    EXIT_GENERATION_FAILED
                }
            },
            Err(err) => {
                eprintln!("Save failed: {err:#}");
                EXIT_GENERATION_FAILED
            }
        },
        Err(err) => {
            eprintln!("{}", err.user_message());
            if args.json {
                let row = json!({ "error": err.kind().as_str(), "message": err.message() });
                println!("{row:#}");
            }
            EXIT_GENERATION_FAILED
        }
    };
    studio.finish()?;
    Ok(code)
}

fn report_generated(studio: &Studio, path: &Path, as_json: bool) -> Result<()> {
    let Some(result) = studio.history().latest() else {
        bail!("generation finished without a stored result");
    };
    if !as_json {
        print_result(result, path);
        return Ok(());
    }
    let mut row = serde_json::to_value(result.summary(0))?;
    if let Some(object) = row.as_object_mut() {
        object.insert("path".to_string(), json!(path.display().to_string()));
        object.insert("enhanced_prompt".to_string(), json!(result.enhanced_prompt));
    }
    println!("{}", serde_json::to_string_pretty(&row)?);
    Ok(())
}

fn run_studio(args: StudioArgs) -> Result<i32> {
    let Some(mut studio) = open_studio(studio_config(args.dry_run, args.events.clone()))? else {
        return Ok(EXIT_MISSING_TOKEN);
    };
    let mut settings = FormSettings {
        style: args.style.selection(),
        aspect_ratio: args.aspect.unwrap_or_default(),
        model: args.model.clone(),
        out_dir: args.out.clone(),
        ..FormSettings::default()
    };

    println!("Pixelsmith studio started. Type /help for commands.");
    if studio.config().dry_run {
        println!("Dry run: images are rendered locally, no API calls.");
    }

    let looped = studio_loop(&mut studio, &mut settings);
    studio.finish()?;
    info!(generated = studio.history().len() as u64, "studio closed");
    looped?;
    Ok(0)
}

/// Reads studio lines until `/quit` or end of input.
fn studio_loop(studio: &mut Studio, settings: &mut FormSettings) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    let mut last_prompt: Option<String> = None;

    loop {
        print!("{}> ", settings.mode().as_str());
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        debug!(action = %intent.action, "studio input");

        match intent.action.as_str() {
            "noop" => {}
            "help" => {
                println!("Commands: {}", STUDIO_HELP_COMMANDS.join(" "));
                println!("Any other text generates an image from the current settings.");
            }
            "update_settings" => {
                for (key, value) in &intent.settings_update {
                    let raw = value.as_str().unwrap_or_default();
                    let message = settings.apply(key, raw).unwrap_or_else(|err| err);
                    println!("{message}");
                }
            }
            "set_reference_image" => {
                match value_as_non_empty_string(intent.command_args.get("path")) {
                    Some(path) => {
                        let path = PathBuf::from(path);
                        if path.is_file() {
                            println!(
                                "Reference image set to {}; mode is image-to-image",
                                path.display()
                            );
                            settings.reference_image = Some(path);
                        } else {
                            println!("Reference image not found: {}", path.display());
                        }
                    }
                    None => println!("/image requires a path"),
                }
            }
            "text_mode" => {
                settings.reference_image = None;
                println!("Mode is text-to-image");
            }
            "set_output_dir" => {
                match value_as_non_empty_string(intent.command_args.get("path")) {
                    Some(path) => {
                        settings.out_dir = PathBuf::from(path);
                        println!("Output directory set to {}", settings.out_dir.display());
                    }
                    None => println!("/out requires a path"),
                }
            }
            "enhance" => {
                let prompt = intent.prompt.clone().or_else(|| last_prompt.clone());
                match prompt {
                    Some(prompt) => println!("{}", settings.style.enhance(&prompt)),
                    None => println!("/enhance requires a prompt"),
                }
            }
            "generate" => {
                let Some(prompt) = intent.prompt.clone() else {
                    continue;
                };
                last_prompt = Some(prompt.clone());
                generate_in_studio(studio, settings, &prompt);
            }
            "history" => {
                let all = intent
                    .command_args
                    .get("all")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                for row in history_lines(studio, all) {
                    println!("{row}");
                }
            }
            "save" => save_from_history(studio, &settings.out_dir, intent.command_args.get("index")),
            "clear_history" => {
                studio.clear_history();
                println!("History cleared");
            }
            "show_settings" => print_settings(settings),
            "show_options" => print_options(false)?,
            "quit" => break,
            "unknown" => {
                let command = value_as_non_empty_string(intent.command_args.get("command"))
                    .unwrap_or_default();
                println!("Unknown command /{command}. Type /help for commands.");
            }
            other => println!("Unhandled action: {other}"),
        }
    }
    Ok(())
}

/// Submits one studio prompt and saves the result; returns the saved path.
///
/// Neither a failed generation nor a failed save ends the session.
fn generate_in_studio(
    studio: &mut Studio,
    settings: &FormSettings,
    prompt: &str,
) -> Option<PathBuf> {
    let request = match settings.request(prompt) {
        Ok(request) => request,
        Err(err) => {
            println!("Error: {err:#}");
            return None;
        }
    };
    let outcome = studio.submit(&request).map(|_| ());
    if let Err(err) = outcome {
        println!("{}", err.user_message());
        if let Some(enhanced) = studio.last_enhanced_prompt() {
            println!("Enhanced prompt: {enhanced}");
        }
        if err.kind().is_transient() {
            println!("Resubmit the same prompt once the model is warm.");
        }
        return None;
    }

    if let Some(reason) = studio.last_fallback_reason() {
        println!("Note: {reason}");
    }
    match studio.save_latest(&settings.out_dir) {
        Ok(path) => {
            if let Some(result) = studio.history().latest() {
                print_result(result, &path);
            }
            Some(path)
        }
        Err(err) => {
            println!("Save failed: {err:#}");
            println!("The image is kept in history; use /out and /save to retry.");
            None
        }
    }
}

/// Current form state of a studio session.
#[derive(Debug, Clone, PartialEq)]
struct FormSettings {
    style: StyleSelection,
    aspect_ratio: AspectRatio,
    model: Option<String>,
    negative_prompt: String,
    strength: f64,
    reference_image: Option<PathBuf>,
    out_dir: PathBuf,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            style: StyleSelection::default(),
            aspect_ratio: AspectRatio::default(),
            model: None,
            negative_prompt: String::new(),
            strength: DEFAULT_STRENGTH,
            reference_image: None,
            out_dir: PathBuf::from("."),
        }
    }
}

impl FormSettings {
    fn mode(&self) -> GenerationMode {
        if self.reference_image.is_some() {
            GenerationMode::ImageToImage
        } else {
            GenerationMode::TextToImage
        }
    }

    fn request(&self, prompt: &str) -> Result<GenerationRequest> {
        let mut request = match self.reference_image.as_ref() {
            Some(path) => {
                let bytes = fs::read(path)
                    .with_context(|| format!("failed to read reference image {}", path.display()))?;
                GenerationRequest::image_to_image(prompt, bytes)
            }
            None => GenerationRequest::text_to_image(prompt),
        };
        request.style = self.style;
        request.aspect_ratio = self.aspect_ratio;
        request.model = self.model.clone();
        request.negative_prompt = self.negative_prompt.clone();
        request.strength = self.strength;
        Ok(request)
    }

    /// Applies one `/setting value` command, returning the confirmation line.
    fn apply(&mut self, key: &str, raw: &str) -> Result<String, String> {
        let raw = raw.trim();
        match key {
            "style_preset" => {
                self.style.style_preset = raw.parse()?;
                Ok(format!("Style set to {}", self.style.style_preset))
            }
            "realism" => {
                self.style.realism = raw.parse()?;
                Ok(format!("Realism set to {}", self.style.realism))
            }
            "lighting" => {
                self.style.lighting = raw.parse()?;
                Ok(format!("Lighting set to {}", self.style.lighting))
            }
            "detail" => {
                self.style.detail = raw.parse()?;
                Ok(format!("Detail set to {}", self.style.detail))
            }
            "camera" => {
                self.style.camera = raw.parse()?;
                Ok(format!("Camera set to {}", self.style.camera))
            }
            "aspect_ratio" => {
                self.aspect_ratio = raw.parse()?;
                let (width, height) = self.aspect_ratio.dimensions();
                Ok(format!(
                    "Aspect ratio set to {} ({width}x{height})",
                    self.aspect_ratio
                ))
            }
            "model" => {
                if raw.is_empty() {
                    self.model = None;
                    return Ok("Model reset to the configured default".to_string());
                }
                self.model = Some(raw.to_string());
                Ok(format!("Model set to {raw}"))
            }
            "negative_prompt" => {
                self.negative_prompt = raw.to_string();
                if raw.is_empty() {
                    Ok("Negative prompt cleared".to_string())
                } else {
                    Ok("Negative prompt recorded (not sent to the API)".to_string())
                }
            }
            "strength" => {
                let value: f64 = raw
                    .parse()
                    .map_err(|_| format!("strength must be a number, got '{raw}'"))?;
                if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&value) {
                    return Err(format!(
                        "strength must be between {MIN_STRENGTH} and {MAX_STRENGTH}"
                    ));
                }
                self.strength = value;
                Ok(format!("Transformation strength set to {value}"))
            }
            other => Err(format!("unknown setting '{other}'")),
        }
    }
}

fn print_result(result: &GenerationResult, path: &Path) {
    println!(
        "Generated {}x{} image with {} [{}]",
        result.width, result.height, result.model, result.mode
    );
    println!("Enhanced prompt: {}", result.enhanced_prompt);
    println!("Saved {}", path.display());
}

/// Recent strip by default, or every stored entry with `all`.
fn history_lines(studio: &Studio, all: bool) -> Vec<String> {
    let history = studio.history();
    if history.is_empty() {
        return vec!["No generations yet".to_string()];
    }
    let entries = if all { history.list() } else { history.preview() };
    let mut lines = vec![format!(
        "Showing {} of {} (keeps the last {})",
        entries.len(),
        history.len(),
        history.capacity()
    )];
    for (index, entry) in entries.iter().enumerate() {
        let summary = entry.summary(index);
        lines.push(format!(
            "[{}] {} {} | {} | {}",
            summary.index,
            summary.timestamp,
            summary.mode,
            summary.style,
            entry.caption()
        ));
    }
    lines
}

fn save_from_history(studio: &Studio, out_dir: &Path, index: Option<&Value>) {
    let saved = match index {
        None | Some(Value::Null) => studio.save_latest(out_dir),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(idx) => studio.save_history_item(out_dir, idx as usize),
            None => {
                println!("/save index must be a non-negative integer");
                return;
            }
        },
        Some(Value::String(text)) if matches!(text.as_str(), "last" | "latest") => {
            studio.save_latest(out_dir)
        }
        Some(other) => {
            println!("/save expects an index or 'latest', got {other}");
            return;
        }
    };
    match saved {
        Ok(path) => println!("Saved {}", path.display()),
        Err(err) => println!("Save failed: {err:#}"),
    }
}

fn print_settings(settings: &FormSettings) {
    let (width, height) = settings.aspect_ratio.dimensions();
    println!("mode: {}", settings.mode());
    println!("style: {}", settings.style.style_preset);
    println!("realism: {}", settings.style.realism);
    println!("lighting: {}", settings.style.lighting);
    println!("detail: {}", settings.style.detail);
    println!("camera: {}", settings.style.camera);
    println!("aspect: {} ({width}x{height})", settings.aspect_ratio);
    println!("model: {}", settings.model.as_deref().unwrap_or("(default)"));
    println!("strength: {}", settings.strength);
    if !settings.negative_prompt.is_empty() {
        println!("negative: {}", settings.negative_prompt);
    }
    if let Some(path) = settings.reference_image.as_ref() {
        println!("reference: {}", path.display());
    }
    println!("out: {}", settings.out_dir.display());
}

fn options_table() -> Value {
    let models: Vec<Value> = ModelRegistry::new(None)
        .list()
        .map(|model| {
            json!({
                "name": model.name,
                "repo_id": model.repo_id,
                "label": model.label,
                "modes": model.capabilities.iter().map(|mode| mode.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "style": StylePreset::labels(),
        "realism": RealismLevel::labels(),
        "lighting": LightingStyle::labels(),
        "detail": DetailLevel::labels(),
        "camera": CameraStyle::labels(),
        "aspect": AspectRatio::labels(),
        "models": models,
    })
}

fn print_options(as_json: bool) -> Result<()> {
    let table = options_table();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }
    for key in ["style", "realism", "lighting", "detail", "camera", "aspect"] {
        let labels: Vec<&str> = table[key]
            .as_array()
            .map(|rows| rows.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        println!("{key}: {}", labels.join(" | "));
    }
    if let Some(models) = table["models"].as_array() {
        for model in models {
            println!(
                "model {}: {} ({})",
                model["name"].as_str().unwrap_or_default(),
                model["label"].as_str().unwrap_or_default(),
                model["repo_id"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn value_as_non_empty_string(value: Option<&Value>) -> Option<String> {
    let raw = value
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
