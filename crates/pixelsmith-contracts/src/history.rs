use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::GenerationMode;

/// Maximum number of generations kept per session.
pub const HISTORY_CAPACITY: usize = 10;
/// Number of entries shown in the "recent generations" strip.
pub const GALLERY_PREVIEW: usize = 5;

const CAPTION_MAX_CHARS: usize = 100;

/// One successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// PNG-encoded image.
    pub image_png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub style_tag: String,
    pub mode: GenerationMode,
    pub model: String,
    pub created_at: DateTime<Local>,
}

impl GenerationResult {
    pub fn timestamp_label(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }

    /// File name offered when downloading a fresh result.
    pub fn download_file_name(&self) -> String {
        format!(
            "ai_generated_{}.png",
            self.created_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn caption(&self) -> String {
        if self.original_prompt.chars().count() <= CAPTION_MAX_CHARS {
            return self.original_prompt.clone();
        }
        self.original_prompt
            .chars()
            .take(CAPTION_MAX_CHARS)
            .collect::<String>()
            + "..."
    }

    pub fn summary(&self, index: usize) -> HistorySummary {
        HistorySummary {
            index,
            timestamp: self.timestamp_label(),
            prompt: self.original_prompt.clone(),
            style: self.style_tag.clone(),
            mode: self.mode,
            model: self.model.clone(),
            width: self.width,
            height: self.height,
            bytes: self.image_png.len(),
        }
    }
}

/// Display row for a history entry, without the image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub index: usize,
    pub timestamp: String,
    pub prompt: String,
    pub style: String,
    pub mode: GenerationMode,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// File name used when re-downloading the history entry at `index`.
pub fn history_file_name(index: usize) -> String {
    format!("ai_image_{index}.png")
}

/// Newest-first list of the session's generations.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<GenerationResult>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends `result`, dropping the oldest entries beyond capacity.
    pub fn insert(&mut self, result: GenerationResult) {
        self.entries.insert(0, result);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn list(&self) -> &[GenerationResult] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&GenerationResult> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&GenerationResult> {
        self.entries.first()
    }

    pub fn preview(&self) -> &[GenerationResult] {
        let end = self.entries.len().min(GALLERY_PREVIEW);
        &self.entries[..end]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
