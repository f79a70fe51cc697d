//! Domain types for template configuration, model replies, and outlines.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// System prompt used when a template configuration omits one.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that creates PowerPoint presentations.";

/// User prompt template used when a template configuration omits one.
pub const DEFAULT_USER_PROMPT_TEMPLATE: &str = "Create a presentation about: {input_text}";

/// Deck title used for flat outlines with no titles at all.
pub const FALLBACK_DECK_TITLE: &str = "Presentation";

/// Prompting configuration for a named template.
///
/// Loaded once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// System instruction sent verbatim to the model.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// User instruction with a single `{input_text}` substitution point.
    #[serde(default = "default_user_prompt_template")]
    pub user_prompt_template: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_user_prompt_template() -> String {
    DEFAULT_USER_PROMPT_TEMPLATE.to_string()
}

impl TemplateConfig {
    /// Create a configuration from its four fields.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            user_prompt_template: user_prompt_template.into(),
        }
    }

    /// Parse a configuration from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid template configuration: {}", e)))
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::new(
            "default",
            "",
            DEFAULT_SYSTEM_PROMPT,
            DEFAULT_USER_PROMPT_TEMPLATE,
        )
    }
}

/// The raw textual answer of a generation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply(String);

impl GenerationReply {
    /// Wrap a model reply.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the reply text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the reply text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for GenerationReply {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for GenerationReply {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for GenerationReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Titles with positionally matched bullet lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatOutline {
    /// Slide titles in order.
    pub titles: Vec<String>,

    /// `bullets[i]` belongs to `titles[i]`; missing entries are empty.
    #[serde(default)]
    pub bullets: Vec<Vec<String>>,
}

impl FlatOutline {
    /// Bullets for the slide at `index`, empty when the list runs short.
    pub fn bullets_for(&self, index: usize) -> &[String] {
        self.bullets.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A presentation with a title, optional subtitle, and per-slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichOutline {
    /// Presentation title.
    pub title: String,

    /// Presentation subtitle.
    #[serde(default)]
    pub subtitle: Option<String>,

    /// Slides in order.
    pub slides: Vec<RichSlide>,
}

/// One slide of a rich outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichSlide {
    /// Slide title.
    pub title: String,

    /// Newline-delimited bullet text.
    #[serde(default)]
    pub content: String,

    /// Speaker notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated outline in either accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredOutline {
    /// `{ titles, bullets }`.
    Flat(FlatOutline),
    /// `{ title, subtitle, slides }`.
    Rich(RichOutline),
}

impl StructuredOutline {
    /// Number of content slides the outline describes.
    pub fn slide_count(&self) -> usize {
        match self {
            Self::Flat(flat) => flat.titles.len(),
            Self::Rich(rich) => rich.slides.len(),
        }
    }

    /// The title the outline itself suggests for the deck.
    pub fn deck_title(&self) -> &str {
        match self {
            Self::Flat(flat) => flat
                .titles
                .first()
                .map(String::as_str)
                .unwrap_or(FALLBACK_DECK_TITLE),
            Self::Rich(rich) => &rich.title,
        }
    }

    /// Subtitle for the title slide, if the outline has a non-blank one.
    pub fn subtitle(&self) -> Option<&str> {
        match self {
            Self::Flat(_) => None,
            Self::Rich(rich) => rich
                .subtitle
                .as_deref()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Adapt the outline into the render-time slide sequence.
    pub fn slides(&self) -> Vec<Slide> {
        crate::OutlineNormalizer::new().normalize_outline(self)
    }
}

/// The normalized unit the renderer iterates over.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slide {
    /// Slide title.
    pub title: String,

    /// Body paragraphs, all at indentation level 0.
    pub bullets: Vec<String>,

    /// Speaker notes.
    pub notes: Option<String>,
}

impl Slide {
    /// Create a slide with a title and no body.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bullets: Vec::new(),
            notes: None,
        }
    }

    /// Non-blank notes text, if any.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.trim().is_empty())
    }
}
