//! Core domain types, outline extraction, and prompt building for
//! turning free-form text into a slide deck.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod types;

pub use error::{Error, Result};
pub use extract::{extract, extract_outline};
pub use normalize::OutlineNormalizer;
pub use prompt::Prompt;
pub use types::{
    FlatOutline, GenerationReply, RichOutline, RichSlide, Slide, StructuredOutline, TemplateConfig,
};
