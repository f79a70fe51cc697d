//! PPTX (Office Open XML) deck renderer.
//!
//! Builds `.pptx` packages from outlines on top of a template, and reads
//! the slide text back for verification and transport.

pub mod deck;
pub mod package;
pub mod parser;
pub mod renderer;
pub mod template;
pub mod writer;
mod xml;

pub use deck::{Deck, DeckArtifact, OutputTarget};
pub use package::Package;
pub use parser::{DeckParser, RenderedSlide};
pub use renderer::DeckRenderer;
pub use template::{DeckTemplate, LayoutInfo, PlaceholderInfo};
