//! Text to deck: generate, extract, render.

use slidegen_core::{extract, Result, StructuredOutline, TemplateConfig};
use slidegen_pptx::{Deck, DeckRenderer, DeckTemplate};
use slidegen_provider::Provider;

/// What one pipeline run produced.
#[derive(Debug)]
pub struct Generated {
    /// Outline extracted from the model reply.
    pub outline: StructuredOutline,
    /// Title used on the title slide.
    pub deck_title: String,
    /// The rendered deck.
    pub deck: Deck,
}

/// Chains the three stages. A failure in any stage ends the run with that
/// stage's error.
pub struct Pipeline<'a> {
    provider: &'a dyn Provider,
    renderer: DeckRenderer,
}

impl<'a> Pipeline<'a> {
    pub fn new(provider: &'a dyn Provider) -> Self {
        Self {
            provider,
            renderer: DeckRenderer::new(),
        }
    }

    /// Generate a deck for `raw_text`. A non-blank `title` overrides the
    /// one the outline suggests.
    pub async fn run(
        &self,
        config: &TemplateConfig,
        template: &DeckTemplate,
        raw_text: &str,
        title: Option<&str>,
    ) -> Result<Generated> {
        log::info!(
            "Generating outline with {} ({})",
            self.provider.kind(),
            self.provider.model()
        );
        let reply = self.provider.generate(raw_text, config).await?;

        let outline = extract(&reply)?;
        log::info!("Extracted outline with {} slides", outline.slide_count());

        let deck_title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| outline.deck_title())
            .to_string();
        let deck = self.renderer.render(&outline, template, &deck_title)?;

        Ok(Generated {
            outline,
            deck_title,
            deck,
        })
    }
}
