//! Outline normalization into render-time slides.
//!
//! Both outline shapes collapse into one `Slide` sequence here, so the
//! renderer never branches on the shape.

use crate::{Slide, StructuredOutline};
use regex::Regex;
use std::sync::LazyLock;

/// Leading bullet markers a model tends to prefix content lines with.
static BULLET_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[•\-*]+").unwrap());

/// Normalizer turning outlines into slides.
#[derive(Debug, Clone, Default)]
pub struct OutlineNormalizer;

impl OutlineNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single rich-form content line.
    ///
    /// - Trims surrounding whitespace
    /// - Strips a leading run of `•`, `-`, `*`
    /// - Trims again
    ///
    /// Returns `None` when nothing is left.
    pub fn normalize_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let stripped = BULLET_MARKER_REGEX.replace(trimmed, "");
        let stripped = stripped.trim();

        if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        }
    }

    /// Split rich-form content into bullet lines, dropping blank ones.
    pub fn normalize_to_lines(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| self.normalize_line(line))
            .collect()
    }

    /// Adapt either outline shape into slides, preserving outline order.
    pub fn normalize_outline(&self, outline: &StructuredOutline) -> Vec<Slide> {
        match outline {
            StructuredOutline::Flat(flat) => flat
                .titles
                .iter()
                .enumerate()
                .map(|(idx, title)| Slide {
                    title: title.clone(),
                    bullets: flat.bullets_for(idx).to_vec(),
                    notes: None,
                })
                .collect(),
            StructuredOutline::Rich(rich) => rich
                .slides
                .iter()
                .map(|entry| Slide {
                    title: entry.title.clone(),
                    bullets: self.normalize_to_lines(&entry.content),
                    notes: entry
                        .notes
                        .as_ref()
                        .filter(|n| !n.trim().is_empty())
                        .cloned(),
                })
                .collect(),
        }
    }
}
